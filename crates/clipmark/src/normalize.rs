//! Final newline compaction.

/// Collapse runs of three or more newlines to two and trim the result.
///
/// Lines inside fenced code blocks are copied untouched, so blank lines in
/// code survive. The function is idempotent.
pub fn normalize(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.split('\n').collect();
    let fenced = fence_mask(&lines);

    let mut kept = Vec::with_capacity(lines.len());
    let mut blank_run = 0;
    for (line, in_fence) in lines.iter().zip(fenced) {
        if !in_fence && line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        kept.push(*line);
    }

    kept.join("\n").trim().to_string()
}

/// Mark the lines belonging to a fenced code block, fence lines included.
///
/// A fence opens on a run of three or more backticks or tildes followed by
/// an info string free of that character, and only when a closing run at
/// least as long follows. Nested strikethrough or inline code starting with
/// a backtick therefore never opens a fence.
pub(crate) fn fence_mask(lines: &[&str]) -> Vec<bool> {
    // Longest closing run at or after each line: (backtick, tilde)
    let mut closers = vec![(0, 0); lines.len() + 1];
    for (i, line) in lines.iter().enumerate().rev() {
        let mut longest = closers[i + 1];
        match closing_run(line) {
            Some(('`', len)) => longest.0 = longest.0.max(len),
            Some((_, len)) => longest.1 = longest.1.max(len),
            None => {}
        }
        closers[i] = longest;
    }

    let mut mask = vec![false; lines.len()];
    let mut open: Option<(char, usize)> = None;
    for (i, line) in lines.iter().enumerate() {
        match open {
            Some((ch, len)) => {
                mask[i] = true;
                if matches!(closing_run(line), Some((found, found_len)) if found == ch && found_len >= len) {
                    open = None;
                }
            }
            None => {
                if let Some((ch, len)) = opening_run(line) {
                    let (backticks, tildes) = closers[i + 1];
                    let available = if ch == '`' { backticks } else { tildes };
                    if available >= len {
                        open = Some((ch, len));
                        mask[i] = true;
                    }
                }
            }
        }
    }
    mask
}

/// Fence character and run length when `line` can open a fence
fn opening_run(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    let info = &trimmed[len * ch.len_utf8()..];
    (len >= 3 && !info.contains(ch)).then_some((ch, len))
}

/// A closing fence carries nothing but the fence run
fn closing_run(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim();
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().count();
    (len >= 3 && trimmed.chars().all(|c| c == ch)).then_some((ch, len))
}
