//! Placeholders for content Markdown cannot represent.
//!
//! Rules record a placeholder in the running [`ConversionContext`] and emit a
//! short stand-in line. Once the walk is done, [`build_footer`] summarises the
//! counts so a downstream reader knows the stand-ins are not literal content.

use std::fmt;

use crate::context::ConversionContext;

/// Kind of content replaced by a placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    Image,
    Svg,
    Iframe,
    Video,
    Audio,
    Canvas,
    UnknownElement,
    UnrenderableLink,
}

/// Footer category a kind is summarised under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterCategory {
    Images,
    EmbeddedFrames,
    Other,
}

impl PlaceholderKind {
    /// Every kind, in footer order
    pub const ALL: [PlaceholderKind; 8] = [
        PlaceholderKind::Image,
        PlaceholderKind::Svg,
        PlaceholderKind::Iframe,
        PlaceholderKind::Video,
        PlaceholderKind::Audio,
        PlaceholderKind::Canvas,
        PlaceholderKind::UnknownElement,
        PlaceholderKind::UnrenderableLink,
    ];

    /// Human readable label used in placeholder lines
    pub fn label(self) -> &'static str {
        match self {
            PlaceholderKind::Image => "Image",
            PlaceholderKind::Svg => "SVG",
            PlaceholderKind::Iframe => "Iframe",
            PlaceholderKind::Video => "Video",
            PlaceholderKind::Audio => "Audio",
            PlaceholderKind::Canvas => "Canvas",
            PlaceholderKind::UnknownElement => "Embedded element",
            PlaceholderKind::UnrenderableLink => "Embedded content",
        }
    }

    pub fn category(self) -> FooterCategory {
        match self {
            PlaceholderKind::Image | PlaceholderKind::Svg | PlaceholderKind::Canvas => {
                FooterCategory::Images
            }
            PlaceholderKind::Iframe | PlaceholderKind::Video | PlaceholderKind::Audio => {
                FooterCategory::EmbeddedFrames
            }
            PlaceholderKind::UnknownElement | PlaceholderKind::UnrenderableLink => {
                FooterCategory::Other
            }
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One emitted placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRecord {
    pub kind: PlaceholderKind,
    /// 1-based, dense per kind
    pub index: u32,
    pub description: String,
}

impl PlaceholderRecord {
    /// The stand-in line emitted in place of the content
    pub fn line(&self) -> String {
        format!("[{} placeholder {}: {}]", self.kind, self.index, self.description)
    }
}

/// Build the footer appended after a conversion.
///
/// Returns an empty string when no placeholder was recorded.
pub fn build_footer(context: &ConversionContext<'_>) -> String {
    if !context.has_placeholders() {
        return String::new();
    }

    let total = |category: FooterCategory| -> u32 {
        context
            .counters()
            .iter()
            .filter(|(kind, _)| kind.category() == category)
            .map(|(_, count)| *count)
            .sum()
    };

    format!(
        "\n\n{hr}\n\n**Placeholder notes:**\n\n\
         - Images: {images}\n\
         - Embedded frames: {frames}\n\
         - Other: {other}\n\n\
         Placeholders summarise content that could not be represented in Markdown; they are not the content itself.\n\n\
         - Prefer understanding the document from the surrounding content.\n\
         - If a placeholder's content is genuinely needed, ask the user to provide the content of `<kind> placeholder <index>`.",
        hr = context.options().hr,
        images = total(FooterCategory::Images),
        frames = total(FooterCategory::EmbeddedFrames),
        other = total(FooterCategory::Other),
    )
}
