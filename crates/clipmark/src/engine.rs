//! RuleEngine - walks a parsed fragment and applies one rule table.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};

use crate::context::ConversionContext;
use crate::html::{parse, remove_empty_elements};
use crate::rules::{Rule, Rules};
use crate::utilities::{collapse_whitespace, escape_markdown, is_blank, is_block};
use crate::Result;

/// Table cells keep a table's grid intact even when blank
pub(crate) fn is_table_cell(element: &ElementRef<'_>) -> bool {
    matches!(element.value().name(), "td" | "th")
}

/// Pending work of the tree walk
enum Frame<'a> {
    /// Node not yet visited
    Enter(NodeRef<'a, Node>),
    /// Element whose children have been rendered into the top buffer
    Exit(ElementRef<'a>, &'static Rule),
}

/// Converts HTML fragments to Markdown with one ordered rule table
#[derive(Clone, Copy)]
pub struct RuleEngine {
    rules: Rules,
    significant: fn(&ElementRef<'_>) -> bool,
}

impl RuleEngine {
    /// Create an engine over `rules`
    pub fn new(rules: Rules) -> Self {
        Self {
            rules,
            significant: is_table_cell,
        }
    }

    /// Elements kept by empty-element elision in addition to the media set
    pub fn with_significant(mut self, significant: fn(&ElementRef<'_>) -> bool) -> Self {
        self.significant = significant;
        self
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// Parse `html`, elide empty elements and render the result.
    ///
    /// Output is raw rule output: blank-line runs are left for the
    /// normalizer to compact.
    pub fn render_html(&self, html: &str, context: &mut ConversionContext<'_>) -> Result<String> {
        let mut document = parse(html)?;
        let removed = remove_empty_elements(&mut document, self.significant);

        let markdown = self.render_children(&document.root_element(), context)?;
        tracing::debug!(
            url = context.source_url(),
            rules = self.rules.len(),
            removed,
            placeholders = context.records().len(),
            output_len = markdown.len(),
            "rendered fragment"
        );
        Ok(markdown)
    }

    /// Render the children of `element`.
    ///
    /// The walk is post-order with an explicit stack: a matched element's
    /// children are rendered into their own buffer, which becomes the
    /// `content` handed to the rule. Unmatched elements contribute their
    /// children's output unchanged. Rules marked opaque receive empty
    /// content and their subtree is never visited.
    pub fn render_children(
        &self,
        element: &ElementRef<'_>,
        context: &mut ConversionContext<'_>,
    ) -> Result<String> {
        let mut buffers = vec![String::new()];
        let mut stack: Vec<Frame<'_>> = element.children().rev().map(Frame::Enter).collect();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(node) => match node.value() {
                    Node::Text(text) => {
                        let rendered = render_text(node, &text.text);
                        push(&mut buffers, &rendered);
                    }
                    Node::Element(_) => {
                        let Some(child) = ElementRef::wrap(node) else {
                            continue;
                        };
                        match self.rules.for_element(&child) {
                            Some(rule) if !rule.walk_children => {
                                let output = rule.replace(&child, "", context)?;
                                push(&mut buffers, &output);
                            }
                            Some(rule) => {
                                buffers.push(String::new());
                                stack.push(Frame::Exit(child, rule));
                                stack.extend(node.children().rev().map(Frame::Enter));
                            }
                            None => stack.extend(node.children().rev().map(Frame::Enter)),
                        }
                    }
                    _ => {}
                },
                Frame::Exit(child, rule) => {
                    let content = buffers.pop().unwrap_or_default();
                    let output = rule.replace(&child, &content, context)?;
                    push(&mut buffers, &output);
                }
            }
        }

        Ok(buffers.pop().unwrap_or_default())
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rules.names())
            .finish_non_exhaustive()
    }
}

fn push(buffers: &mut [String], output: &str) {
    if let Some(top) = buffers.last_mut() {
        top.push_str(output);
    }
}

/// Collapse and escape a text run.
///
/// Whitespace-only runs next to a block sibling, or at the edge of a block
/// parent, render to nothing.
fn render_text(node: NodeRef<'_, Node>, text: &str) -> String {
    if is_blank(text) {
        let at_edge = node.prev_sibling().is_none() || node.next_sibling().is_none();
        let block_parent = at_edge
            && node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|e| is_block(e.name())))
                .unwrap_or(false);
        let block_sibling = [node.prev_sibling(), node.next_sibling()]
            .into_iter()
            .flatten()
            .any(|sibling| {
                sibling
                    .value()
                    .as_element()
                    .map(|e| is_block(e.name()))
                    .unwrap_or(false)
            });
        if block_parent || block_sibling {
            return String::new();
        }
        return if text.is_empty() { String::new() } else { " ".to_string() };
    }

    escape_markdown(&collapse_whitespace(text))
}
