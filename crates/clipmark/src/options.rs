//! Configuration options for Markdown output

/// Options shared by every rule of a strategy.
///
/// Strategies own one value of this type; rules read it through the
/// [`ConversionContext`](crate::ConversionContext) of the running conversion.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Emphasis delimiter
    pub em_delimiter: char,

    /// Strong delimiter
    pub strong_delimiter: String,

    /// Strikethrough delimiter
    pub strike_delimiter: String,

    /// Fence string for fenced code blocks (grown when the code contains it)
    pub fence: String,

    /// Horizontal rule string
    pub hr: String,

    /// Indentation added per nested list level
    pub list_indent: String,

    /// Label used when a placeholder image has no alt text
    pub unnamed_image: String,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            bullet_list_marker: '-',
            em_delimiter: '*',
            strong_delimiter: "**".to_string(),
            strike_delimiter: "~~".to_string(),
            fence: "```".to_string(),
            hr: "---".to_string(),
            list_indent: "  ".to_string(),
            unnamed_image: "unnamed image".to_string(),
        }
    }
}
