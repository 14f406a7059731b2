//! Core document types.

use std::collections::HashSet;
use std::ops::Range;

/// Result of converting markdown, ready to be assembled into a `Document`.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Rendered lines for display
    pub lines: Vec<RenderedLine>,
    /// Heading references
    pub headings: Vec<HeadingRef>,
    /// Link references
    pub links: Vec<LinkRef>,
    /// Code blocks for lazy syntax highlighting
    pub code_blocks: Vec<CodeBlockRef>,
}

/// A parsed and rendered markdown document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Original source text
    source: String,
    /// Rendered lines for display
    lines: Vec<RenderedLine>,
    /// Heading references
    headings: Vec<HeadingRef>,
    /// Link references
    links: Vec<LinkRef>,
    /// Code blocks for lazy syntax highlighting
    code_blocks: Vec<CodeBlockRef>,
}

impl Document {
    /// Create an empty document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a new document from converted results.
    pub(crate) fn from_parsed(source: String, result: ParsedDocument) -> Self {
        Self {
            source,
            lines: result.lines,
            headings: result.headings,
            links: result.links,
            code_blocks: result.code_blocks,
        }
    }

    /// Get the total number of rendered lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Get all headings.
    pub fn headings(&self) -> &[HeadingRef] {
        &self.headings
    }

    /// Get all link references.
    pub fn links(&self) -> &[LinkRef] {
        &self.links
    }

    /// Get visible lines for rendering.
    ///
    /// Returns lines from `offset` to `offset + count`.
    pub fn visible_lines(&self, offset: usize, count: usize) -> Vec<&RenderedLine> {
        self.lines.iter().skip(offset).take(count).collect()
    }

    /// Get the source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Lazily apply syntax highlighting to code blocks intersecting `range`.
    ///
    /// The line-number gutter and emphasis backgrounds assigned at parse time
    /// are reproduced on the recolored rows.
    pub fn ensure_highlight_for_range(&mut self, range: Range<usize>) {
        for block in &mut self.code_blocks {
            if block.highlighted
                || block.line_range.end <= range.start
                || block.line_range.start >= range.end
            {
                continue;
            }

            let colored = crate::highlight::highlight_code(
                block.language.as_deref(),
                &block.raw_lines.join("\n"),
            );

            for (offset, spans) in colored.into_iter().enumerate() {
                let line_idx = block.line_range.start + offset;
                if line_idx >= block.line_range.end || line_idx >= self.lines.len() {
                    break;
                }
                self.lines[line_idx] = compose_code_row(block, offset + 1, &spans);
            }

            block.highlighted = true;
        }
    }
}

/// A fenced code block inside a document, tracked for lazy highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockRef {
    /// Body rows of the block in the rendered document
    pub line_range: Range<usize>,
    pub language: Option<String>,
    /// Source lines of the block, unstyled
    pub raw_lines: Vec<String>,
    /// 1-based body line numbers to emphasize
    pub emphasized: HashSet<usize>,
    /// Whether body rows carry a line-number gutter
    pub line_numbers: bool,
    pub highlighted: bool,
    pub content_width: usize,
    pub right_padding: usize,
}

impl CodeBlockRef {
    /// Columns the line-number gutter occupies, excluding its trailing space.
    pub(crate) fn gutter_width(&self) -> usize {
        if !self.line_numbers || self.raw_lines.is_empty() {
            return 0;
        }
        let mut width = 1;
        let mut n = self.raw_lines.len();
        while n >= 10 {
            width += 1;
            n /= 10;
        }
        width
    }

    /// Width between the left and right frame borders.
    pub(crate) fn frame_inner_width(&self) -> usize {
        let gutter = self.gutter_width();
        let gutter_cols = if gutter > 0 { gutter + 1 } else { 0 };
        gutter_cols + self.content_width + 2 + self.right_padding
    }
}

/// Foreground for the line-number gutter.
const GUTTER_FG: InlineColor = InlineColor {
    r: 130,
    g: 136,
    b: 146,
};

/// Assemble one framed body row of a fenced code block.
///
/// Layout: `│ `, optional gutter, content truncated to the block's content
/// width, padding, ` │`. Emphasized rows carry a background fill across the
/// gutter, content and padding, but not the frame borders.
pub(crate) fn compose_code_row(
    block: &CodeBlockRef,
    line_no: usize,
    content: &[InlineSpan],
) -> RenderedLine {
    let bg = block
        .emphasized
        .contains(&line_no)
        .then(crate::highlight::emphasis_background);

    let mut spans = Vec::new();
    spans.push(InlineSpan::new("│ ".to_string(), InlineStyle::default()));

    let gutter_width = block.gutter_width();
    if gutter_width > 0 {
        let mut gutter_style = InlineStyle::default();
        gutter_style.code = true;
        gutter_style.fg = Some(GUTTER_FG);
        gutter_style.bg = bg;
        spans.push(InlineSpan::new(
            format!("{line_no:>gutter_width$} "),
            gutter_style,
        ));
    }

    let mut body = truncate_spans_to_chars(content, block.content_width);
    if let Some(bg) = bg {
        body = body.into_iter().map(|span| span.with_bg(bg)).collect();
    }
    let body_len = spans_char_len(&body);
    spans.extend(body);

    let padding = " ".repeat(block.content_width.saturating_sub(body_len) + block.right_padding);
    let mut padding_style = InlineStyle::default();
    padding_style.bg = bg;
    spans.push(InlineSpan::new(padding, padding_style));
    spans.push(InlineSpan::new(" │".to_string(), InlineStyle::default()));

    let content = spans_to_string(&spans);
    RenderedLine::with_spans(content, LineType::CodeBlock, spans)
}

/// A code rendering request from the markdown converter.
///
/// Inline spans and fenced blocks are separate requests with their own
/// fields, not one renderer toggled by a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRequest {
    /// A fenced block with an optional language tag and highlight annotation.
    Fenced {
        language: Option<String>,
        meta: Option<String>,
        line_numbers: bool,
    },
    /// A single inline code span.
    Inline { text: String },
}

impl CodeRequest {
    /// Build a fenced request from a fence info string such as
    /// `rust {1,3-5}`. The first token is the language unless it opens a
    /// brace group, in which case the whole info string is annotation.
    pub fn from_fence_info(info: &str, line_numbers: bool) -> Self {
        let info = info.trim();
        let language = info
            .split_whitespace()
            .next()
            .filter(|token| !token.starts_with('{'))
            .map(ToString::to_string);
        let meta = match &language {
            Some(token) => {
                let rest = info[token.len()..].trim();
                (!rest.is_empty()).then(|| rest.to_string())
            }
            None => (!info.is_empty()).then(|| info.to_string()),
        };
        Self::Fenced {
            language,
            meta,
            line_numbers,
        }
    }

    /// Build an inline request for a code span.
    pub fn from_inline(text: &str) -> Self {
        Self::Inline {
            text: text.to_string(),
        }
    }
}

/// A single rendered line with styling information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// The text content of the line
    content: String,
    /// The type of line (for styling)
    line_type: LineType,
    /// Optional inline-styled spans for rendering
    spans: Vec<InlineSpan>,
}

impl RenderedLine {
    /// Create a new rendered line.
    pub const fn new(content: String, line_type: LineType) -> Self {
        Self {
            content,
            line_type,
            spans: Vec::new(),
        }
    }

    /// Create a new rendered line with inline spans.
    pub const fn with_spans(content: String, line_type: LineType, spans: Vec<InlineSpan>) -> Self {
        Self {
            content,
            line_type,
            spans,
        }
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the line type.
    pub const fn line_type(&self) -> &LineType {
        &self.line_type
    }

    /// Get inline spans, if present.
    pub fn spans(&self) -> Option<&[InlineSpan]> {
        if self.spans.is_empty() {
            None
        } else {
            Some(&self.spans)
        }
    }
}

/// Inline style flags for a text span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub emphasis: bool,
    pub strong: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: bool,
    pub fg: Option<InlineColor>,
    pub bg: Option<InlineColor>,
}

/// RGB color for inline styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A styled inline span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    text: String,
    style: InlineStyle,
}

impl InlineSpan {
    pub const fn new(text: String, style: InlineStyle) -> Self {
        Self { text, style }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn style(&self) -> InlineStyle {
        self.style
    }

    /// Return this span with the given background fill.
    #[must_use]
    pub const fn with_bg(mut self, bg: InlineColor) -> Self {
        self.style.bg = Some(bg);
        self
    }
}

/// Type of a rendered line, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// Normal paragraph text
    Paragraph,
    /// Heading with level (1-6)
    Heading(u8),
    /// Code block line
    CodeBlock,
    /// Block quote line
    BlockQuote,
    /// List item with nesting level
    ListItem(usize),
    /// Table row
    Table,
    /// Horizontal rule
    HorizontalRule,
    /// Image placeholder
    Image,
    /// Empty line
    Empty,
}

/// Reference to a heading in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRef {
    /// Heading level (1-6)
    pub level: u8,
    /// Heading text (plain, no formatting)
    pub text: String,
    /// Line number in rendered document
    pub line: usize,
}

/// Reference to a link in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    /// Link text
    pub text: String,
    /// Link URL
    pub url: String,
    /// Line number in rendered document
    pub line: usize,
}

pub(crate) fn spans_to_string(spans: &[InlineSpan]) -> String {
    let mut content = String::new();
    for span in spans {
        content.push_str(span.text());
    }
    content
}

pub(crate) fn spans_char_len(spans: &[InlineSpan]) -> usize {
    spans.iter().map(|s| s.text().chars().count()).sum()
}

pub(crate) fn truncate_spans_to_chars(spans: &[InlineSpan], max_len: usize) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut remaining = max_len;
    for span in spans {
        if remaining == 0 {
            break;
        }
        let mut taken = String::new();
        for ch in span.text().chars().take(remaining) {
            taken.push(ch);
        }
        let count = taken.chars().count();
        if count > 0 {
            out.push(InlineSpan::new(taken, span.style()));
            remaining -= count;
        }
    }
    out
}
