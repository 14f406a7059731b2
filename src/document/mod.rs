//! Markdown document parsing and rendering.
//!
//! This module handles:
//! - Parsing markdown with comrak
//! - Extracting document structure (headings, links, code blocks)
//! - Rendering to styled lines for display
//!
//! Fenced code blocks are framed and registered for lazy syntax
//! highlighting; their `{1,3-5}` info-string annotations are resolved to
//! emphasized line sets at parse time.

mod parser;
mod types;

pub use parser::{parse, parse_with_layout};
pub use types::{
    CodeBlockRef, CodeRequest, Document, HeadingRef, InlineColor, InlineSpan, InlineStyle,
    LineType, LinkRef, RenderedLine,
};
