//! Markdown conversion with comrak.

use anyhow::Result;
use comrak::nodes::{AstNode, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::types::{
    CodeBlockRef, CodeRequest, Document, HeadingRef, InlineSpan, InlineStyle, LineType, LinkRef,
    ParsedDocument, RenderedLine, compose_code_row, spans_to_string,
};
use crate::highlight::parse_highlight_ranges;

const CODE_RIGHT_PADDING: usize = 3;

impl Document {
    /// Parse markdown source into a `Document`.
    ///
    /// # Example
    ///
    /// ```
    /// use folio::document::Document;
    ///
    /// let doc = Document::parse("# Hello\n\nWorld").unwrap();
    /// assert!(doc.line_count() >= 3);
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        parse(source)
    }

    pub fn parse_with_layout(source: &str, width: u16, line_numbers: bool) -> Result<Self> {
        parse_with_layout(source, width, line_numbers)
    }
}

/// Parse markdown source into a `Document` at the default layout width.
pub fn parse(source: &str) -> Result<Document> {
    parse_with_layout(source, 80, true)
}

/// Parse markdown source into a `Document` with layout and wrapping.
pub fn parse_with_layout(source: &str, width: u16, line_numbers: bool) -> Result<Document> {
    let arena = Arena::new();
    let options = create_options();
    let root = parse_document(&arena, source, &options);

    let mut converter = Converter {
        lines: Vec::new(),
        headings: Vec::new(),
        links: Vec::new(),
        code_blocks: Vec::new(),
        wrap_width: width.max(1) as usize,
        line_numbers,
    };
    converter.block(root, 0, None);

    Ok(Document::from_parsed(
        source.to_string(),
        ParsedDocument {
            lines: converter.lines,
            headings: converter.headings,
            links: converter.links,
            code_blocks: converter.code_blocks,
        },
    ))
}

fn create_options() -> Options {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.shortcodes = true;

    options
}

/// Walks the comrak AST and accumulates rendered output.
struct Converter {
    lines: Vec<RenderedLine>,
    headings: Vec<HeadingRef>,
    links: Vec<LinkRef>,
    code_blocks: Vec<CodeBlockRef>,
    wrap_width: usize,
    line_numbers: bool,
}

impl Converter {
    fn block<'a>(&mut self, node: &'a AstNode<'a>, depth: usize, list_marker: Option<String>) {
        match &node.data.borrow().value {
            NodeValue::Document => {
                for child in node.children() {
                    self.block(child, depth, list_marker.clone());
                }
            }

            NodeValue::Heading(heading) => {
                let text = extract_text(node);

                // Keep headings visually separated with two rows above.
                ensure_trailing_empty_lines(&mut self.lines, 2);
                self.headings.push(HeadingRef {
                    level: heading.level,
                    text: text.clone(),
                    line: self.lines.len(),
                });

                let prefix = "#".repeat(heading.level as usize);
                self.lines.push(RenderedLine::new(
                    format!("{prefix} {text}"),
                    LineType::Heading(heading.level),
                ));
                self.lines
                    .push(RenderedLine::new(String::new(), LineType::Empty));
            }

            NodeValue::Paragraph => {
                let images = collect_paragraph_images(node);
                if images.is_empty() {
                    collect_links(node, self.lines.len(), &mut self.links);
                    let spans = self.inline_spans(node);
                    let wrapped = wrap_inline(&spans, self.wrap_width, "", "");
                    for line_spans in wrapped {
                        let content = spans_to_string(&line_spans);
                        self.lines.push(RenderedLine::with_spans(
                            content,
                            LineType::Paragraph,
                            line_spans,
                        ));
                    }
                } else {
                    for (alt, src) in images {
                        let label = if alt.is_empty() { src } else { alt };
                        self.lines.push(RenderedLine::new(
                            format!("[image: {label}]"),
                            LineType::Image,
                        ));
                    }
                }
                self.lines
                    .push(RenderedLine::new(String::new(), LineType::Empty));
            }

            NodeValue::CodeBlock(code) => {
                let request = CodeRequest::from_fence_info(&code.info, self.line_numbers);
                self.render_code(request, &code.literal, InlineStyle::default());
            }

            NodeValue::List(list) => {
                let list_depth = depth + 1;
                let start = list.start;
                let delimiter = match list.delimiter {
                    comrak::nodes::ListDelimType::Paren => ')',
                    comrak::nodes::ListDelimType::Period => '.',
                };
                let list_len = node.children().count();
                let max_number = start + list_len.saturating_sub(1);
                let number_width = max_number.to_string().len();

                for (index, child) in node.children().enumerate() {
                    let base_marker = match list.list_type {
                        comrak::nodes::ListType::Bullet => "•".to_string(),
                        comrak::nodes::ListType::Ordered => {
                            let number = start + index;
                            format!("{number:>number_width$}{delimiter}")
                        }
                    };
                    self.block(child, list_depth, Some(format!("{base_marker} ")));
                }
            }

            NodeValue::TaskItem(symbol) => {
                let indent = "  ".repeat(depth.saturating_sub(1));
                let marker = format!("{} ", if symbol.is_some() { "✓" } else { "□" });
                let prefix_first = format!("{indent}{marker}");
                let prefix_next = format!("{}{}", indent, " ".repeat(marker.chars().count()));

                let spans = self.inline_spans(node);
                let wrapped = wrap_inline(&spans, self.wrap_width, &prefix_first, &prefix_next);
                for line_spans in wrapped {
                    let content = spans_to_string(&line_spans);
                    self.lines.push(RenderedLine::with_spans(
                        content,
                        LineType::ListItem(depth),
                        line_spans,
                    ));
                }

                for child in node.children() {
                    if matches!(child.data.borrow().value, NodeValue::List(_)) {
                        self.block(child, depth, None);
                    }
                }
            }

            NodeValue::Item(_) => {
                let indent = "  ".repeat(depth.saturating_sub(1));
                let marker = list_marker.unwrap_or_else(|| "- ".to_string());
                let prefix_first = format!("{indent}{marker}");
                let prefix_next = format!("{}{}", indent, " ".repeat(marker.chars().count()));
                let mut rendered_any = false;

                for child in node.children() {
                    match &child.data.borrow().value {
                        NodeValue::Paragraph => {
                            if rendered_any {
                                self.lines.push(RenderedLine::new(
                                    String::new(),
                                    LineType::ListItem(depth),
                                ));
                            }
                            let spans = self.inline_spans(child);
                            let prefix = if rendered_any {
                                &prefix_next
                            } else {
                                &prefix_first
                            };
                            let wrapped =
                                wrap_inline(&spans, self.wrap_width, prefix, &prefix_next);
                            for line_spans in wrapped {
                                let content = spans_to_string(&line_spans);
                                self.lines.push(RenderedLine::with_spans(
                                    content,
                                    LineType::ListItem(depth),
                                    line_spans,
                                ));
                            }
                            rendered_any = true;
                        }
                        _ => {
                            self.block(child, depth, None);
                        }
                    }
                }

                if !rendered_any {
                    let spans = self.inline_spans(node);
                    let wrapped =
                        wrap_inline(&spans, self.wrap_width, &prefix_first, &prefix_next);
                    for line_spans in wrapped {
                        let content = spans_to_string(&line_spans);
                        self.lines.push(RenderedLine::with_spans(
                            content,
                            LineType::ListItem(depth),
                            line_spans,
                        ));
                    }
                }
            }

            NodeValue::BlockQuote => {
                self.quote(node, 1);
                self.lines
                    .push(RenderedLine::new(String::new(), LineType::Empty));
            }

            NodeValue::ThematicBreak => {
                let rule_width = self.wrap_width.clamp(3, 40);
                self.lines.push(RenderedLine::new(
                    "─".repeat(rule_width),
                    LineType::HorizontalRule,
                ));
                self.lines
                    .push(RenderedLine::new(String::new(), LineType::Empty));
            }

            NodeValue::Table(_) => {
                for line in render_table(node, self.wrap_width) {
                    self.lines.push(RenderedLine::new(line, LineType::Table));
                }
                self.lines
                    .push(RenderedLine::new(String::new(), LineType::Empty));
            }

            NodeValue::FootnoteDefinition(def) => {
                let label = format!("[^{}]: ", def.name);
                let continuation = " ".repeat(label.len());
                let spans = self.inline_spans(node);
                let wrapped = wrap_inline(&spans, self.wrap_width, &label, &continuation);
                for line_spans in wrapped {
                    let content = spans_to_string(&line_spans);
                    self.lines.push(RenderedLine::with_spans(
                        content,
                        LineType::Paragraph,
                        line_spans,
                    ));
                }
                self.lines
                    .push(RenderedLine::new(String::new(), LineType::Empty));
            }

            NodeValue::Image(image) => {
                let alt = extract_text(node);
                let label = if alt.is_empty() {
                    image.url.clone()
                } else {
                    alt
                };
                self.lines.push(RenderedLine::new(
                    format!("[image: {label}]"),
                    LineType::Image,
                ));
            }

            _ => {
                // Process children for unhandled nodes
                for child in node.children() {
                    self.block(child, depth, list_marker.clone());
                }
            }
        }
    }

    fn quote<'a>(&mut self, node: &'a AstNode<'a>, quote_depth: usize) {
        let prefix = quote_prefix(quote_depth);

        for child in node.children() {
            match &child.data.borrow().value {
                NodeValue::Paragraph => {
                    let spans = self.inline_spans(child);
                    let wrapped = wrap_inline(&spans, self.wrap_width, &prefix, &prefix);
                    for line_spans in wrapped {
                        let content = spans_to_string(&line_spans);
                        self.lines.push(RenderedLine::with_spans(
                            content,
                            LineType::BlockQuote,
                            line_spans,
                        ));
                    }
                }
                NodeValue::BlockQuote => {
                    self.quote(child, quote_depth + 1);
                }
                _ => {
                    let text = extract_text(child);
                    for raw_line in text.lines() {
                        let spans =
                            vec![InlineSpan::new(raw_line.to_string(), InlineStyle::default())];
                        let wrapped = wrap_inline(&spans, self.wrap_width, &prefix, &prefix);
                        for line_spans in wrapped {
                            let content = spans_to_string(&line_spans);
                            self.lines.push(RenderedLine::with_spans(
                                content,
                                LineType::BlockQuote,
                                line_spans,
                            ));
                        }
                    }
                }
            }
        }
    }

    fn inline_spans<'a>(&mut self, node: &'a AstNode<'a>) -> Vec<InlineSpan> {
        let mut spans = Vec::new();
        self.inline_spans_into(node, InlineStyle::default(), &mut spans);
        spans
    }

    fn inline_spans_into<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        style: InlineStyle,
        spans: &mut Vec<InlineSpan>,
    ) {
        match &node.data.borrow().value {
            NodeValue::List(_) | NodeValue::Item(_) => {}
            NodeValue::Text(t) => {
                spans.push(InlineSpan::new(t.clone(), style));
            }
            NodeValue::Code(code) => {
                let request = CodeRequest::from_inline(&code.literal);
                spans.extend(self.render_code(request, &code.literal, style));
            }
            NodeValue::Emph => {
                let mut next = style;
                next.emphasis = true;
                for child in node.children() {
                    self.inline_spans_into(child, next, spans);
                }
            }
            NodeValue::Strong => {
                let mut next = style;
                next.strong = true;
                for child in node.children() {
                    self.inline_spans_into(child, next, spans);
                }
            }
            NodeValue::Strikethrough => {
                let mut next = style;
                next.strikethrough = true;
                for child in node.children() {
                    self.inline_spans_into(child, next, spans);
                }
            }
            NodeValue::Link(_) => {
                let mut next = style;
                next.link = true;
                for child in node.children() {
                    self.inline_spans_into(child, next, spans);
                }
            }
            NodeValue::FootnoteReference(reference) => {
                spans.push(InlineSpan::new(format!("[^{}]", reference.name), style));
            }
            NodeValue::SoftBreak | NodeValue::LineBreak => {
                spans.push(InlineSpan::new(" ".to_string(), style));
            }
            _ => {
                for child in node.children() {
                    self.inline_spans_into(child, style, spans);
                }
            }
        }
    }

    /// Render a code request.
    ///
    /// Fenced requests append a framed block to the document and register a
    /// `CodeBlockRef` for lazy highlighting; inline requests yield a styled
    /// span for the surrounding text run.
    fn render_code(
        &mut self,
        request: CodeRequest,
        literal: &str,
        base: InlineStyle,
    ) -> Vec<InlineSpan> {
        match request {
            CodeRequest::Inline { text } => {
                let mut style = base;
                style.code = true;
                style.emphasis = false;
                style.strong = false;
                style.strikethrough = false;
                vec![InlineSpan::new(text, style)]
            }

            CodeRequest::Fenced {
                language,
                meta,
                line_numbers,
            } => {
                let raw_lines: Vec<String> = literal.lines().map(ToString::to_string).collect();
                let emphasized = parse_highlight_ranges(meta.as_deref(), raw_lines.len());

                let gutter_cols = if line_numbers && !raw_lines.is_empty() {
                    raw_lines.len().to_string().len() + 1
                } else {
                    0
                };
                let content_width = raw_lines
                    .iter()
                    .map(|line| line.chars().count())
                    .max()
                    .unwrap_or(0)
                    .min(self.wrap_width.saturating_sub(4 + gutter_cols).max(1));

                let mut block = CodeBlockRef {
                    line_range: 0..0,
                    language,
                    raw_lines,
                    emphasized,
                    line_numbers,
                    highlighted: false,
                    content_width,
                    right_padding: CODE_RIGHT_PADDING,
                };

                let title = block.language.as_deref().unwrap_or("code");
                let label = format!(" {title} ");
                let frame_inner_width = block.frame_inner_width();
                let visible_label: String = label.chars().take(frame_inner_width).collect();
                let top = format!(
                    "┌{}{}┐",
                    visible_label,
                    "─".repeat(frame_inner_width.saturating_sub(visible_label.chars().count()))
                );
                self.lines.push(RenderedLine::new(top, LineType::CodeBlock));

                let body_start = self.lines.len();
                for (idx, raw_line) in block.raw_lines.iter().enumerate() {
                    let mut plain_style = InlineStyle::default();
                    plain_style.code = true;
                    let content = [InlineSpan::new(raw_line.clone(), plain_style)];
                    self.lines.push(compose_code_row(&block, idx + 1, &content));
                }
                block.line_range = body_start..self.lines.len();

                self.lines.push(RenderedLine::new(
                    format!("└{}┘", "─".repeat(frame_inner_width)),
                    LineType::CodeBlock,
                ));
                self.lines
                    .push(RenderedLine::new(String::new(), LineType::Empty));
                self.code_blocks.push(block);
                Vec::new()
            }
        }
    }
}

fn ensure_trailing_empty_lines(lines: &mut Vec<RenderedLine>, count: usize) {
    let existing = lines
        .iter()
        .rev()
        .take_while(|line| matches!(line.line_type(), LineType::Empty))
        .count();
    for _ in existing..count {
        lines.push(RenderedLine::new(String::new(), LineType::Empty));
    }
}

fn quote_prefix(depth: usize) -> String {
    let mut prefix = String::from("  ");
    for _ in 0..depth {
        prefix.push('│');
        prefix.push(' ');
    }
    prefix
}

fn render_table<'a>(table_node: &'a AstNode<'a>, wrap_width: usize) -> Vec<String> {
    let (alignments, mut rows, has_header) = collect_table_rows(table_node);
    if rows.is_empty() {
        return Vec::new();
    }

    let num_cols = rows.iter().map(std::vec::Vec::len).max().unwrap_or(0);
    if num_cols == 0 {
        return Vec::new();
    }

    for row in &mut rows {
        while row.len() < num_cols {
            row.push(String::new());
        }
    }

    let mut col_widths = vec![1_usize; num_cols];
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            col_widths[idx] = col_widths[idx].max(display_width(cell));
        }
    }

    // Keep the table inside available width.
    // Table row width is: 1 + sum(col_width + 3) for all columns.
    let max_table_width = wrap_width.max(4);
    while 1 + col_widths.iter().sum::<usize>() + (3 * num_cols) > max_table_width {
        if let Some((widest_idx, _)) = col_widths.iter().enumerate().max_by_key(|(_, w)| *w) {
            if col_widths[widest_idx] > 1 {
                col_widths[widest_idx] -= 1;
            } else {
                break;
            }
        }
    }

    let top = render_table_border(&col_widths, '┌', '┬', '┐');
    let mid = render_table_border(&col_widths, '├', '┼', '┤');
    let bottom = render_table_border(&col_widths, '└', '┴', '┘');

    let mut lines = Vec::new();
    lines.push(top);
    for (idx, row) in rows.iter().enumerate() {
        lines.push(render_table_row(row, &col_widths, &alignments));
        if has_header && idx == 0 {
            lines.push(mid.clone());
        }
    }
    lines.push(bottom);
    lines
}

fn collect_table_rows<'a>(
    table_node: &'a AstNode<'a>,
) -> (Vec<TableAlignment>, Vec<Vec<String>>, bool) {
    let alignments = match &table_node.data.borrow().value {
        NodeValue::Table(table) => table.alignments.clone(),
        _ => Vec::new(),
    };

    let mut rows = Vec::new();
    let mut has_header = false;
    for row_node in table_node.children() {
        let is_header_row = matches!(row_node.data.borrow().value, NodeValue::TableRow(true));
        if is_header_row {
            has_header = true;
        }
        if !matches!(row_node.data.borrow().value, NodeValue::TableRow(_)) {
            continue;
        }

        let mut row_cells = Vec::new();
        for cell_node in row_node.children() {
            if !matches!(cell_node.data.borrow().value, NodeValue::TableCell) {
                continue;
            }
            let cell = extract_text(cell_node)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            row_cells.push(cell);
        }
        rows.push(row_cells);
    }

    (alignments, rows, has_header)
}

fn render_table_border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut out = String::new();
    out.push(left);
    for (idx, width) in widths.iter().enumerate() {
        out.push_str(&"─".repeat(width + 2));
        if idx + 1 < widths.len() {
            out.push(middle);
        }
    }
    out.push(right);
    out
}

fn render_table_row(cells: &[String], widths: &[usize], alignments: &[TableAlignment]) -> String {
    let mut out = String::new();
    out.push('│');
    for idx in 0..widths.len() {
        let content = cells.get(idx).map_or("", std::string::String::as_str);
        let content = truncate_text(content, widths[idx]);
        let padding = widths[idx].saturating_sub(display_width(&content));

        out.push(' ');
        match alignments.get(idx).copied().unwrap_or(TableAlignment::None) {
            TableAlignment::Right => {
                out.push_str(&" ".repeat(padding));
                out.push_str(&content);
            }
            TableAlignment::Center => {
                let left = padding / 2;
                let right = padding - left;
                out.push_str(&" ".repeat(left));
                out.push_str(&content);
                out.push_str(&" ".repeat(right));
            }
            TableAlignment::Left | TableAlignment::None => {
                out.push_str(&content);
                out.push_str(&" ".repeat(padding));
            }
        }
        out.push(' ');
        out.push('│');
    }
    out
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_chars {
            break;
        }
        out.push(ch);
        width += ch_width;
    }
    out
}

fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn extract_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    extract_text_recursive(node, &mut text);
    text
}

fn extract_text_recursive<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => {
            text.push_str(t);
        }
        NodeValue::Code(c) => {
            text.push('`');
            text.push_str(&c.literal);
            text.push('`');
        }
        NodeValue::FootnoteReference(reference) => {
            text.push_str(&format!("[^{}]", reference.name));
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            text.push('\n');
        }
        _ => {
            for child in node.children() {
                extract_text_recursive(child, text);
            }
        }
    }
}

fn wrap_inline(
    spans: &[InlineSpan],
    width: usize,
    prefix_first: &str,
    prefix_next: &str,
) -> Vec<Vec<InlineSpan>> {
    let tokens: Vec<InlineSpan> = spans.iter().flat_map(split_whitespace_runs).collect();

    let mut lines: Vec<Vec<InlineSpan>> = Vec::new();
    let mut current = prefixed_line(prefix_first);
    let mut current_len = prefix_first.chars().count();
    let mut has_word = false;

    for token in tokens {
        let token_len = token.text().chars().count();
        let token_is_ws = token.text().chars().all(char::is_whitespace);

        if current_len + token_len > width && has_word {
            lines.push(current);
            current = prefixed_line(prefix_next);
            current_len = prefix_next.chars().count();
            has_word = false;
        }

        if token_is_ws && !has_word {
            // Drop leading whitespace at wrapped line starts.
            continue;
        }

        current_len += token_len;
        current.push(token);
        if !token_is_ws {
            has_word = true;
        }
    }

    if current.is_empty() && !prefix_first.is_empty() {
        current = prefixed_line(prefix_first);
    }

    lines.push(current);
    lines
}

fn prefixed_line(prefix: &str) -> Vec<InlineSpan> {
    if prefix.is_empty() {
        Vec::new()
    } else {
        vec![InlineSpan::new(prefix.to_string(), InlineStyle::default())]
    }
}

fn split_whitespace_runs(span: &InlineSpan) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut ws_state: Option<bool> = None;

    for ch in span.text().chars() {
        let is_ws = ch.is_whitespace();
        match ws_state {
            Some(state) if state == is_ws => {
                buf.push(ch);
            }
            Some(_) => {
                out.push(InlineSpan::new(std::mem::take(&mut buf), span.style()));
                buf.push(ch);
                ws_state = Some(is_ws);
            }
            None => {
                buf.push(ch);
                ws_state = Some(is_ws);
            }
        }
    }

    if !buf.is_empty() {
        out.push(InlineSpan::new(buf, span.style()));
    }

    out
}

/// Collect images from a paragraph node, returning (alt, src) pairs.
fn collect_paragraph_images<'a>(node: &'a AstNode<'a>) -> Vec<(String, String)> {
    let mut images = Vec::new();
    collect_paragraph_images_recursive(node, &mut images);
    images
}

fn collect_paragraph_images_recursive<'a>(
    node: &'a AstNode<'a>,
    images: &mut Vec<(String, String)>,
) {
    match &node.data.borrow().value {
        NodeValue::Image(image) => {
            let alt = extract_text(node);
            images.push((alt, image.url.clone()));
        }
        _ => {
            for child in node.children() {
                collect_paragraph_images_recursive(child, images);
            }
        }
    }
}

fn collect_links<'a>(node: &'a AstNode<'a>, base_line: usize, links: &mut Vec<LinkRef>) {
    match &node.data.borrow().value {
        NodeValue::Link(link) => {
            links.push(LinkRef {
                text: extract_text(node),
                url: link.url.clone(),
                line: base_line,
            });
        }
        _ => {
            for child in node.children() {
                collect_links(child, base_line, links);
            }
        }
    }
}
