use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;

use super::{DOC_WIDTH_PERCENT, DOCUMENT_LEFT_PADDING, LIST_WIDTH_PERCENT, status};

pub fn split_main_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(LIST_WIDTH_PERCENT),
            Constraint::Percentage(DOC_WIDTH_PERCENT),
        ])
        .split(area)
}

pub fn document_content_width(total_width: u16, list_visible: bool) -> u16 {
    let area = Rect::new(0, 0, total_width, 1);
    let doc_width = if list_visible {
        split_main_columns(area)[1].width
    } else {
        total_width
    };
    doc_width.saturating_sub(DOCUMENT_LEFT_PADDING).max(1)
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();

    if model.list_visible {
        // Split into sidebar and document
        let chunks = split_main_columns(area);
        render_sidebar(model, frame, chunks[0]);
        render_document(model, frame, chunks[1]);
    } else {
        render_document(model, frame, area);
    }
}

fn render_sidebar(model: &Model, frame: &mut Frame, area: Rect) {
    if model.sidebar_shows_articles() {
        render_article_list(model, frame, area);
    } else {
        render_heading_list(model, frame, area);
    }
}

fn sidebar_window(model: &Model, area: Rect, total: usize) -> (usize, usize) {
    let visible_rows = area.height.saturating_sub(2) as usize;
    let max_start = total.saturating_sub(visible_rows);
    let start = model.list_scroll_offset.min(max_start);
    let end = (start + visible_rows).min(total);
    (start, end)
}

fn sidebar_block(model: &Model, title: &'static str) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if model.list_focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        })
}

fn render_article_list(model: &Model, frame: &mut Frame, area: Rect) {
    let articles = model.library.articles();
    let (start, end) = sidebar_window(model, area, articles.len());

    let items: Vec<Line> = articles
        .iter()
        .enumerate()
        .skip(start)
        .take(end.saturating_sub(start))
        .map(|(i, article)| {
            let marker = if i == model.current { "*" } else { " " };
            let style = if model.list_selected == i {
                Style::default().reversed()
            } else {
                Style::default()
            };
            Line::styled(format!("{marker} {}", article.title), style)
        })
        .collect();

    let list = Paragraph::new(items).block(sidebar_block(model, "Articles"));
    frame.render_widget(list, area);
}

fn render_heading_list(model: &Model, frame: &mut Frame, area: Rect) {
    let headings = model.document.headings();
    let (start, end) = sidebar_window(model, area, headings.len());

    let items: Vec<Line> = headings
        .iter()
        .enumerate()
        .skip(start)
        .take(end.saturating_sub(start))
        .map(|(i, h)| {
            let indent = "  ".repeat(h.level.saturating_sub(1) as usize);
            let marker = if model.list_selected == i { ">" } else { " " };
            let base_style =
                super::style::style_for_line_type(&crate::document::LineType::Heading(h.level));
            let style = if model.list_selected == i {
                base_style.reversed()
            } else {
                base_style
            };
            Line::styled(format!("{marker}{indent} {}", h.text), style)
        })
        .collect();

    let list = Paragraph::new(items).block(sidebar_block(model, "Contents"));
    frame.render_widget(list, area);
}

fn render_document(model: &mut Model, frame: &mut Frame, area: Rect) {
    let notice_active = model.active_notice().is_some();
    let footer_rows = 1 + u16::from(notice_active);
    // Reserve last line for the status bar (+ one notice line when active).
    let doc_outer_area = Rect {
        height: area.height.saturating_sub(footer_rows),
        ..area
    };
    let notice_area = Rect {
        y: area.y + area.height.saturating_sub(2),
        height: 1,
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1,
        ..area
    };

    let visible_lines = model
        .document
        .visible_lines(model.viewport.offset(), model.viewport.height() as usize);

    let mut content: Vec<Line> = Vec::new();
    for line in visible_lines {
        let line_style = super::style::style_for_line_type(line.line_type());
        if let Some(spans) = line.spans() {
            let styled_spans = spans
                .iter()
                .map(|span| {
                    Span::styled(
                        span.text().to_string(),
                        super::style::style_for_inline(line_style, span.style()),
                    )
                })
                .collect::<Vec<_>>();
            content.push(Line::from(styled_spans));
        } else {
            content.push(Line::styled(line.content().to_string(), line_style));
        }
    }

    let doc_block = Block::default()
        .borders(Borders::NONE)
        .padding(Padding::left(DOCUMENT_LEFT_PADDING));
    let doc = Paragraph::new(content).block(doc_block);
    // Clear first so styles from previous frames do not leak.
    frame.render_widget(Clear, doc_outer_area);
    frame.render_widget(doc, doc_outer_area);

    if notice_active {
        status::render_notice_bar(model, frame, notice_area);
    }
    status::render_status_bar(model, frame, status_area);
}
