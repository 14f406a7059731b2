use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Model;

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let title = model.title();
    let percent = model.viewport.scroll_percent();
    let line_info = format!(
        "Line {}/{}",
        model.viewport.offset() + 1,
        model.viewport.total_lines()
    );
    let article_info = if model.article_count() > 1 {
        format!("  [{}/{}]", model.current + 1, model.article_count())
    } else {
        String::new()
    };

    let watch_indicator = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };

    let status = format!(
        " {title}{article_info}  [{percent}%]  {line_info}{watch_indicator}  q:quit t:list n/p:article"
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_notice_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(message) = model.active_notice() else {
        return;
    };
    let bar = Paragraph::new(format!("[warn] {message}"))
        .style(Style::default().bg(Color::Yellow).fg(Color::Black));
    frame.render_widget(bar, area);
}
