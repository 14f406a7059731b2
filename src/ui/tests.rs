use ratatui::Terminal;
use ratatui::backend::TestBackend;
use tempfile::{TempDir, tempdir};

use super::*;
use crate::app::Model;
use crate::document::Document;
use crate::library::Library;

fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(80, 40);
    Terminal::new(backend).unwrap()
}

fn model_for(articles: &[(&str, &str)]) -> (TempDir, Model) {
    let dir = tempdir().unwrap();
    for (name, content) in articles {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    let library = Library::scan(dir.path()).unwrap();
    let mut model = Model::new(library, Document::empty(), (80, 40));
    model.load_article(0).unwrap();
    (dir, model)
}

fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(ratatui::buffer::Cell::symbol)
        .collect()
}

#[test]
fn test_render_shows_document_text() {
    let (_dir, mut model) = model_for(&[("intro.md", "# Intro\n\nHello from folio")]);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let content = buffer_text(&terminal);
    assert!(content.contains("Intro"));
    assert!(content.contains("Hello from folio"));
}

#[test]
fn test_render_status_bar_shows_title() {
    let (_dir, mut model) = model_for(&[("my-article.md", "body")]);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let content = buffer_text(&terminal);
    assert!(content.contains("my-article"));
}

#[test]
fn test_render_sidebar_lists_articles() {
    let (_dir, mut model) = model_for(&[("first.md", "one"), ("second.md", "two")]);
    model.list_visible = true;
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let content = buffer_text(&terminal);
    assert!(content.contains("Articles"));
    assert!(content.contains("first"));
    assert!(content.contains("second"));
}

#[test]
fn test_render_sidebar_shows_headings_for_single_article() {
    let (_dir, mut model) = model_for(&[(
        "guide.md",
        "# Top\n\nintro\n\n## Nested section\n\nbody",
    )]);
    model.list_visible = true;
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let content = buffer_text(&terminal);
    assert!(content.contains("Contents"));
    assert!(content.contains("Nested section"));
}

#[test]
fn test_render_without_sidebar_omits_list_title() {
    let (_dir, mut model) = model_for(&[("first.md", "one")]);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let content = buffer_text(&terminal);
    assert!(!content.contains("Articles"));
}

#[test]
fn test_render_notice_bar_when_active() {
    let (_dir, mut model) = model_for(&[("a.md", "text")]);
    model.show_notice("something went wrong");
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let content = buffer_text(&terminal);
    assert!(content.contains("[warn] something went wrong"));
}

#[test]
fn test_render_emphasized_code_row_has_background() {
    let (_dir, mut model) = model_for(&[(
        "code.md",
        "```rust {1}\nlet marker = 1;\nlet other = 2;\n```",
    )]);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let buffer = terminal.backend().buffer();
    let mut emphasized_row = None;
    for y in 0..40u16 {
        let row: String = (0..80u16)
            .filter_map(|x| buffer.cell((x, y)).map(ratatui::buffer::Cell::symbol))
            .collect();
        if row.contains("let marker") {
            emphasized_row = Some(y);
        }
    }
    let y = emphasized_row.expect("emphasized code row not rendered");
    let has_bg = (0..80u16).any(|x| {
        buffer.cell((x, y)).is_some_and(|cell| {
            matches!(cell.style().bg, Some(ratatui::style::Color::Rgb(..)))
        })
    });
    assert!(has_bg, "emphasized row should carry a background fill");
}

#[test]
fn test_document_content_width_accounts_for_sidebar() {
    let full = document_content_width(100, false);
    let split = document_content_width(100, true);
    assert!(split < full);
    assert_eq!(full, 98);
}

#[test]
fn test_split_main_columns_covers_area() {
    let area = ratatui::layout::Rect::new(0, 0, 100, 30);
    let chunks = split_main_columns(area);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].width + chunks[1].width, 100);
}
