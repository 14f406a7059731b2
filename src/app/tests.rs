use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::{TempDir, tempdir};

use crate::document::Document;
use crate::library::Library;

use super::event_loop::ResizeDebouncer;
use super::{App, Message, Model, update};

fn library_with(articles: &[(&str, &str)]) -> (TempDir, Library) {
    let dir = tempdir().unwrap();
    for (name, content) in articles {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    let library = Library::scan(dir.path()).unwrap();
    (dir, library)
}

fn create_test_model() -> (TempDir, Model) {
    let (dir, library) = library_with(&[
        ("alpha.md", "# Alpha\n\nFirst article"),
        ("beta.md", "# Beta\n\nSecond article"),
    ]);
    let mut model = Model::new(library, Document::empty(), (80, 24));
    model.load_article(0).unwrap();
    (dir, model)
}

fn create_long_test_model() -> (TempDir, Model) {
    let mut md = String::from("# Long\n\n");
    for i in 1..=50 {
        md.push_str(&format!("Line {i} of content.\n\n"));
    }
    let (dir, library) = library_with(&[("long.md", &md)]);
    let mut model = Model::new(library, Document::empty(), (80, 24));
    model.load_article(0).unwrap();
    (dir, model)
}

#[test]
fn test_scroll_down_updates_viewport() {
    let (_dir, model) = create_long_test_model();
    let model = update(model, Message::ScrollDown(5));
    assert_eq!(model.viewport.offset(), 5);
}

#[test]
fn test_scroll_up_updates_viewport() {
    let (_dir, mut model) = create_long_test_model();
    model.viewport.scroll_down(10);
    let model = update(model, Message::ScrollUp(3));
    assert_eq!(model.viewport.offset(), 7);
}

#[test]
fn test_toggle_list_changes_visibility() {
    let (_dir, model) = create_test_model();
    assert!(!model.list_visible);

    let model = update(model, Message::ToggleList);
    assert!(model.list_visible);

    let model = update(model, Message::ToggleList);
    assert!(!model.list_visible);
}

#[test]
fn test_hiding_list_drops_focus() {
    let (_dir, mut model) = create_test_model();
    model.list_visible = true;
    model.list_focused = true;

    let model = update(model, Message::ToggleList);
    assert!(!model.list_visible);
    assert!(!model.list_focused);
}

#[test]
fn test_switch_focus_requires_visible_list() {
    let (_dir, model) = create_test_model();
    let model = update(model, Message::SwitchFocus);
    assert!(!model.list_focused);

    let model = update(model, Message::ToggleList);
    let model = update(model, Message::SwitchFocus);
    assert!(model.list_focused);
}

#[test]
fn test_toggle_watch_changes_state() {
    let (_dir, model) = create_test_model();
    assert!(!model.watch_enabled);

    let model = update(model, Message::ToggleWatch);
    assert!(model.watch_enabled);
}

#[test]
fn test_next_article_advances_and_loads() {
    let (_dir, model) = create_test_model();
    assert_eq!(model.current, 0);

    let mut model = update(model, Message::NextArticle);
    App::handle_message_side_effects(&mut model, &Message::NextArticle);
    assert_eq!(model.current, 1);
    assert_eq!(model.title(), "beta");
    assert!(model.document.source().contains("Second article"));
}

#[test]
fn test_next_article_wraps_around() {
    let (_dir, mut model) = create_test_model();
    model.current = 1;
    let model = update(model, Message::NextArticle);
    assert_eq!(model.current, 0);
}

#[test]
fn test_prev_article_wraps_backwards() {
    let (_dir, model) = create_test_model();
    let mut model = update(model, Message::PrevArticle);
    App::handle_message_side_effects(&mut model, &Message::PrevArticle);
    assert_eq!(model.current, 1);
    assert_eq!(model.title(), "beta");
}

#[test]
fn test_list_select_opens_selected_article() {
    let (_dir, mut model) = create_test_model();
    model.list_selected = 1;
    let mut model = update(model, Message::ListSelect);
    App::handle_message_side_effects(&mut model, &Message::ListSelect);
    assert_eq!(model.current, 1);
    assert!(model.document.source().contains("Second article"));
}

#[test]
fn test_reload_picks_up_disk_changes() {
    let (dir, mut model) = create_test_model();
    std::fs::write(dir.path().join("alpha.md"), "# Alpha\n\nRewritten body").unwrap();

    App::handle_message_side_effects(&mut model, &Message::Reload);
    assert!(model.document.source().contains("Rewritten body"));
}

#[test]
fn test_reload_keeps_scroll_position() {
    let (dir, mut model) = create_long_test_model();
    model.viewport.scroll_down(10);

    let mut md = String::from("# Long\n\n");
    for i in 1..=60 {
        md.push_str(&format!("Line {i} of new content.\n\n"));
    }
    std::fs::write(dir.path().join("long.md"), md).unwrap();

    App::handle_message_side_effects(&mut model, &Message::FileChanged);
    assert_eq!(model.viewport.offset(), 10);
    assert!(model.document.source().contains("new content"));
}

#[test]
fn test_failed_reload_keeps_previous_document() {
    let (dir, mut model) = create_test_model();
    std::fs::remove_file(dir.path().join("alpha.md")).unwrap();

    App::handle_message_side_effects(&mut model, &Message::Reload);
    assert!(model.document.source().contains("First article"));
    assert!(model.active_notice().is_some());
}

#[test]
fn test_resize_reflows_to_new_width() {
    let (_dir, library) = library_with(&[(
        "wide.md",
        "A fairly long paragraph that will need to wrap once the terminal gets narrow.",
    )]);
    let mut model = Model::new(library, Document::empty(), (80, 24));
    model.load_article(0).unwrap();

    let model = update(model, Message::Resize(30, 24));
    assert_eq!(model.viewport.width(), 30);
    let wrapped = model
        .document
        .visible_lines(0, 50)
        .iter()
        .filter(|l| !l.content().is_empty())
        .count();
    assert!(wrapped > 1, "narrow layout should wrap the paragraph");
}

#[test]
fn test_toggle_line_numbers_reflows_gutter() {
    let (_dir, library) = library_with(&[("code.md", "```rust\nlet a = 1;\n```")]);
    let mut model = Model::new(library, Document::empty(), (80, 24));
    model.load_article(0).unwrap();

    let has_gutter = |model: &Model| {
        model
            .document
            .visible_lines(0, 20)
            .iter()
            .any(|l| l.content().starts_with("│ 1 "))
    };
    assert!(has_gutter(&model));

    let model = update(model, Message::ToggleLineNumbers);
    assert!(!has_gutter(&model));
}

#[test]
fn test_quit_sets_flag() {
    let (_dir, model) = create_test_model();
    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_notice_expires() {
    let (_dir, mut model) = create_test_model();
    model.show_notice("hello");
    assert_eq!(model.active_notice(), Some("hello"));

    assert!(!model.expire_notice(Instant::now()));
    assert!(model.expire_notice(Instant::now() + Duration::from_secs(5)));
    assert!(model.active_notice().is_none());
}

#[test]
fn test_resize_debouncer_waits_for_delay() {
    let mut debouncer = ResizeDebouncer::new(100);
    debouncer.queue(120, 40, 0);
    assert!(debouncer.is_pending());
    assert_eq!(debouncer.take_ready(50), None);
    assert_eq!(debouncer.take_ready(100), Some((120, 40)));
    assert!(!debouncer.is_pending());
}

#[test]
fn test_resize_debouncer_keeps_latest_size() {
    let mut debouncer = ResizeDebouncer::new(100);
    debouncer.queue(120, 40, 0);
    debouncer.queue(100, 30, 50);
    assert_eq!(debouncer.take_ready(150), Some((100, 30)));
}

#[test]
fn test_key_q_quits() {
    let (_dir, model) = create_test_model();
    let msg = App::handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::Quit));
}

#[test]
fn test_key_j_scrolls_when_scrollable() {
    let (_dir, model) = create_long_test_model();
    let msg = App::handle_key(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::ScrollDown(1)));
}

#[test]
fn test_key_j_ignored_for_short_document() {
    let (_dir, model) = create_test_model();
    let msg = App::handle_key(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE), &model);
    assert_eq!(msg, None);
}

#[test]
fn test_key_j_moves_list_selection_when_focused() {
    let (_dir, mut model) = create_test_model();
    model.list_visible = true;
    model.list_focused = true;
    let msg = App::handle_key(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::ListDown));
}

#[test]
fn test_key_upper_l_toggles_line_numbers() {
    let (_dir, model) = create_test_model();
    let msg = App::handle_key(
        KeyEvent::new(KeyCode::Char('L'), KeyModifiers::SHIFT),
        &model,
    );
    assert_eq!(msg, Some(Message::ToggleLineNumbers));
}

#[test]
fn test_key_n_ignored_for_single_article_library() {
    let (_dir, library) = library_with(&[("only.md", "# Only")]);
    let mut model = Model::new(library, Document::empty(), (80, 24));
    model.load_article(0).unwrap();
    let msg = App::handle_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE), &model);
    assert_eq!(msg, None);
}

#[test]
fn test_list_select_jumps_to_heading_for_single_article() {
    let mut md = String::new();
    for i in 1..=20 {
        md.push_str(&format!("## Section {i}\n\nBody {i}\n\n"));
    }
    let (_dir, library) = library_with(&[("toc.md", &md)]);
    let mut model = Model::new(library, Document::empty(), (80, 10));
    model.load_article(0).unwrap();
    assert!(!model.sidebar_shows_articles());

    model.list_selected = 5;
    let model = update(model, Message::ListSelect);
    let target = model.document.headings()[5].line;
    assert_eq!(model.viewport.offset(), target);
}

#[test]
fn test_list_down_clamps_to_last_article() {
    let (_dir, mut model) = create_test_model();
    model.list_selected = 1;
    let model = update(model, Message::ListDown);
    assert_eq!(model.list_selected, 1);
}
