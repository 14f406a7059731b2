use crate::app::Model;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Navigation
    /// Scroll up by n lines
    ScrollUp(usize),
    /// Scroll down by n lines
    ScrollDown(usize),
    /// Scroll up one page
    PageUp,
    /// Scroll down one page
    PageDown,
    /// Scroll up half page
    HalfPageUp,
    /// Scroll down half page
    HalfPageDown,
    /// Go to beginning of document
    GoToTop,
    /// Go to end of document
    GoToBottom,

    // Article list
    /// Toggle article list sidebar visibility
    ToggleList,
    /// Move list selection up
    ListUp,
    /// Move list selection down
    ListDown,
    /// Open the selected article
    ListSelect,
    /// Switch focus between list and document
    SwitchFocus,
    /// Open the next article
    NextArticle,
    /// Open the previous article
    PrevArticle,

    // Files
    /// Toggle live reload
    ToggleWatch,
    /// Toggle the code-block line-number gutter
    ToggleLineNumbers,
    /// An article changed externally, reload
    FileChanged,
    /// Force reload the current article
    Reload,

    // Terminal
    /// Terminal was resized
    Resize(u16, u16),
    /// Quit the application
    Quit,
}

/// Pure state transition. Disk access happens in the event loop's
/// side-effect pass, never here.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        // Navigation
        Message::ScrollUp(n) => model.viewport.scroll_up(n),
        Message::ScrollDown(n) => model.viewport.scroll_down(n),
        Message::PageUp => model.viewport.page_up(),
        Message::PageDown => model.viewport.page_down(),
        Message::HalfPageUp => model.viewport.half_page_up(),
        Message::HalfPageDown => model.viewport.half_page_down(),
        Message::GoToTop => model.viewport.go_to_top(),
        Message::GoToBottom => model.viewport.go_to_bottom(),

        // Article list
        Message::ToggleList => {
            model.list_visible = !model.list_visible;
            if !model.list_visible {
                model.list_focused = false;
            }
            model.reflow_layout();
        }
        Message::SwitchFocus => {
            if model.list_visible {
                model.list_focused = !model.list_focused;
            }
        }
        Message::ListUp => {
            let next = model.list_selected.saturating_sub(1);
            model.list_selected = next;
            if next < model.list_scroll_offset {
                model.list_scroll_offset = next;
            }
        }
        Message::ListDown => {
            let max = model.sidebar_entry_count().saturating_sub(1);
            let next = (model.list_selected + 1).min(max);
            model.list_selected = next;
            let visible = model.list_visible_rows();
            if visible > 0 {
                let bottom = model.list_scroll_offset + visible.saturating_sub(1);
                if next > bottom {
                    model.list_scroll_offset = (next + 1)
                        .saturating_sub(visible)
                        .min(model.max_list_scroll_offset());
                }
            }
        }
        Message::ListSelect => {
            if model.sidebar_shows_articles() {
                model.current = model.list_selected;
            } else if let Some(heading) = model.document.headings().get(model.list_selected) {
                model.viewport.go_to_line(heading.line);
            }
        }
        Message::NextArticle => {
            if model.article_count() > 0 {
                model.current = (model.current + 1) % model.article_count();
                model.list_selected = model.current;
            }
        }
        Message::PrevArticle => {
            if model.article_count() > 0 {
                model.current =
                    (model.current + model.article_count() - 1) % model.article_count();
                model.list_selected = model.current;
            }
        }

        // Files
        Message::ToggleWatch => model.watch_enabled = !model.watch_enabled,
        Message::ToggleLineNumbers => {
            model.line_numbers = !model.line_numbers;
            model.reflow_layout();
        }
        // Disk reloads happen in the side-effect pass.
        Message::FileChanged | Message::Reload => {}

        // Terminal
        Message::Resize(width, height) => {
            model.viewport.resize(width, height.saturating_sub(1));
            model.reflow_layout();
        }
        Message::Quit => model.should_quit = true,
    }

    model
}
