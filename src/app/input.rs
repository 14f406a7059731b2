use crossterm::event::{self, Event, KeyCode, KeyModifiers};

use crate::app::{App, Message, Model};

use super::event_loop::ResizeDebouncer;

impl App {
    pub(super) fn handle_event(
        event: Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(key, model),
            Event::Resize(w, h) => {
                resize_debouncer.queue(w, h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: event::KeyEvent, model: &Model) -> Option<Message> {
        // Handle list-focused navigation
        if model.list_focused && model.list_visible {
            return match key.code {
                KeyCode::Char('j') | KeyCode::Down => Some(Message::ListDown),
                KeyCode::Char('k') | KeyCode::Up => Some(Message::ListUp),
                KeyCode::Enter | KeyCode::Char(' ') => Some(Message::ListSelect),
                KeyCode::Tab | KeyCode::Esc => Some(Message::SwitchFocus),
                KeyCode::Char('t') => Some(Message::ToggleList),
                KeyCode::Char('q') => Some(Message::Quit),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Message::Quit)
                }
                _ => None,
            };
        }

        // Normal key handling
        match key.code {
            // Navigation
            KeyCode::Char('j') | KeyCode::Down => {
                if model.viewport.can_scroll_down() {
                    Some(Message::ScrollDown(1))
                } else {
                    None
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if model.viewport.can_scroll_up() {
                    Some(Message::ScrollUp(1))
                } else {
                    None
                }
            }
            KeyCode::Char(' ') | KeyCode::PageDown => {
                if model.viewport.can_scroll_down() {
                    Some(Message::PageDown)
                } else {
                    None
                }
            }
            KeyCode::Char('b') | KeyCode::PageUp => {
                if model.viewport.can_scroll_up() {
                    Some(Message::PageUp)
                } else {
                    None
                }
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if model.viewport.can_scroll_down() {
                    Some(Message::HalfPageDown)
                } else {
                    None
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if model.viewport.can_scroll_up() {
                    Some(Message::HalfPageUp)
                } else {
                    None
                }
            }
            KeyCode::Char('g') | KeyCode::Home => Some(Message::GoToTop),
            KeyCode::Char('G') | KeyCode::End => Some(Message::GoToBottom),

            // Article list
            KeyCode::Char('t') => Some(Message::ToggleList),
            KeyCode::Tab if model.list_visible => Some(Message::SwitchFocus),
            KeyCode::Char('n') => {
                if model.article_count() > 1 {
                    Some(Message::NextArticle)
                } else {
                    None
                }
            }
            KeyCode::Char('p') => {
                if model.article_count() > 1 {
                    Some(Message::PrevArticle)
                } else {
                    None
                }
            }

            // Files
            KeyCode::Char('w') => Some(Message::ToggleWatch),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Message::Reload),
            KeyCode::Char('L') => Some(Message::ToggleLineNumbers),

            // Quit
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Message::Quit)
            }

            _ => None,
        }
    }
}
