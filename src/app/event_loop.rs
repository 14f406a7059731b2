use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, update};
use crate::document::Document;
use crate::library::Library;
use crate::watcher::LibraryWatcher;

/// Debounce window for library change notifications.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be scanned, terminal
    /// initialization fails, or the event loop encounters an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let library = Library::scan(&self.root).with_context(|| {
            format!("failed to open article library at {}", self.root.display())
        })?;

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal — folio requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model = Model::new(library, Document::empty(), (size.width, size.height));
        model.watch_enabled = self.watch_enabled;
        model.list_visible = self.list_visible;
        model.line_numbers = self.line_numbers;
        if let Err(err) = model.load_article(0) {
            model.show_notice(format!("Open failed: {err}"));
        }

        let result = Self::event_loop(&mut terminal, &mut model);

        ratatui::restore();
        result
    }

    fn event_loop(terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut watcher: Option<LibraryWatcher> = None;
        let mut needs_render = true;

        loop {
            // Keep the watcher in step with the toggle.
            if model.watch_enabled && watcher.is_none() {
                match LibraryWatcher::new(model.library.root(), WATCH_DEBOUNCE) {
                    Ok(w) => watcher = Some(w),
                    Err(err) => {
                        model.watch_enabled = false;
                        model.show_notice(format!("Watch unavailable: {err}"));
                        tracing::warn!(
                            "watcher failed for {}: {err}",
                            model.library.root().display()
                        );
                        needs_render = true;
                    }
                }
            } else if !model.watch_enabled && watcher.is_some() {
                watcher = None;
            }

            if model.expire_notice(Instant::now()) {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                *model = update(std::mem::take(model), Message::Resize(width, height));
                needs_render = true;
            }

            if model.watch_enabled
                && watcher
                    .as_mut()
                    .is_some_and(LibraryWatcher::take_change_ready)
            {
                *model = update(std::mem::take(model), Message::FileChanged);
                Self::handle_message_side_effects(model, &Message::FileChanged);
                needs_render = true;
            }

            // Handle events
            let poll_ms = if needs_render {
                0
            } else if resize_debouncer.is_pending() {
                10
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so the debouncer uses accurate times.
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                let msg =
                    Self::handle_event(event::read()?, model, event_ms, &mut resize_debouncer);
                if let Some(msg) = msg {
                    let side_msg = msg.clone();
                    *model = update(std::mem::take(model), msg);
                    Self::handle_message_side_effects(model, &side_msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let msg =
                        Self::handle_event(event::read()?, model, drain_ms, &mut resize_debouncer);
                    if let Some(msg) = msg {
                        let side_msg = msg.clone();
                        *model = update(std::mem::take(model), msg);
                        Self::handle_message_side_effects(model, &side_msg);
                        needs_render = true;
                    }
                }
            }

            if needs_render {
                model.ensure_highlight_overscan();
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }

    /// Apply the disk-touching consequences of a message after the pure
    /// update. Failures surface as notices; the previous document stays up.
    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        match msg {
            Message::ListSelect if !model.sidebar_shows_articles() => {}
            Message::ListSelect | Message::NextArticle | Message::PrevArticle => {
                let index = model.current;
                if let Err(err) = model.load_article(index) {
                    model.show_notice(format!("Open failed: {err}"));
                }
            }
            Message::FileChanged | Message::Reload => {
                if let Err(err) = model.reload_current() {
                    model.show_notice(format!("Reload failed: {err}"));
                }
            }
            _ => {}
        }
    }
}
