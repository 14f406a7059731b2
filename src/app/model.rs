use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::document::Document;
use crate::library::Library;
use crate::ui::viewport::Viewport;

/// How long a notice stays in the status area.
const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Extra lines beyond the viewport to highlight ahead of scrolling.
const HIGHLIGHT_OVERSCAN: usize = 50;

/// A transient status-line message.
#[derive(Debug, Clone)]
struct Notice {
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
#[derive(Debug)]
pub struct Model {
    /// The article library being read
    pub library: Library,
    /// Index of the currently open article
    pub current: usize,
    /// The loaded markdown document
    pub document: Document,
    /// Viewport managing scroll position
    pub viewport: Viewport,
    /// Whether the article list sidebar is visible
    pub list_visible: bool,
    /// Focus: true = article list, false = document
    pub list_focused: bool,
    /// Selected article-list entry index
    pub list_selected: usize,
    /// Scroll offset for the article-list viewport
    pub list_scroll_offset: usize,
    /// Whether live reload is enabled
    pub watch_enabled: bool,
    /// Whether code blocks carry a line-number gutter
    pub line_numbers: bool,
    /// Whether the app should quit
    pub should_quit: bool,
    notice: Option<Notice>,
}

impl Model {
    /// Create a new model for the given library and document.
    pub fn new(library: Library, document: Document, size: (u16, u16)) -> Self {
        // The last terminal row is reserved for the status bar.
        let viewport = Viewport::new(size.0, size.1.saturating_sub(1), document.line_count());
        Self {
            library,
            current: 0,
            document,
            viewport,
            list_visible: false,
            list_focused: false,
            list_selected: 0,
            list_scroll_offset: 0,
            watch_enabled: false,
            line_numbers: true,
            should_quit: false,
            notice: None,
        }
    }

    /// Display title of the current article.
    pub fn title(&self) -> &str {
        self.library
            .get(self.current)
            .map_or("(no articles)", |article| article.title.as_str())
    }

    /// Number of articles in the library.
    pub fn article_count(&self) -> usize {
        self.library.len()
    }

    /// Load the article at `index` from disk and make it current.
    ///
    /// # Errors
    /// Returns an error when the index is out of range or the file cannot be
    /// read. The previous document stays up on failure.
    pub fn load_article(&mut self, index: usize) -> Result<()> {
        let path = self
            .library
            .get(index)
            .with_context(|| format!("no article at index {index}"))?
            .path
            .clone();
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let document =
            Document::parse_with_layout(&source, self.content_width(), self.line_numbers)?;

        self.current = index;
        self.list_selected = index;
        self.document = document;
        self.viewport.set_total_lines(self.document.line_count());
        self.viewport.go_to_top();
        Ok(())
    }

    /// Re-read the current article from disk, keeping the scroll position.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read.
    pub fn reload_current(&mut self) -> Result<()> {
        let offset = self.viewport.offset();
        self.load_article(self.current)?;
        self.viewport.scroll_down(offset);
        Ok(())
    }

    /// Re-parse the current document for the current layout width.
    pub fn reflow_layout(&mut self) {
        let source = self.document.source().to_string();
        match Document::parse_with_layout(&source, self.content_width(), self.line_numbers) {
            Ok(document) => {
                self.document = document;
                self.viewport.set_total_lines(self.document.line_count());
            }
            Err(err) => self.show_notice(format!("Reflow failed: {err}")),
        }
    }

    /// Columns available for document content.
    pub fn content_width(&self) -> u16 {
        crate::ui::document_content_width(self.viewport.width(), self.list_visible)
    }

    /// Highlight code blocks around the viewport before rendering.
    pub fn ensure_highlight_overscan(&mut self) {
        let range = self.viewport.visible_range();
        let start = range.start.saturating_sub(HIGHLIGHT_OVERSCAN);
        let end = (range.end + HIGHLIGHT_OVERSCAN).min(self.document.line_count());
        self.document.ensure_highlight_for_range(start..end);
    }

    /// True when the sidebar lists articles rather than headings.
    ///
    /// A single-article library has nothing to switch between, so the
    /// sidebar becomes a table of contents for the open document.
    pub fn sidebar_shows_articles(&self) -> bool {
        self.article_count() > 1
    }

    /// Number of entries in the sidebar.
    pub fn sidebar_entry_count(&self) -> usize {
        if self.sidebar_shows_articles() {
            self.article_count()
        } else {
            self.document.headings().len()
        }
    }

    /// Rows available in the sidebar.
    pub fn list_visible_rows(&self) -> usize {
        // Sidebar spans the full terminal height minus its borders.
        (self.viewport.height() as usize + 1).saturating_sub(2)
    }

    pub fn max_list_scroll_offset(&self) -> usize {
        self.sidebar_entry_count()
            .saturating_sub(self.list_visible_rows())
    }

    /// Show a transient message in the status area.
    pub fn show_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            message: message.into(),
            expires_at: Instant::now() + NOTICE_TTL,
        });
    }

    /// The active notice message, if any.
    pub fn active_notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.message.as_str())
    }

    /// Drop an expired notice. Returns true when one was cleared.
    pub fn expire_notice(&mut self, now: Instant) -> bool {
        if self.notice.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.notice = None;
            true
        } else {
            false
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(Library::default(), Document::empty(), (80, 24))
    }
}
