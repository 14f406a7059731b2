//! File watching for live reload.
//!
//! Uses the notify crate for cross-platform file system events. The whole
//! library root is watched recursively; only markdown changes count.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches a library root and emits debounced change notifications.
pub struct LibraryWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    /// Set when the library root is a single file; events are filtered to it.
    target_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl LibraryWatcher {
    /// Create a watcher for a library root (a directory or a single file).
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the root
    /// cannot be watched.
    pub fn new(root: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Canonicalize so event paths from the OS (which are always absolute
        // and canonical) match our stored paths.
        let root = root
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| root.as_ref().to_path_buf());
        let (watch_root, target_name) = if root.is_file() {
            let parent = root
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            (parent, root.file_name().map(OsStr::to_os_string))
        } else {
            (root, None)
        };

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_name,
            debounce,
            pending_since: None,
        })
    }

    /// Returns true once a debounced library change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut saw_relevant_event = false;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => {
                    saw_relevant_event = true;
                }
                Ok(ev) => {
                    tracing::trace!("ignoring event kind={:?} paths={:?}", ev.kind, ev.paths);
                }
                Err(err) => {
                    tracing::warn!("watcher error: {err}");
                }
            }
        }

        if saw_relevant_event {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            if let Some(name) = &self.target_name {
                path == &self.watch_root
                    || path.file_name().is_some_and(|f| f == name.as_os_str())
            } else {
                path == &self.watch_root || is_markdown(path)
            }
        })
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            ext == "md" || ext == "markdown"
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use tempfile::tempdir;

    fn event_for(paths: Vec<PathBuf>) -> Event {
        Event {
            kind: EventKind::Any,
            paths,
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_markdown_event_is_relevant_for_directory_root() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        std::fs::write(canonical_dir.join("doc.md"), "hi").expect("write");
        let watcher =
            LibraryWatcher::new(&canonical_dir, Duration::from_millis(10)).expect("watcher");

        assert!(watcher.is_relevant(&event_for(vec![canonical_dir.join("doc.md")])));
        assert!(watcher.is_relevant(&event_for(vec![canonical_dir.join("nested/deep.md")])));
    }

    #[test]
    fn test_non_markdown_event_is_ignored_for_directory_root() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        std::fs::write(canonical_dir.join("doc.md"), "hi").expect("write");
        let watcher =
            LibraryWatcher::new(&canonical_dir, Duration::from_millis(10)).expect("watcher");

        assert!(!watcher.is_relevant(&event_for(vec![canonical_dir.join("image.png")])));
    }

    #[test]
    fn test_directory_level_event_is_relevant() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        std::fs::write(canonical_dir.join("doc.md"), "hi").expect("write");
        let watcher =
            LibraryWatcher::new(&canonical_dir, Duration::from_millis(10)).expect("watcher");

        // Directory paths are what macOS FSEvents reports for many changes.
        assert!(watcher.is_relevant(&event_for(vec![canonical_dir])));
    }

    #[test]
    fn test_single_file_root_filters_to_target_name() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("solo.md");
        std::fs::write(&path, "hi").expect("write");
        let watcher = LibraryWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        assert!(watcher.is_relevant(&event_for(vec![path])));
        assert!(!watcher.is_relevant(&event_for(vec![canonical_dir.join("other.md")])));
    }

    #[test]
    fn test_real_file_modification_detected() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("watched.md");
        std::fs::write(&path, "original").expect("write");

        let mut watcher =
            LibraryWatcher::new(&canonical_dir, Duration::from_millis(50)).expect("watcher");

        // Give the backend time to register the watch
        std::thread::sleep(Duration::from_millis(500));

        std::fs::write(&path, "modified").expect("write");

        // Poll until the change is ready or timeout after 5 seconds
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        assert!(
            detected,
            "watcher should detect a markdown modification within 5 seconds"
        );
    }

    /// Test with the same debounce and poll interval as the real event loop.
    #[test]
    fn test_real_modification_with_app_timing() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("watched.md");
        std::fs::write(&path, "original").expect("write");

        let mut watcher =
            LibraryWatcher::new(&canonical_dir, Duration::from_millis(200)).expect("watcher");

        std::thread::sleep(Duration::from_millis(500));

        std::fs::write(&path, "modified by another process").expect("write");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(250));
        }

        assert!(
            detected,
            "watcher should detect modification with real app timing (200ms debounce, 250ms poll)"
        );
    }
}
