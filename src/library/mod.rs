//! The article library: markdown documents discovered under a root path.
//!
//! The library only discovers and orders articles; content acquisition
//! (cloning or syncing the articles onto disk) is a provisioning step that
//! happens before the reader starts.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A markdown document in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Full path to the markdown file
    pub path: PathBuf,
    /// Display title, taken from the file stem
    pub title: String,
}

/// An ordered collection of markdown articles under a root path.
#[derive(Debug, Clone, Default)]
pub struct Library {
    root: PathBuf,
    articles: Vec<Article>,
}

/// Errors raised while scanning a library root.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("no markdown articles found under {0}")]
    Empty(PathBuf),
}

impl Library {
    /// Scan `root` for markdown articles, sorted by path.
    ///
    /// A single markdown file yields a one-article library. Hidden
    /// directories and files are skipped.
    ///
    /// # Errors
    /// Returns an error when the walk fails or no markdown file is found.
    pub fn scan(root: &Path) -> Result<Self, LibraryError> {
        let mut articles = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry.path()));

        for entry in walker {
            let entry = entry.map_err(|source| LibraryError::Scan {
                path: root.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && is_markdown(entry.path()) {
                articles.push(Article {
                    title: title_for(entry.path()),
                    path: entry.path().to_path_buf(),
                });
            }
        }

        if articles.is_empty() {
            return Err(LibraryError::Empty(root.to_path_buf()));
        }
        articles.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(Self {
            root: root.to_path_buf(),
            articles,
        })
    }

    /// The scanned root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Article> {
        self.articles.get(index)
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

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
}

fn title_for(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |stem| {
            stem.to_string_lossy().to_string()
        })
}
