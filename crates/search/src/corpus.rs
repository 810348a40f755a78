//! Document corpus loading and keyword indexing
//!
//! The corpus is built once at startup and is read-only afterwards. It can be
//! shared across any number of concurrent requests behind an `Arc`.

use crate::tokenizer::keyword_counts;
use docchat_common::errors::{AppError, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// File extensions (lowercase, without the dot) included in the corpus
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "rst", "json"];

/// A loaded document with its keyword index
#[derive(Debug, Clone)]
pub struct Document {
    path: String,
    content: String,
    keywords: HashMap<String, usize>,
}

impl Document {
    /// Build a document, indexing its content
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let keywords = keyword_counts(&content);
        Self {
            path: path.into(),
            content,
            keywords,
        }
    }

    /// Path the document was discovered at
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Token -> occurrence count
    pub fn keywords(&self) -> &HashMap<String, usize> {
        &self.keywords
    }

    /// Occurrences of `token` in this document (0 if absent)
    pub fn count(&self, token: &str) -> usize {
        self.keywords.get(token).copied().unwrap_or(0)
    }
}

/// Ordered collection of documents. Order is discovery order and breaks ties when ranking.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Recursively load every text file under `root`.
    ///
    /// Entries are visited in file-name order. Any walk or read failure
    /// aborts the whole load; a partial corpus is never returned.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut documents = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| AppError::Load {
                path: e
                    .path()
                    .unwrap_or(root)
                    .display()
                    .to_string(),
                message: e.to_string(),
            })?;

            if entry.file_type().is_dir() || !is_text_file(entry.path()) {
                continue;
            }

            let bytes = std::fs::read(entry.path()).map_err(|e| AppError::Load {
                path: entry.path().display().to_string(),
                message: e.to_string(),
            })?;
            let content = String::from_utf8_lossy(&bytes).into_owned();

            let document = Document::new(entry.path().display().to_string(), content);
            debug!(
                path = %document.path(),
                bytes = bytes.len(),
                keywords = document.keywords().len(),
                "Indexed document"
            );
            documents.push(document);
        }

        info!(root = %root.display(), documents = documents.len(), "Corpus loaded");
        Ok(Self { documents })
    }

    /// Build a corpus from already-constructed documents, keeping their order
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// Check the extension against [`TEXT_EXTENSIONS`], ignoring case
pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_is_text_file() {
        assert!(is_text_file(Path::new("docs/a.txt")));
        assert!(is_text_file(Path::new("docs/README.MD")));
        assert!(is_text_file(Path::new("docs/guide.Rst")));
        assert!(is_text_file(Path::new("docs/data.json")));
        assert!(!is_text_file(Path::new("docs/image.png")));
        assert!(!is_text_file(Path::new("docs/notes")));
        assert!(!is_text_file(Path::new("docs/archive.txt.gz")));
    }

    #[test]
    fn test_load_filters_and_recurses() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.txt", "banana bread recipe");
        write(dir.path(), "a.md", "apple pie recipe");
        write(dir.path(), "nested/c.json", "{\"fruit\": \"cherry\"}");
        write(dir.path(), "skip.png", "not text");
        write(dir.path(), "nested/skip.rs", "fn main() {}");

        let corpus = Corpus::load(dir.path()).unwrap();
        let names: Vec<&str> = corpus
            .iter()
            .map(|d| Path::new(d.path()).file_name().unwrap().to_str().unwrap())
            .collect();

        // File-name order at each level, directories descended in place
        assert_eq!(names, vec!["a.md", "b.txt", "c.json"]);
        assert_eq!(corpus.documents()[0].content(), "apple pie recipe");
        assert_eq!(corpus.documents()[0].count("recipe"), 1);
    }

    #[test]
    fn test_load_indexes_keywords() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "doc.txt", "Tokio tokio, TOKIO! is an async runtime.");

        let corpus = Corpus::load(dir.path()).unwrap();
        let doc = &corpus.documents()[0];
        assert_eq!(doc.count("tokio"), 3);
        assert_eq!(doc.count("runtime"), 1);
        assert_eq!(doc.count("is"), 0);
        assert!(doc.keywords().keys().all(|k| k.len() > 2));
    }

    #[test]
    fn test_load_empty_directory() {
        let dir = TempDir::new().unwrap();
        let corpus = Corpus::load(dir.path()).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_load_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let err = Corpus::load(dir.path().join("does-not-exist")).unwrap_err();
        assert!(matches!(err, AppError::Load { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_aborts_load() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.txt", "readable content");
        // A dangling symlink with a text extension cannot be read
        std::os::unix::fs::symlink(dir.path().join("gone.txt"), dir.path().join("broken.txt")).unwrap();

        let err = Corpus::load(dir.path()).unwrap_err();
        match err {
            AppError::Load { path, .. } => assert!(path.ends_with("broken.txt")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_utf8_content_is_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("latin1.txt"), b"caf\xe9 menu items").unwrap();

        let corpus = Corpus::load(dir.path()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.documents()[0].count("menu"), 1);
    }
}
