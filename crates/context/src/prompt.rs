//! Prompt templates and debug prompt persistence
//!
//! A template is plain UTF-8 text with exactly two `%s` slots. The first slot
//! receives the document content, the second the question.

use chrono::Local;
use docchat_common::errors::{AppError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Substitution marker
pub const SLOT: &str = "%s";

/// A parsed two-slot prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    head: String,
    middle: String,
    tail: String,
}

impl PromptTemplate {
    /// Parse template text, requiring exactly two slots
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split(SLOT).collect();
        match parts.as_slice() {
            [head, middle, tail] => Ok(Self {
                head: head.to_string(),
                middle: middle.to_string(),
                tail: tail.to_string(),
            }),
            _ => Err(AppError::Template {
                message: format!(
                    "expected exactly 2 '{}' slots, found {}",
                    SLOT,
                    parts.len() - 1
                ),
            }),
        }
    }

    /// Read and parse a template file
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| AppError::Template {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::parse(&text)
    }

    /// Substitute the document, then the question.
    ///
    /// Inserted text is never re-scanned, so a document containing `%s` is safe.
    pub fn render(&self, document: &str, question: &str) -> String {
        let mut prompt = String::with_capacity(
            self.head.len() + document.len() + self.middle.len() + question.len() + self.tail.len(),
        );
        prompt.push_str(&self.head);
        prompt.push_str(document);
        prompt.push_str(&self.middle);
        prompt.push_str(question);
        prompt.push_str(&self.tail);
        prompt
    }
}

/// Writes every rendered prompt to its own timestamped file
#[derive(Debug, Clone)]
pub struct DebugPromptWriter {
    dir: PathBuf,
}

impl DebugPromptWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist `prompt` as `prompt_YYYYMMDD_HHMMSS.txt`.
    ///
    /// Generation must not start unless this succeeds. Two prompts in the same
    /// second share a file name; the later one wins.
    pub async fn persist(&self, prompt: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| AppError::Persist {
            message: format!("error creating debug directory {}: {}", self.dir.display(), e),
        })?;

        let path = self.dir.join(file_name_for(Local::now()));
        tokio::fs::write(&path, prompt).await.map_err(|e| AppError::Persist {
            message: format!("{}: {}", path.display(), e),
        })?;

        debug!(path = %path.display(), bytes = prompt.len(), "Prompt saved");
        Ok(path)
    }
}

fn file_name_for(now: chrono::DateTime<Local>) -> String {
    format!("prompt_{}.txt", now.format("%Y%m%d_%H%M%S"))
}
