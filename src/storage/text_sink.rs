//! Append-only text artifact
//!
//! Every extracted document becomes one human-readable record:
//!
//! ```text
//!
//! ================================================================================
//! URL: https://example.org/docs
//! Type: html
//! Extracted at: 2024-05-01T12:00:00+00:00
//!
//! ================================================================================
//! <text>
//!
//! ```

use crate::state::ContentKind;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Width of the `=` rule framing each record header
pub const SEPARATOR_WIDTH: usize = 80;

/// Errors raised while writing the text artifact
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write text artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Append-only accumulation of extracted text keyed by source URL
pub trait TextSink {
    /// Appends one record
    ///
    /// Returns `Ok(false)` without touching the artifact when `text` is empty
    /// or whitespace-only.
    fn append(&mut self, url: &str, text: &str, kind: ContentKind) -> Result<bool, SinkError>;

    /// Current size of the artifact in bytes (0 if it does not exist yet)
    fn size_bytes(&self) -> u64;
}

/// Text sink writing to a file on disk
#[derive(Debug, Clone)]
pub struct FileTextSink {
    path: PathBuf,
}

impl FileTextSink {
    /// Creates a sink for `path`; the file is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counts the records currently in the artifact
    pub fn entry_count(&self) -> usize {
        fs::read_to_string(&self.path)
            .map(|content| count_entries(&content))
            .unwrap_or(0)
    }

    fn write_err(&self, source: std::io::Error) -> SinkError {
        SinkError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl TextSink for FileTextSink {
    fn append(&mut self, url: &str, text: &str, kind: ContentKind) -> Result<bool, SinkError> {
        let body = text.trim();
        if body.is_empty() {
            tracing::warn!("Empty text for {}, nothing appended", url);
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
            }
        }

        let record = format_record(url, body, kind);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_err(e))?;
        file.write_all(record.as_bytes())
            .map_err(|e| self.write_err(e))?;

        tracing::debug!("Appended {} characters from {}", body.chars().count(), url);
        Ok(true)
    }

    fn size_bytes(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

/// Renders one delimited record
pub fn format_record(url: &str, text: &str, kind: ContentKind) -> String {
    let separator = format!("\n{}\n", "=".repeat(SEPARATOR_WIDTH));
    format!(
        "{sep}URL: {url}\nType: {kind}\nExtracted at: {at}\n{sep}{body}\n\n",
        sep = separator,
        url = url,
        kind = kind,
        at = Utc::now().to_rfc3339(),
        body = text.trim(),
    )
}

/// Counts records in artifact content by their `URL:`/`Type:` header lines
pub fn count_entries(content: &str) -> usize {
    let rule = "=".repeat(SEPARATOR_WIDTH);
    let lines: Vec<&str> = content.lines().collect();
    lines
        .windows(3)
        .filter(|w| w[0] == rule && w[1].starts_with("URL: ") && w[2].starts_with("Type: "))
        .count()
}
