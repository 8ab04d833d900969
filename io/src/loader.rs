//! Filesystem document loading.
//!
//! Files ending in `.json` are parsed with `serde_json`; everything else is
//! parsed as YAML, which also accepts JSON text.

use std::path::Path;

use schema_bundle_core::{DocumentLoader, Node, SourceError};
use tracing::debug;

use crate::error::Result;

/// Loads YAML and JSON documents from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDocumentLoader;

impl FsDocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Reads and parses the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::IoError::IoError) if the file cannot be
    /// read, or a JSON/YAML error if parsing fails.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Node> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = text.len(), "Read document");
        parse_text(&text, &path.to_string_lossy())
    }
}

impl DocumentLoader for FsDocumentLoader {
    fn load(&self, path: &Path) -> std::result::Result<Node, SourceError> {
        Ok(self.read(path)?)
    }

    fn parse(&self, text: &str, origin: &str) -> std::result::Result<Node, SourceError> {
        Ok(parse_text(text, origin)?)
    }
}

/// Parses `text`, choosing the format from the extension of `origin`.
pub fn parse_text(text: &str, origin: &str) -> Result<Node> {
    if is_json(origin) {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(serde_yaml::from_str(text)?)
    }
}

fn is_json(origin: &str) -> bool {
    // Strip URL query/fragment before looking at the extension.
    let origin = origin.split(['?', '#']).next().unwrap_or(origin);
    Path::new(origin)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
