//! Narrow interfaces to the outside world.
//!
//! The merge engine never touches the filesystem or the network itself. It
//! asks a [`DocumentLoader`] for parsed trees, a [`ContentFetcher`] for
//! remote text and a [`GlobExpander`] for pattern matches. The
//! `schema-bundle-io` crate provides the real implementations; tests use
//! in-memory ones.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::SourceError;
use crate::node::Node;

/// Reads and parses structured documents.
pub trait DocumentLoader {
    /// Loads and parses the document at `path`.
    fn load(&self, path: &Path) -> Result<Node, SourceError>;

    /// Parses document text obtained elsewhere (e.g. fetched remotely).
    /// `origin` is the document's location, usable as a format hint.
    fn parse(&self, text: &str, origin: &str) -> Result<Node, SourceError>;
}

/// Fetches the raw text of a remote document.
pub trait ContentFetcher {
    fn fetch(&self, url: &Url) -> Result<String, SourceError>;
}

/// Expands a filesystem glob pattern.
pub trait GlobExpander {
    /// Returns matching paths in a stable order; an empty list is not an
    /// error.
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, SourceError>;
}

/// The collaborators used by one merge.
#[derive(Clone, Copy)]
pub struct Sources<'a> {
    pub loader: &'a dyn DocumentLoader,
    pub fetcher: &'a dyn ContentFetcher,
    pub glob: &'a dyn GlobExpander,
}

impl<'a> Sources<'a> {
    pub fn new(
        loader: &'a dyn DocumentLoader,
        fetcher: &'a dyn ContentFetcher,
        glob: &'a dyn GlobExpander,
    ) -> Self {
        Self {
            loader,
            fetcher,
            glob,
        }
    }
}

/// Returns `true` if `pattern` contains glob metacharacters.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory collaborators for engine tests.

    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use super::*;

    /// Documents keyed by absolute path or URL string.
    #[derive(Default)]
    pub struct MemorySources {
        pub documents: BTreeMap<String, Node>,
        pub loads: RefCell<Vec<String>>,
    }

    impl MemorySources {
        pub fn with(mut self, location: &str, document: Node) -> Self {
            self.documents.insert(location.to_string(), document);
            self
        }

        pub fn sources(&self) -> Sources<'_> {
            Sources::new(self, self, self)
        }

        pub fn load_count(&self, location: &str) -> usize {
            self.loads.borrow().iter().filter(|l| *l == location).count()
        }
    }

    impl DocumentLoader for MemorySources {
        fn load(&self, path: &Path) -> Result<Node, SourceError> {
            let key = path.display().to_string();
            self.loads.borrow_mut().push(key.clone());
            self.documents
                .get(&key)
                .cloned()
                .ok_or_else(|| format!("no such document: {key}").into())
        }

        fn parse(&self, text: &str, _origin: &str) -> Result<Node, SourceError> {
            Ok(serde_json::from_str(text)?)
        }
    }

    impl ContentFetcher for MemorySources {
        fn fetch(&self, url: &Url) -> Result<String, SourceError> {
            self.loads.borrow_mut().push(url.to_string());
            let document = self
                .documents
                .get(url.as_str())
                .ok_or_else(|| format!("404 Not Found: {url}"))?;
            Ok(serde_json::to_string(document)?)
        }
    }

    impl GlobExpander for MemorySources {
        fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, SourceError> {
            // Only `*` within the last path segment, which is all the tests use.
            let (dir, file_pattern) = pattern.rsplit_once('/').unwrap_or(("", pattern));
            let (prefix, suffix) = file_pattern.split_once('*').unwrap_or((file_pattern, ""));
            Ok(self
                .documents
                .keys()
                .filter_map(|key| {
                    let (key_dir, name) = key.rsplit_once('/')?;
                    let matches = key_dir == dir
                        && name.len() >= prefix.len() + suffix.len()
                        && name.starts_with(prefix)
                        && name.ends_with(suffix);
                    matches.then(|| PathBuf::from(key))
                })
                .collect())
        }
    }
}
