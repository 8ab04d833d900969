//! Filesystem glob expansion for `$include` targets.

use std::path::PathBuf;

use schema_bundle_core::{GlobExpander, SourceError};
use tracing::debug;

/// Expands patterns with the `glob` crate. Only regular files match, in
/// sorted path order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsGlobExpander;

impl GlobExpander for FsGlobExpander {
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, SourceError> {
        let mut matches = Vec::new();
        for entry in glob::glob(pattern)? {
            let path = entry?;
            if path.is_file() {
                matches.push(path);
            }
        }
        matches.sort();
        debug!(pattern, matches = matches.len(), "Expanded glob");
        Ok(matches)
    }
}
