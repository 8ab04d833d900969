//! Error types for bundling operations.
//!
//! Every failure aborts the whole merge. There is no partial result: the
//! caller either gets a fully bundled document or one of these errors.

use thiserror::Error;

/// Boxed error returned by the external collaborators
/// ([`DocumentLoader`](crate::DocumentLoader),
/// [`ContentFetcher`](crate::ContentFetcher),
/// [`GlobExpander`](crate::GlobExpander)).
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while bundling a document.
#[derive(Debug, Error)]
pub enum BundleError {
    /// A source file could not be read or is not valid structured data.
    #[error("failed to load '{location}': {source}")]
    Load {
        location: String,
        #[source]
        source: SourceError,
    },

    /// A remote document could not be fetched.
    #[error("failed to fetch '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: SourceError,
    },

    /// An inclusion produced a sequence (or scalar) inside a mapping that
    /// has other keys, so there is nothing sensible to merge it into.
    #[error("cannot merge a non-mapping inclusion into a mapping with other keys at {path}")]
    StructuralMerge { path: String },

    /// A reference target cannot be classified, located, or matched.
    #[error("unresolvable reference '{reference}' in '{location}': {reason}")]
    UnresolvableReference {
        reference: String,
        location: String,
        reason: String,
    },

    /// The key filter suffix of an inclusion directive is not a valid regex.
    #[error("invalid key filter '{pattern}': {source}")]
    InvalidKeyFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Inlined content includes itself, directly or through other files.
    #[error("inclusion cycle detected: {0}")]
    InclusionCycle(String),
}

impl BundleError {
    pub(crate) fn unresolvable(
        reference: impl Into<String>,
        location: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvableReference {
            reference: reference.into(),
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for results with [`BundleError`].
pub type Result<T> = std::result::Result<T, BundleError>;
