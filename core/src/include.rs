//! The `$include` directive.
//!
//! An inclusion is a mapping key of the form
//!
//! ```text
//! $include[#<fragment>][.<key-filter>]: <target>
//! ```
//!
//! where `<target>` is a file path (possibly a glob), a URL or a same-document
//! pointer. The directive is replaced by the target's merged content: a
//! mapping is spliced into the surrounding mapping (keeping only keys that
//! match `<key-filter>`, a regular expression), a sequence replaces the
//! surrounding mapping or is flattened into the enclosing sequence.
//!
//! ```yaml
//! paths:
//!   $include: ./paths/*.yaml          # one key per file
//! components:
//!   schemas:
//!     $include#/components/schemas.^Pet: ./petstore.yaml
//! ```
//!
//! The fragment may not contain `.`, since the first dot starts the filter.

use regex::Regex;
use serde_json::Value;

use crate::error::{BundleError, Result};
use crate::node::Node;

/// Key prefix that marks an inclusion directive.
pub const INCLUDE_KEY: &str = "$include";

/// Parsed form of an `$include…` key.
#[derive(Debug, Clone)]
pub struct InclusionDirective {
    fragment: Option<String>,
    key_filter: Option<Regex>,
}

impl InclusionDirective {
    /// Returns `true` if `key` uses the directive syntax.
    pub fn is_directive(key: &str) -> bool {
        split_key(key).is_some()
    }

    /// Parses a mapping key. Returns `Ok(None)` for ordinary keys.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::InvalidKeyFilter`] if the filter suffix is not
    /// a valid regular expression.
    ///
    /// ```
    /// use schema_bundle_core::InclusionDirective;
    ///
    /// let directive = InclusionDirective::parse("$include#/definitions.^Pet").unwrap().unwrap();
    /// assert_eq!(directive.fragment(), Some("/definitions"));
    /// assert!(directive.matches_key("PetOwner"));
    /// assert!(!directive.matches_key("Order"));
    ///
    /// assert!(InclusionDirective::parse("$included").unwrap().is_none());
    /// ```
    pub fn parse(key: &str) -> Result<Option<Self>> {
        let Some((fragment, filter)) = split_key(key) else {
            return Ok(None);
        };
        let key_filter = filter
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| BundleError::InvalidKeyFilter {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;
        Ok(Some(Self {
            fragment: fragment.map(|f| {
                if f.is_empty() || f.starts_with('/') {
                    f.to_string()
                } else {
                    format!("/{f}")
                }
            }),
            key_filter,
        }))
    }

    /// Pointer applied to the target document before merging, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn matches_key(&self, key: &str) -> bool {
        self.key_filter.as_ref().is_none_or(|re| re.is_match(key))
    }

    /// Drops the keys of a mapping result that do not match the key filter.
    /// Non-mapping results are returned unchanged.
    pub fn filter(&self, node: Node) -> Node {
        match node {
            Value::Object(map) if self.key_filter.is_some() => Value::Object(
                map.into_iter()
                    .filter(|(key, _)| self.matches_key(key))
                    .collect(),
            ),
            other => other,
        }
    }
}

/// Splits `$include#frag.filter` into its optional parts.
fn split_key(key: &str) -> Option<(Option<&str>, Option<&str>)> {
    let rest = key.strip_prefix(INCLUDE_KEY)?;
    let (fragment, filter) = match rest.strip_prefix('#') {
        Some(after) => match after.split_once('.') {
            Some((fragment, filter)) => (Some(fragment), Some(filter)),
            None => (Some(after), None),
        },
        None => match rest.strip_prefix('.') {
            Some(filter) => (None, Some(filter)),
            None if rest.is_empty() => (None, None),
            None => return None,
        },
    };
    Some((fragment, filter.filter(|f| !f.is_empty())))
}
