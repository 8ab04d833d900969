//! Document tree helpers: positional paths, pointer lookup and deep merge.
//!
//! Documents are plain [`serde_json::Value`] trees (built with
//! `preserve_order`, so mapping keys keep their source order). Nothing in
//! this crate mutates an input tree in place; every transformation builds a
//! new tree.
//!
//! # Example
//!
//! ```
//! use schema_bundle_core::{MergeStrategy, deep_merge};
//! use serde_json::json;
//!
//! let base = json!({ "schemas": { "Pet": { "type": "object" } } });
//! let overlay = json!({ "schemas": { "Error": { "type": "object" } } });
//!
//! let merged = deep_merge(&base, &overlay, MergeStrategy::PreferOverlay);
//! assert!(merged["schemas"].get("Pet").is_some());
//! assert!(merged["schemas"].get("Error").is_some());
//! ```

use std::fmt;

use serde_json::Value;

/// A (sub)document: ordered mapping, sequence, or scalar.
pub type Node = Value;

/// One step in a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

impl Segment {
    /// Returns the key if this segment addresses a mapping entry.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(key) => Some(key),
            Segment::Index(_) => None,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }
}

/// Position of a node inside the (bundled) document tree.
///
/// Only used to decide whether a reference found at that position becomes a
/// shared component or gets inlined, and for diagnostics.
///
/// ```
/// use schema_bundle_core::JsonPath;
///
/// let path = JsonPath::root().key("paths").key("/pets").key("get").key("parameters").index(0);
/// assert_eq!(path.to_string(), "$.paths./pets.get.parameters[0]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from plain mapping keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: keys.into_iter().map(|k| Segment::Key(k.into())).collect(),
        }
    }

    /// Returns a child path addressing mapping key `key`.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.segments.push(Segment::Key(key.into()));
        child
    }

    /// Returns a child path addressing sequence index `index`.
    pub fn index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.segments.push(Segment::Index(index));
        child
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the last `n` segments, or `None` if the path is shorter.
    pub fn tail(&self, n: usize) -> Option<&[Segment]> {
        self.segments
            .len()
            .checked_sub(n)
            .map(|start| &self.segments[start..])
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Looks up the sub-tree addressed by a JSON pointer.
///
/// An empty pointer addresses the whole document; `/` addresses the key
/// `""`. A pointer
/// without the leading slash is accepted (`definitions/Pet`). Escapes
/// (`~0`, `~1`) are honored.
///
/// ```
/// use schema_bundle_core::navigate;
/// use serde_json::json;
///
/// let doc = json!({ "components": { "schemas": { "a/b": { "type": "string" } } } });
/// assert_eq!(navigate(&doc, "/components/schemas/a~1b"), Some(&json!({ "type": "string" })));
/// assert_eq!(navigate(&doc, ""), Some(&doc));
/// assert!(navigate(&doc, "/missing").is_none());
/// ```
pub fn navigate<'a>(node: &'a Node, pointer: &str) -> Option<&'a Node> {
    match pointer {
        "" => Some(node),
        p if p.starts_with('/') => node.pointer(p),
        p => node.pointer(&format!("/{p}")),
    }
}

/// Deep merge behavior.
///
/// Mappings are always merged key by key. The strategy only decides which
/// side wins when both sides hold a non-mapping value under the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Keep base values when conflicts occur.
    PreferBase,
    /// Keep overlay values when conflicts occur.
    PreferOverlay,
}

/// Merges two trees into a new tree.
///
/// Keys present only in `base` keep their position; keys only in `overlay`
/// are appended in overlay order.
pub fn deep_merge(base: &Node, overlay: &Node, strategy: MergeStrategy) -> Node {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let value = match base_map.get(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value, strategy),
                    None => overlay_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        (Value::Null, other) | (other, Value::Null) => other.clone(),
        _ => match strategy {
            MergeStrategy::PreferBase => base.clone(),
            MergeStrategy::PreferOverlay => overlay.clone(),
        },
    }
}
