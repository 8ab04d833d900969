//! Bundle validation.
//!
//! Checks that a document is self-contained: no reference, inclusion
//! directive or discriminator mapping points at another location, and every
//! same-document pointer lands on an existing node. A successful
//! [`merge`](crate::merge) always produces a document that passes.
//!
//! # Examples
//!
//! ```
//! use schema_bundle_core::*;
//! use serde_json::json;
//!
//! let bundled = json!({
//!     "paths": { "/pets": { "get": { "responses": { "200": {
//!         "description": "ok",
//!         "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
//!     } } } } },
//!     "components": { "schemas": { "Pet": { "type": "object" } } }
//! });
//! assert!(validate_bundle(&bundled).is_empty());
//!
//! let unbundled = json!({ "schema": { "$ref": "./Pet.yaml" } });
//! assert_eq!(find_external_refs(&unbundled).len(), 1);
//! ```

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::engine::REF_KEY;
use crate::include::InclusionDirective;
use crate::node::{JsonPath, Node, navigate};

/// Where a cross-location pointer was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSite {
    /// A `$ref` value.
    Reference,
    /// An `$include` directive.
    Inclusion,
    /// A `discriminator.mapping` entry.
    Mapping,
}

impl fmt::Display for RefSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefSite::Reference => "$ref",
            RefSite::Inclusion => "$include",
            RefSite::Mapping => "discriminator mapping",
        })
    }
}

/// A pointer to content outside the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRef {
    pub path: String,
    pub site: RefSite,
    pub target: String,
}

/// Bundle validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Content still points at another file or URL.
    #[error("external {site} at {path}: {target}")]
    ExternalReference {
        path: String,
        site: RefSite,
        target: String,
    },
    /// A same-document pointer does not resolve.
    #[error("dangling reference at {path}: {target}")]
    DanglingReference { path: String, target: String },
}

/// Lists every reference, inclusion and mapping target that leaves the
/// document, in document order.
pub fn find_external_refs(node: &Node) -> Vec<ExternalRef> {
    let mut found = Vec::new();
    walk(node, &JsonPath::root(), &mut |path, site, target| {
        if !target.starts_with('#') {
            found.push(ExternalRef {
                path: path.to_string(),
                site,
                target: target.to_string(),
            });
        }
    });
    found
}

/// Validates a bundled document.
///
/// Reports external pointers first, then same-document pointers that do
/// not resolve against `node`.
pub fn validate_bundle(node: &Node) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = find_external_refs(node)
        .into_iter()
        .map(|external| ValidationError::ExternalReference {
            path: external.path,
            site: external.site,
            target: external.target,
        })
        .collect();

    walk(node, &JsonPath::root(), &mut |path, _, target| {
        if let Some(pointer) = target.strip_prefix('#') {
            if navigate(node, pointer).is_none() {
                errors.push(ValidationError::DanglingReference {
                    path: path.to_string(),
                    target: target.to_string(),
                });
            }
        }
    });

    errors
}

fn walk(node: &Node, path: &JsonPath, visit: &mut dyn FnMut(&JsonPath, RefSite, &str)) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                let child = path.key(key.as_str());
                match value {
                    Value::String(target) if key == REF_KEY => {
                        visit(&child, RefSite::Reference, target);
                    }
                    Value::String(target) if InclusionDirective::is_directive(key) => {
                        visit(&child, RefSite::Inclusion, target);
                    }
                    _ => {}
                }
                if key == "discriminator" {
                    if let Some(mapping) = value.get("mapping").and_then(Value::as_object) {
                        for (tag, target) in mapping {
                            // Bare schema names are not pointers.
                            if let Some(target) = target.as_str().filter(|t| t.contains(['#', '/', '.'])) {
                                visit(&child.key("mapping").key(tag.as_str()), RefSite::Mapping, target);
                            }
                        }
                    }
                }
                walk(value, &child, visit);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(item, &path.index(index), visit);
            }
        }
        _ => {}
    }
}
