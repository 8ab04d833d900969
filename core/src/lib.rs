//! Merge engine for multi-file schema documents.
//!
//! This crate turns an OpenAPI-style document whose nodes point at other
//! files or URLs into one self-contained document:
//!
//! - [`Reference`] / [`Location`]: parse `$ref`-style strings and resolve
//!   them against the document they were found in.
//! - [`classify_context`]: decides whether a reference at a given
//!   [`JsonPath`] becomes a shared component or is inlined.
//! - [`ComponentManager`]: per-pass registry with at most one
//!   [`Component`] per `(kind, canonical key)`.
//! - [`ComponentNameResolver`]: deterministic, collision-free names.
//! - [`MergeEngine`]: the two-pass walk (discover, name, materialize) that
//!   also expands [`InclusionDirective`]s and discriminator mappings.
//! - [`validate_bundle`]: checks that a result is self-contained.
//!
//! All I/O goes through the [`DocumentLoader`], [`ContentFetcher`] and
//! [`GlobExpander`] traits; `schema-bundle-io` provides filesystem and HTTP
//! implementations.
//!
//! # Example
//!
//! ```
//! use std::path::{Path, PathBuf};
//!
//! use schema_bundle_core::{
//!     ContentFetcher, DocumentLoader, GlobExpander, Location, Node, SourceError, Sources, merge,
//!     validate_bundle,
//! };
//! use serde_json::json;
//!
//! struct Fixture;
//!
//! impl DocumentLoader for Fixture {
//!     fn load(&self, path: &Path) -> Result<Node, SourceError> {
//!         match path.to_str() {
//!             Some("/api/Error.yaml") => Ok(json!({ "type": "object" })),
//!             _ => Err(format!("not found: {}", path.display()).into()),
//!         }
//!     }
//!
//!     fn parse(&self, text: &str, _origin: &str) -> Result<Node, SourceError> {
//!         Ok(serde_json::from_str(text)?)
//!     }
//! }
//!
//! impl ContentFetcher for Fixture {
//!     fn fetch(&self, url: &url::Url) -> Result<String, SourceError> {
//!         Err(format!("offline: {url}").into())
//!     }
//! }
//!
//! impl GlobExpander for Fixture {
//!     fn expand(&self, _pattern: &str) -> Result<Vec<PathBuf>, SourceError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let document = json!({
//!     "components": { "responses": { "Failed": {
//!         "description": "failure",
//!         "content": { "application/json": { "schema": { "$ref": "./Error.yaml" } } }
//!     } } }
//! });
//!
//! let bundled = merge(&document, &Location::file("/api/root.yaml"), Sources::new(&Fixture, &Fixture, &Fixture)).unwrap();
//! assert_eq!(bundled["components"]["schemas"]["Error"], json!({ "type": "object" }));
//! assert!(validate_bundle(&bundled).is_empty());
//! ```

mod component;
mod context;
mod engine;
mod error;
mod include;
mod naming;
mod node;
mod reference;
mod sources;
mod validate;

pub use component::{Component, ComponentId, ComponentKind, ComponentManager};
pub use context::{Context, classify_context};
pub use engine::{COMPONENTS_SECTION, ComponentSummary, MergeEngine, Mode, REF_KEY, merge};
pub use error::{BundleError, Result, SourceError};
pub use include::{INCLUDE_KEY, InclusionDirective};
pub use naming::{ComponentNameResolver, ResolvedNames, sanitize_name};
pub use node::{JsonPath, MergeStrategy, Node, Segment, deep_merge, navigate};
pub use reference::{Location, Reference};
pub use sources::{ContentFetcher, DocumentLoader, GlobExpander, Sources, is_glob};
pub use validate::{ExternalRef, RefSite, ValidationError, find_external_refs, validate_bundle};
