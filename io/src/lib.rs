//! Filesystem, HTTP and configuration plumbing for `schema-bundle`.
//!
//! Provides the concrete collaborators the merge engine in
//! `schema-bundle-core` talks to, plus the glue to run a bundle from disk:
//!
//! - [`FsDocumentLoader`]: reads YAML or JSON files.
//! - [`HttpFetcher`] (feature `remote`) / [`OfflineFetcher`]: remote
//!   references.
//! - [`FsGlobExpander`]: `$include` glob targets.
//! - [`BundleConfig`]: `.schema-bundle.yml`.
//! - [`Bundler`]: loads a root file, merges it and writes the result.
//!
//! # Quick start
//!
//! ```no_run
//! use schema_bundle_io::{BundleConfig, Bundler, OutputFormat};
//!
//! let config = BundleConfig::load_or_default(".schema-bundle.yml").unwrap();
//! let bundler = Bundler::new(config).unwrap();
//! let bundled = bundler.bundle_file("api/openapi.yaml").unwrap();
//! bundler.write(&bundled, None, Some(OutputFormat::Json)).unwrap();
//! ```
//!
//! # Feature flags
//!
//! - **`remote`** (default): fetch `http(s)://` references with a blocking
//!   `reqwest` client. Without it every remote reference fails the bundle.

mod bundle;
mod config;
mod error;
mod expand;
mod fetch;
mod loader;
mod output;

pub use bundle::Bundler;
pub use config::{BundleConfig, CONFIG_FILE, OutputConfig, RemoteConfig};
pub use error::{IoError, Result};
pub use expand::FsGlobExpander;
#[cfg(feature = "remote")]
pub use fetch::HttpFetcher;
pub use fetch::{DEFAULT_TIMEOUT, OfflineFetcher};
pub use loader::{FsDocumentLoader, parse_text};
pub use output::{OutputFormat, format_document};
