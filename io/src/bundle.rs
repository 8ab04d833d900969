//! End-to-end bundling of a root file.

use std::path::Path;

use schema_bundle_core::{
    ComponentSummary, ContentFetcher, Location, MergeEngine, Node, Sources,
};
use tracing::info;

use crate::config::BundleConfig;
use crate::error::Result;
use crate::expand::FsGlobExpander;
use crate::fetch::OfflineFetcher;
use crate::loader::FsDocumentLoader;
use crate::output::{OutputFormat, format_document};

/// Bundles documents from disk using the filesystem collaborators and, when
/// enabled, HTTP for remote references.
///
/// ```no_run
/// use schema_bundle_io::{BundleConfig, Bundler};
///
/// let bundler = Bundler::new(BundleConfig::default()).unwrap();
/// let bundled = bundler.bundle_file("api/openapi.yaml").unwrap();
/// bundler.write(&bundled, Some("dist/openapi.json".as_ref()), None).unwrap();
/// ```
pub struct Bundler {
    config: BundleConfig,
    loader: FsDocumentLoader,
    globs: FsGlobExpander,
    fetcher: Box<dyn ContentFetcher>,
}

impl Bundler {
    /// Creates a bundler for `config`.
    ///
    /// # Errors
    ///
    /// Fails if remote references are enabled and the HTTP client cannot be
    /// built.
    pub fn new(config: BundleConfig) -> Result<Self> {
        let fetcher = remote_fetcher(&config)?;
        Ok(Self {
            config,
            loader: FsDocumentLoader::new(),
            globs: FsGlobExpander,
            fetcher,
        })
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    fn sources(&self) -> Sources<'_> {
        Sources::new(&self.loader, self.fetcher.as_ref(), &self.globs)
    }

    /// Loads the root document at `path` and returns the bundled document.
    ///
    /// # Errors
    ///
    /// Returns an I/O or parse error for the root file, or
    /// [`IoError::Bundle`](crate::IoError::Bundle) for any failure inside
    /// the merge.
    pub fn bundle_file(&self, path: impl AsRef<Path>) -> Result<Node> {
        let path = path.as_ref();
        let document = self.loader.read(path)?;
        let bundled = MergeEngine::new(self.sources()).merge(&document, &Location::file(path))?;
        info!(path = %path.display(), "Bundled document");
        Ok(bundled)
    }

    /// Lists the components a bundle of `path` would contain.
    pub fn components(&self, path: impl AsRef<Path>) -> Result<Vec<ComponentSummary>> {
        let path = path.as_ref();
        let document = self.loader.read(path)?;
        Ok(MergeEngine::new(self.sources()).discover(&document, &Location::file(path))?)
    }

    /// Picks the output format: `explicit`, else the output file's
    /// extension, else the configured default.
    pub fn output_format(&self, output: Option<&Path>, explicit: Option<OutputFormat>) -> OutputFormat {
        explicit
            .or_else(|| output.and_then(OutputFormat::from_path))
            .unwrap_or(self.config.output.format)
    }

    /// Serializes `document` to `output`, or to stdout when `None`.
    pub fn write(&self, document: &Node, output: Option<&Path>, format: Option<OutputFormat>) -> Result<()> {
        let text = format_document(document, self.output_format(output, format))?;
        match output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, text)?;
                info!(path = %path.display(), "Wrote bundle");
            }
            None => {
                use std::io::Write;
                std::io::stdout().lock().write_all(text.as_bytes())?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "remote")]
fn remote_fetcher(config: &BundleConfig) -> Result<Box<dyn ContentFetcher>> {
    if config.remote.enabled {
        let fetcher = crate::fetch::HttpFetcher::new(config.remote.timeout())?;
        return Ok(Box::new(fetcher));
    }
    Ok(Box::new(OfflineFetcher))
}

#[cfg(not(feature = "remote"))]
fn remote_fetcher(config: &BundleConfig) -> Result<Box<dyn ContentFetcher>> {
    if config.remote.enabled {
        tracing::warn!("Remote references requested but the `remote` feature is disabled");
    }
    Ok(Box::new(OfflineFetcher))
}
