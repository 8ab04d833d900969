//! Reference parsing and location resolution.
//!
//! A reference string (the value of `$ref`, of an `$include` directive, or of
//! a discriminator mapping entry) is resolved against the location of the
//! document it was found in:
//!
//! - `http://…` / `https://…`: remote document, fetched over the network;
//! - `file://…`: absolute filesystem document;
//! - `#/pointer`: a pointer into the same document;
//! - anything else: a path relative to the directory of the current
//!   document (or a relative URL when the current document is remote).
//!
//! # Example
//!
//! ```
//! use schema_bundle_core::{Location, Reference};
//!
//! let base = Location::file("/project/api/root.yaml");
//! let reference = Reference::resolve("../common/Error.yaml#/Error", &base).unwrap();
//!
//! assert!(!reference.is_remote());
//! assert_eq!(reference.target(), Some(&Location::file("/project/common/Error.yaml")));
//! assert_eq!(reference.pointer(), "/Error");
//! assert_eq!(reference.canonical_key(&base), "/project/common/Error.yaml#/Error");
//! ```

use std::fmt;
use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::{BundleError, Result};

/// Absolute location of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    /// Absolute, lexically normalized filesystem path.
    File(PathBuf),
    /// Remote URL without fragment.
    Url(Url),
}

impl Location {
    /// Creates a filesystem location, made absolute against the current
    /// directory and normalized lexically (`.` and `..` removed).
    pub fn file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Location::File(normalize_path(&absolute))
    }

    /// Creates a remote location, dropping any fragment.
    pub fn url(mut url: Url) -> Self {
        url.set_fragment(None);
        Location::Url(url)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::File(path) => Some(path),
            Location::Url(_) => None,
        }
    }

    /// Resolves `relative` against the directory containing this location.
    pub fn join(&self, relative: &str) -> Result<Location> {
        match self {
            Location::File(path) => {
                let candidate = Path::new(relative);
                if candidate.is_absolute() {
                    return Ok(Location::File(normalize_path(candidate)));
                }
                let dir = path.parent().unwrap_or_else(|| Path::new("/"));
                Ok(Location::File(normalize_path(&dir.join(candidate))))
            }
            Location::Url(url) => url
                .join(relative)
                .map(Location::url)
                .map_err(|err| BundleError::unresolvable(relative, self, err.to_string())),
        }
    }

    /// Final path segment without its extension (`Error` for
    /// `/project/common/Error.yaml`).
    pub fn stem(&self) -> Option<String> {
        match self {
            Location::File(path) => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string),
            Location::Url(url) => url
                .path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                .map(|segment| match segment.rsplit_once('.') {
                    Some((stem, _)) if !stem.is_empty() => stem.to_string(),
                    _ => segment.to_string(),
                }),
        }
    }

    /// Directory segments leading to this location, innermost last, with the
    /// file stem appended. Used to build collision suffixes.
    pub fn segments(&self) -> Vec<String> {
        let mut segments: Vec<String> = match self {
            Location::File(path) => path
                .parent()
                .map(|dir| {
                    dir.components()
                        .filter_map(|c| match c {
                            Component::Normal(s) => s.to_str().map(str::to_string),
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            Location::Url(url) => {
                let mut segments: Vec<String> = url.host_str().into_iter().map(str::to_string).collect();
                if let Some(path) = url.path_segments() {
                    let path: Vec<&str> = path.filter(|s| !s.is_empty()).collect();
                    if let Some((_, dirs)) = path.split_last() {
                        segments.extend(dirs.iter().map(|s| s.to_string()));
                    }
                }
                segments
            }
        };
        if let Some(stem) = self.stem() {
            segments.push(stem);
        }
        segments
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Decomposed reference string.
///
/// `target` is `None` when the reference points into the document it was
/// found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    target: Option<Location>,
    pointer: String,
}

impl Reference {
    /// Resolves `value` found in the document at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::UnresolvableReference`] for schemes other than
    /// `http`, `https` and `file`, and for malformed URLs.
    pub fn resolve(value: &str, base: &Location) -> Result<Self> {
        let value = value.trim();

        if let Some(pointer) = value.strip_prefix('#') {
            return Ok(Self::same_document(pointer));
        }

        if let Some(scheme) = scheme_of(value) {
            let mut url = Url::parse(value)
                .map_err(|err| BundleError::unresolvable(value, base, err.to_string()))?;
            let pointer = url.fragment().unwrap_or_default().to_string();
            url.set_fragment(None);
            let target = match scheme.to_ascii_lowercase().as_str() {
                "http" | "https" => Location::Url(url),
                "file" => {
                    let path = url.to_file_path().map_err(|()| {
                        BundleError::unresolvable(value, base, "invalid file URL")
                    })?;
                    Location::File(normalize_path(&path))
                }
                other => {
                    return Err(BundleError::unresolvable(
                        value,
                        base,
                        format!("unsupported scheme '{other}'"),
                    ));
                }
            };
            return Ok(Self::to(target, pointer, base));
        }

        let (path, pointer) = value.split_once('#').unwrap_or((value, ""));
        if path.is_empty() {
            return Ok(Self::same_document(pointer));
        }
        let target = base.join(path)?;
        Ok(Self::to(target, pointer.to_string(), base))
    }

    fn same_document(pointer: &str) -> Self {
        Self {
            target: None,
            pointer: pointer.to_string(),
        }
    }

    fn to(target: Location, pointer: String, base: &Location) -> Self {
        if &target == base {
            return Self {
                target: None,
                pointer,
            };
        }
        Self {
            target: Some(target),
            pointer,
        }
    }

    /// Same pointer into a different document.
    pub fn with_target(&self, target: Location) -> Self {
        Self {
            target: Some(target),
            pointer: self.pointer.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.target.as_ref().is_some_and(Location::is_remote)
    }

    pub fn is_same_document(&self) -> bool {
        self.target.is_none()
    }

    pub fn target(&self) -> Option<&Location> {
        self.target.as_ref()
    }

    /// JSON pointer inside the target, possibly empty (whole document).
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// The document this reference points into, given the document it was
    /// found in.
    pub fn location<'a>(&'a self, current: &'a Location) -> &'a Location {
        self.target.as_ref().unwrap_or(current)
    }

    /// Globally unique identity of the referenced content:
    /// `<absolute location>#<pointer>`.
    pub fn canonical_key(&self, current: &Location) -> String {
        format!("{}#{}", self.location(current), self.pointer)
    }

    /// Last meaningful identifier of the target: the final pointer segment
    /// when a pointer is present, else the document's file stem.
    pub fn terminal_name(&self, current: &Location) -> String {
        self.pointer
            .rsplit('/')
            .find(|s| !s.is_empty())
            .map(|s| s.replace("~1", "/").replace("~0", "~"))
            .or_else(|| self.location(current).stem())
            .unwrap_or_else(|| "Component".to_string())
    }
}

/// Returns the scheme of `value` when it looks like `scheme://…`.
fn scheme_of(value: &str) -> Option<&str> {
    let (scheme, _) = value.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
