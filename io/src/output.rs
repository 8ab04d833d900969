//! Serialization of bundled documents.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use schema_bundle_core::Node;
use serde::{Deserialize, Serialize};

use crate::error::{IoError, Result};

/// Output serialization format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// Infers the format from a file extension (`.json`, `.yaml`, `.yml`).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(IoError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        })
    }
}

/// Serializes `document`. JSON is pretty-printed; both formats end with a
/// newline and keep mapping key order.
pub fn format_document(document: &Node, format: OutputFormat) -> Result<String> {
    let mut text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)?,
        OutputFormat::Yaml => serde_yaml::to_string(document)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path("out/api.json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_path("api.YML"), Some(OutputFormat::Yaml));
        assert_eq!(OutputFormat::from_path("api.txt"), None);
        assert_eq!(OutputFormat::from_path("api"), None);
    }

    #[test]
    fn test_parse_format_name() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!(matches!(
            "toml".parse::<OutputFormat>(),
            Err(IoError::UnsupportedFormat(name)) if name == "toml"
        ));
    }

    #[test]
    fn test_yaml_output_keeps_key_order() {
        let document = json!({ "openapi": "3.0.3", "info": { "title": "T" }, "paths": {} });
        let text = format_document(&document, OutputFormat::Yaml).unwrap();
        let openapi = text.find("openapi").unwrap();
        let info = text.find("info").unwrap();
        let paths = text.find("paths").unwrap();
        assert!(openapi < info && info < paths);
    }

    #[test]
    fn test_json_output_ends_with_newline() {
        let text = format_document(&json!({ "a": 1 }), OutputFormat::Json).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}\n");
    }
}
