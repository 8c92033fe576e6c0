//! Dependency configuration files.
//!
//! A configuration lists each package with the packages it may read, plus the
//! whitelist patterns and builtin roots exempt from checking:
//!
//! ```json
//! {
//!   "packages": [
//!     { "name": "com.example.service", "reads": ["com.example.persistence"] },
//!     { "name": "com.example.persistence" }
//!   ],
//!   "whitelisted": ["com.vendor.*"],
//!   "builtin_roots": ["java.lang"]
//! }
//! ```
//!
//! JSON is the default; files ending in `.yaml` or `.yml` are read as YAML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::model::PackageDependencies;
use crate::pattern::PackagePattern;

/// On-disk configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Declared packages
    pub packages: Vec<PackageConfig>,
    /// Whitelist patterns
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub whitelisted: Vec<String>,
    /// Implicit namespaces of the host language
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub builtin_roots: Vec<String>,
}

/// One declared package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Fully-qualified package name
    pub name: String,
    /// Packages this one may read
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reads: Vec<String>,
}

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON
    Json,
    /// YAML
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from a file extension, defaulting to JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

impl ConfigFile {
    /// Parse configuration text.
    ///
    /// # Errors
    ///
    /// Returns a JSON or YAML error if the document is malformed.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config = match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(config)
    }

    /// Build the dependency model described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for unparsable whitelist patterns or a package
    /// declared more than once.
    pub fn to_model(&self) -> Result<PackageDependencies> {
        let mut builder = PackageDependencies::builder();

        for package in &self.packages {
            builder = builder.package(package.name.as_str(), package.reads.iter().map(String::as_str));
        }
        for pattern in &self.whitelisted {
            builder = builder.whitelist(PackagePattern::parse(pattern)?);
        }
        for root in &self.builtin_roots {
            builder = builder.builtin_root(root.as_str());
        }

        builder.build()
    }

    /// Pretty-printed JSON rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Load a configuration file.
///
/// Returns `Ok(None)` when the file does not exist, which callers treat as a
/// missing configuration rather than an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        info!(path = %path.display(), "No dependency configuration found");
        return Ok(None);
    }

    let format = ConfigFormat::from_path(path);
    debug!(path = %path.display(), ?format, "Loading dependency configuration");

    let content = fs::read_to_string(path)?;
    ConfigFile::parse(&content, format).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rstest::rstest;

    const JSON: &str = r#"{
        "packages": [
            { "name": "a", "reads": ["b"] },
            { "name": "b" }
        ],
        "whitelisted": ["com.vendor.*"],
        "builtin_roots": ["java.lang"]
    }"#;

    #[test]
    fn parses_json_with_optional_reads() {
        let config = ConfigFile::parse(JSON, ConfigFormat::Json).expect("config should parse");

        assert_eq!(config.packages.len(), 2);
        assert_eq!(config.packages[0].reads, vec!["b".to_string()]);
        assert!(config.packages[1].reads.is_empty());
        assert_eq!(config.whitelisted, vec!["com.vendor.*".to_string()]);
    }

    #[test]
    fn parses_yaml() {
        let yaml = "packages:\n  - name: a\n    reads: [b]\n  - name: b\nwhitelisted:\n  - com.vendor.*\n";
        let config = ConfigFile::parse(yaml, ConfigFormat::Yaml).expect("config should parse");

        assert_eq!(config.packages.len(), 2);
        assert!(config.builtin_roots.is_empty());
    }

    #[test]
    fn empty_document_is_an_empty_configuration() {
        let config = ConfigFile::parse("{}", ConfigFormat::Json).expect("config should parse");

        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn to_model_carries_everything_over() {
        let model = ConfigFile::parse(JSON, ConfigFormat::Json)
            .and_then(|config| config.to_model())
            .expect("model should build");

        assert!(model.reads("a", "b"));
        assert!(model.is_configured("b"));
        assert!(model.is_whitelisted("com.vendor.x"));
        assert!(model.is_builtin_root("java.lang"));
    }

    #[test]
    fn to_model_rejects_bad_pattern() {
        let config = ConfigFile {
            whitelisted: vec!["a..b".into()],
            ..ConfigFile::default()
        };

        assert!(matches!(config.to_model(), Err(Error::InvalidPattern { .. })));
    }

    #[rstest]
    #[case::json("archgate.json", ConfigFormat::Json)]
    #[case::yaml("deps.yaml", ConfigFormat::Yaml)]
    #[case::yml_upper("deps.YML", ConfigFormat::Yaml)]
    #[case::no_extension("deps", ConfigFormat::Json)]
    fn format_from_path(#[case] path: &str, #[case] expected: ConfigFormat) {
        assert_eq!(ConfigFormat::from_path(Path::new(path)), expected);
    }

    #[test]
    fn to_json_skips_empty_fields() {
        let config = ConfigFile {
            packages: vec![PackageConfig {
                name: "a".into(),
                reads: Vec::new(),
            }],
            ..ConfigFile::default()
        };

        let json = config.to_json().expect("json encoding should succeed");
        assert!(!json.contains("whitelisted"));
        assert!(!json.contains("reads"));
    }
}
