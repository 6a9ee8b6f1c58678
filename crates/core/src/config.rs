//! Run settings loaded from a TOML file.
//!
//! # Example
//!
//! ```toml
//! extensions = ["php", "inc"]
//! exclude_packages = ["Vendor\\*", "+global"]
//! fail_fast = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::PackageFilter;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// File suffixes picked up when walking directories, without the dot.
    pub extensions: Vec<String>,
    /// Packages hidden from package-index iteration. `Foo\*` also hides
    /// every namespace below `Foo`.
    pub exclude_packages: Vec<String>,
    /// Stop at the first file that fails to parse.
    pub fail_fast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            extensions: vec!["php".to_owned()],
            exclude_packages: Vec::new(),
            fail_fast: false,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Whether `path` has one of the configured extensions (case-insensitive).
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }

    pub fn package_filter(&self) -> PackageFilter {
        PackageFilter::new(self.exclude_packages.iter().cloned())
    }
}
