use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db::connection::{ConnectionSettings, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DB_NAME};
use crate::parser::languages::Language;
use crate::{PlagError, Result};

/// Pipeline configuration, usually read from a TOML file.
///
/// ```toml
/// language = "py"
/// exclude = "(^|/)tests?/"
///
/// [backend]
/// root = "/var/lib/codeplag"
/// db_name = "works"
/// connect_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlagConfig {
    pub language: Language,
    /// Paths matching this regex are skipped during directory scans.
    pub exclude: Option<String>,
    /// Document store used as feature cache; absent means no cache.
    pub backend: Option<BackendConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Directory holding the database files; in-memory when unset.
    pub root: Option<PathBuf>,
    pub db_name: String,
    pub connect_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            root: None,
            db_name: DEFAULT_DB_NAME.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl BackendConfig {
    pub fn settings(&self) -> ConnectionSettings {
        let settings = match &self.root {
            Some(root) => ConnectionSettings::new(root),
            None => ConnectionSettings::in_memory(),
        };
        settings
            .db_name(self.db_name.as_str())
            .connect_timeout(Duration::from_millis(self.connect_timeout_ms))
    }
}

impl PlagConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|err| PlagError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
