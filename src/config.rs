//! Configuration: `taskpro.toml` in the data directory, then environment
//! overrides.
//!
//! ```toml
//! remote_url = "https://blob.example.com/api/blob"
//! seed_demo = true
//!
//! [assist]
//! model = "gemini-2.5-flash"
//!
//! [report]
//! title = "Weekly Operations"
//! include_charts = false
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assist::{Assistant, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::error::{Error, Result};
use crate::report::ReportConfig;
use crate::storage::{BlobStore, KeyValueStore, LocalStore};

pub const CONFIG_FILE: &str = "taskpro.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote blob store.
    pub remote_url: Option<String>,
    /// Bearer token for the remote blob store.
    pub blob_token: Option<String>,
    /// Populate an empty local store with the demo dataset.
    pub seed_demo: bool,
    pub assist: AssistConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            remote_url: None,
            blob_token: None,
            seed_demo: true,
            assist: AssistConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for AssistConfig {
    fn default() -> Self {
        AssistConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

/// `TASKPRO_DATA_DIR`, else `~/.taskpro`.
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("TASKPRO_DATA_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".taskpro")
}

impl Config {
    pub fn parse(text: &str) -> Result<Config> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read the file in `data_dir`. A missing file gives defaults; so does an
    /// unreadable or invalid one, with a warning.
    pub fn read(data_dir: &Path) -> Config {
        let path = data_dir.join(CONFIG_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file");
                return Config::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config, using defaults");
                return Config::default();
            }
        };
        match Config::parse(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Config::default()
            }
        }
    }

    /// Read the file, then apply the process environment.
    pub fn load(data_dir: &Path) -> Config {
        let mut config = Config::read(data_dir);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get("TASKPRO_REMOTE_URL") {
            self.remote_url = Some(url);
        }
        if let Some(token) = get("BLOB_READ_WRITE_TOKEN") {
            self.blob_token = Some(token);
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.assist.api_key = Some(key);
        }
        if let Some(endpoint) = get("TASKPRO_ASSIST_URL") {
            self.assist.endpoint = endpoint;
        }
    }

    /// The store to load from and save to.
    pub fn open_store(&self, data_dir: &Path, remote: bool) -> Result<Box<dyn KeyValueStore>> {
        if !remote {
            return Ok(Box::new(LocalStore::new(data_dir)));
        }
        let url = self
            .remote_url
            .as_deref()
            .ok_or_else(|| Error::Config("remote store requested but no remote_url set (TASKPRO_REMOTE_URL)".into()))?;
        Ok(Box::new(BlobStore::new(url, self.blob_token.clone())))
    }

    /// Whether an empty store is filled with the demo dataset. Remote stores
    /// start empty.
    pub fn seed(&self, remote: bool) -> bool {
        self.seed_demo && !remote
    }

    pub fn assistant(&self) -> Assistant {
        Assistant::new(&self.assist.endpoint, &self.assist.model, self.assist.api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::read(dir.path());
        assert_eq!(config, Config::default());
        assert!(config.seed(false));
        assert!(!config.seed(true));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(CONFIG_FILE),
            "seed_demo = false\n[report]\ntitle = \"Weekly\"\n[assist]\nmodel = \"m1\"\n",
        )
        .unwrap();
        let config = Config::read(dir.path());
        assert!(!config.seed_demo);
        assert_eq!(config.report.title, "Weekly");
        assert!(config.report.include_charts);
        assert_eq!(config.assist.model, "m1");
        assert_eq!(config.assist.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "seed_demo = \"maybe\"").unwrap();
        assert_eq!(Config::read(dir.path()), Config::default());
        assert!(matches!(Config::parse("[[["), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TASKPRO_REMOTE_URL", "https://blob.test/api"),
            ("BLOB_READ_WRITE_TOKEN", "tok"),
            ("GEMINI_API_KEY", ""),
            ("TASKPRO_ASSIST_URL", "http://localhost:8080"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.assist.api_key = Some("from-file".into());
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.remote_url.as_deref(), Some("https://blob.test/api"));
        assert_eq!(config.blob_token.as_deref(), Some("tok"));
        assert_eq!(config.assist.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.assist.endpoint, "http://localhost:8080");
    }

    #[test]
    fn test_open_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::default();
        assert_eq!(config.open_store(dir.path(), false).unwrap().name(), "local");
        assert!(matches!(config.open_store(dir.path(), true), Err(Error::Config(_))));
        let config = Config { remote_url: Some("https://blob.test".into()), ..Config::default() };
        assert_eq!(config.open_store(dir.path(), true).unwrap().name(), "blob");
    }
}
