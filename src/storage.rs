//! Persistence collaborators.
//!
//! The application mirrors its state into a key-value store after every
//! mutation. Two keys are used, one for the task collection and one for the
//! settings singleton, each holding a complete JSON document. Three stores
//! implement the contract:
//!
//! - [`LocalStore`]: one `<key>.json` file per key in a data directory.
//! - [`BlobStore`]: a remote blob store reached over HTTP.
//! - [`MemoryStore`]: an in-process map, for tests and dry runs.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Storage key of the task collection.
pub const TASKS_KEY: &str = "taskpro_tasks";
/// Storage key of the settings singleton.
pub const SETTINGS_KEY: &str = "taskpro_settings";

/// A store of whole documents addressed by key.
pub trait KeyValueStore {
    /// Read the value under `key`, `None` if nothing was ever written.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Replace the value under `key`.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;
    /// Short name used in log lines.
    fn name(&self) -> &'static str;
}

/// Read and decode a JSON document.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.read(key)? {
        None => Ok(None),
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
    }
}

/// Encode and write a JSON document.
pub fn write_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    store.write(key, &data)
}

fn file_name(key: &str) -> String {
    format!("{key}.json")
}

/// File-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalStore { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name(key))
    }
}

impl KeyValueStore for LocalStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "read local value");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.flush()?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote local value");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let values = self
            .values
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".into()))?;
        values.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug, Deserialize)]
struct BlobListing {
    #[serde(default)]
    blobs: Vec<BlobEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct BlobEntry {
    pathname: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    urls: [&'a str; 1],
}

/// Remote blob store.
///
/// Every write is a full read-modify-write: the old blob is located by
/// listing, deleted, and a new blob is put in its place. There is no
/// concurrency check, so concurrent writers silently overwrite each other.
pub struct BlobStore {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl BlobStore {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        BlobStore::with_client(base_url, token, client)
    }

    pub fn with_client(base_url: impl Into<String>, token: Option<String>, client: Client) -> Self {
        BlobStore {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        }
    }

    fn authorize(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    fn find(&self, pathname: &str) -> Result<Option<BlobEntry>> {
        let resp = self
            .authorize(self.client.get(&self.base_url).query(&[("prefix", pathname)]))
            .send()?;
        if !resp.status().is_success() {
            return Err(Error::Storage(format!("listing blobs failed with status {}", resp.status())));
        }
        let listing: BlobListing = resp.json()?;
        debug!(count = listing.blobs.len(), "listed blobs");
        Ok(listing.blobs.into_iter().find(|b| b.pathname == pathname))
    }

    fn delete(&self, url: &str) -> Result<()> {
        let resp = self
            .authorize(self.client.post(format!("{}/delete", self.base_url)))
            .json(&DeleteRequest { urls: [url] })
            .send()?;
        if !resp.status().is_success() {
            return Err(Error::Storage(format!("deleting blob failed with status {}", resp.status())));
        }
        Ok(())
    }
}

impl KeyValueStore for BlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let pathname = file_name(key);
        let Some(entry) = self.find(&pathname)? else {
            debug!(%pathname, "no blob found");
            return Ok(None);
        };
        let resp = self.client.get(&entry.url).send()?;
        if !resp.status().is_success() {
            return Err(Error::Storage(format!("fetching blob failed with status {}", resp.status())));
        }
        let bytes = resp.bytes()?.to_vec();
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(bytes))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let pathname = file_name(key);
        match self.find(&pathname) {
            Ok(Some(old)) => {
                if let Err(e) = self.delete(&old.url) {
                    warn!(%pathname, error = %e, "could not delete old blob");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(%pathname, error = %e, "could not list old blob"),
        }
        let resp = self
            .authorize(self.client.put(format!("{}/{}", self.base_url, pathname)))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes.to_vec())
            .send()?;
        if !resp.status().is_success() {
            return Err(Error::Storage(format!("putting blob failed with status {}", resp.status())));
        }
        info!(%pathname, bytes = bytes.len(), "saved blob");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "blob"
    }
}
