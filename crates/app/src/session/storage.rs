//! Durable session storage.
//!
//! A small string key/value store holding the `user` and `token` entries of the
//! signed-in session between runs.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

/// Key holding the JSON encoded user profile.
pub const USER_KEY: &str = "user";

/// Key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Error)]
pub enum SessionStorageError {
    #[error("failed to read session file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write session file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session file {path} is not a JSON object of strings")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[automock]
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStorageError>;

    async fn remove(&self, key: &str) -> Result<(), SessionStorageError>;
}

/// Session storage backed by a JSON file.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<FxHashMap<String, String>, SessionStorageError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(FxHashMap::default()),
            Err(source) => {
                return Err(SessionStorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(FxHashMap::default());
        }

        serde_json::from_str(&contents).map_err(|source| SessionStorageError::Format {
            path: self.path.clone(),
            source,
        })
    }

    /// Entries to start a write from, and whether a corrupted file was
    /// discarded to get them.
    async fn load_for_write(
        &self,
    ) -> Result<(FxHashMap<String, String>, bool), SessionStorageError> {
        match self.load().await {
            Ok(entries) => Ok((entries, false)),
            Err(SessionStorageError::Format { path, source }) => {
                warn!(path = %path.display(), error = %source, "discarding corrupted session file");

                Ok((FxHashMap::default(), true))
            }
            Err(error) => Err(error),
        }
    }

    async fn save(&self, entries: &FxHashMap<String, String>) -> Result<(), SessionStorageError> {
        let write_error = |source| SessionStorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_error)?;
        }

        let contents = serde_json::to_string_pretty(entries).map_err(|source| {
            SessionStorageError::Format {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::write(&self.path, contents).await.map_err(write_error)?;

        debug!(path = %self.path.display(), "session file written");

        Ok(())
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStorageError> {
        let _guard = self.lock.lock().await;

        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStorageError> {
        let _guard = self.lock.lock().await;

        let (mut entries, _) = self.load_for_write().await?;
        entries.insert(key.to_string(), value.to_string());

        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), SessionStorageError> {
        let _guard = self.lock.lock().await;

        let (mut entries, discarded) = self.load_for_write().await?;

        if entries.remove(key).is_none() && !discarded {
            return Ok(());
        }

        self.save(&entries).await
    }
}

/// Session storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: Mutex<FxHashMap<String, String>>,
}

impl MemorySessionStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionStorageError> {
        self.entries.lock().await.remove(key);

        Ok(())
    }
}
