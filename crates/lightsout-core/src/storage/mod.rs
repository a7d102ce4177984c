mod config;
pub mod database;

pub use config::{Config, LoggingConfig, MediaConfig, NotificationsConfig, SessionSettings};
pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::error::Result;

/// Durable string key-value storage used for persisted app state.
pub trait BlobStore {
    fn read_blob(&self, key: &str) -> Result<Option<String>>;

    /// Must be durable when it returns `Ok`.
    fn write_blob(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: BlobStore + ?Sized> BlobStore for &T {
    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        (**self).read_blob(key)
    }

    fn write_blob(&self, key: &str, value: &str) -> Result<()> {
        (**self).write_blob(key, value)
    }
}

/// Non-durable store for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.get(key).cloned())
    }

    fn write_blob(&self, key: &str, value: &str) -> Result<()> {
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Returns `~/.config/lightsout[-dev]/` based on LIGHTSOUT_ENV.
///
/// Set LIGHTSOUT_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LIGHTSOUT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("lightsout-dev")
    } else {
        base_dir.join("lightsout")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
