//! Persistent display flags
//!
//! Small key/value switches (such as whether the events section is shown)
//! that survive display resets and process restarts.

use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};

use crate::error::AppError;

pub const SHOW_EVENTS: &str = "show_events";

pub struct FlagStore {
    path: Option<PathBuf>,
    flags: RwLock<BTreeMap<String, bool>>,
    /// Serializes writers; readers never wait on the disk
    saving: Mutex<()>,
}

impl FlagStore {
    /// Flags kept only in memory
    pub fn in_memory() -> Self {
        Self {
            path: None,
            flags: RwLock::new(BTreeMap::new()),
            saving: Mutex::new(()),
        }
    }

    /// Load flags from `path`; a missing file starts empty
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let flags = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings at {}, starting with defaults", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            flags: RwLock::new(flags),
            saving: Mutex::new(()),
        })
    }

    pub async fn get(&self, key: &str) -> Option<bool> {
        self.flags.read().await.get(key).copied()
    }

    pub async fn all(&self) -> BTreeMap<String, bool> {
        self.flags.read().await.clone()
    }

    pub async fn show_events(&self) -> bool {
        self.get(SHOW_EVENTS).await.unwrap_or(true)
    }

    /// Set a flag and write the store back to disk. The new value becomes
    /// visible only once it is saved.
    pub async fn set(&self, key: &str, value: bool) -> Result<(), AppError> {
        let _saving = self.saving.lock().await;
        let mut next = self.flags.read().await.clone();
        next.insert(key.to_string(), value);

        if let Some(path) = &self.path {
            let raw = serde_json::to_string_pretty(&next)?;
            tokio::fs::write(path, raw).await?;
        }

        *self.flags.write().await = next;
        tracing::info!("Setting {} = {}", key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_show_events_defaults_on() {
        let flags = FlagStore::in_memory();
        assert!(flags.show_events().await);
        flags.set(SHOW_EVENTS, false).await.unwrap();
        assert!(!flags.show_events().await);
    }

    #[tokio::test]
    async fn test_flags_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let flags = FlagStore::open(&path).await.unwrap();
        assert_eq!(flags.get(SHOW_EVENTS).await, None);
        flags.set(SHOW_EVENTS, false).await.unwrap();
        flags.set("high_contrast", true).await.unwrap();

        let reopened = FlagStore::open(&path).await.unwrap();
        assert!(!reopened.show_events().await);
        assert_eq!(reopened.get("high_contrast").await, Some(true));
        assert_eq!(reopened.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FlagStore::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("settings.json");

        let flags = FlagStore::open(&path).await.unwrap();
        assert!(flags.set(SHOW_EVENTS, false).await.is_err());
        assert!(flags.show_events().await);
        assert!(flags.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_reads_do_not_wait_for_a_save() {
        let flags = FlagStore::in_memory();
        flags.set(SHOW_EVENTS, false).await.unwrap();

        let _saving = flags.saving.lock().await;
        let read = tokio::time::timeout(std::time::Duration::from_secs(1), flags.show_events());
        assert_eq!(read.await.ok(), Some(false));
    }
}
