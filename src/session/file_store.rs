//! File-based session storage.
//!
//! Stores each session as a JSON file in a directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::store::SessionStore;
use super::{SessionError, SessionRecord, SessionUpdate};

/// File-based session storage.
///
/// Each session is stored as `{session_id}.json` in the configured directory.
/// Writes go through a temporary file and a rename, and every
/// read-modify-write cycle runs under one store-wide lock, so field updates
/// from concurrent requests in this process are never lost.
///
/// # Example
///
/// ```rust,ignore
/// use agrosense::session::FileSessionStore;
///
/// let store = FileSessionStore::new("/var/lib/agrosense/sessions")?;
/// ```
pub struct FileSessionStore {
    directory: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Creates the store, creating `directory` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let dir = directory.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            SessionError::Store(format!("Failed to create session directory: {e}"))
        })?;
        Ok(Self {
            directory: dir,
            write_lock: Mutex::new(()),
        })
    }

    fn record_path(&self, session_id: &str) -> PathBuf {
        self.directory.join(format!("{session_id}.json"))
    }

    /// Identifiers become file names, so only plain alphanumerics are accepted.
    fn is_valid_id(session_id: &str) -> bool {
        !session_id.is_empty() && session_id.chars().all(|c| c.is_ascii_alphanumeric())
    }

    fn read_record(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let path = self.record_path(session_id);

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| SessionError::Store(format!("Failed to read session file: {e}")))?;

        let record = serde_json::from_str(&content)
            .map_err(|e| SessionError::Store(format!("Failed to parse session file: {e}")))?;

        Ok(Some(record))
    }

    fn write_record(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let path = self.record_path(&record.id);
        let staging = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| SessionError::Store(format!("Failed to serialize session: {e}")))?;

        std::fs::write(&staging, content)
            .map_err(|e| SessionError::Store(format!("Failed to write session file: {e}")))?;
        std::fs::rename(&staging, &path)
            .map_err(|e| SessionError::Store(format!("Failed to replace session file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        if !Self::is_valid_id(session_id) {
            return Ok(None);
        }

        self.read_record(session_id)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, update), err))]
    async fn upsert(&self, session_id: &str, update: SessionUpdate) -> Result<(), SessionError> {
        if !Self::is_valid_id(session_id) {
            return Err(SessionError::Store(format!(
                "Invalid session identifier: {session_id:?}"
            )));
        }

        let _guard = self.write_lock.lock().await;

        let record = match self.read_record(session_id)? {
            Some(mut record) => {
                record.apply(&update);
                record
            }
            None => SessionRecord::from_update(session_id, &update),
        };

        self.write_record(&record)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        if !Self::is_valid_id(session_id) {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;

        let path = self.record_path(session_id);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                SessionError::Store(format!("Failed to delete session file: {e}"))
            })?;
        }

        Ok(())
    }
}
