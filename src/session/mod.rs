//! Server-side sessions keyed by a signed cookie.
//!
//! A browser carries only `idsession`, an HMAC-signed random identifier. All
//! state lives in a [`SessionStore`] as one [`SessionRecord`] per identifier:
//! a `last_accessed` timestamp and a free-form JSON `data` map.
//!
//! Handlers never touch the store directly. [`manage_session`] places a
//! request-scoped [`Session`] into the request extensions; handlers extract it
//! and use `get`/`set`/`contains`/`snapshot`/`clear`. On the way out the
//! middleware writes exactly one `Set-Cookie` for whatever the request did.

mod config;
mod context;
mod cookie;
mod file_store;
mod handle;
mod memory_store;
mod middleware;
mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use config::{SameSite, SessionConfig};
pub use context::{CookieAction, Session};
pub use cookie::{read_cookie, sign_session_id, verify_signed_cookie};
pub use file_store::FileSessionStore;
pub use handle::SessionHandle;
pub use memory_store::InMemorySessionStore;
pub use middleware::{manage_session, SessionManager};
pub use store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The cookie was malformed or its signature did not verify.
    #[error("invalid session signature")]
    InvalidSignature,
    #[error("session store error: {0}")]
    Store(String),
    #[error("session value could not be serialized: {0}")]
    Serialization(String),
    #[error("session configuration error: {0}")]
    Configuration(String),
}

/// One persisted session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub last_accessed: DateTime<Utc>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl SessionRecord {
    /// Builds the record an upsert creates when no document exists yet.
    pub fn from_update(id: &str, update: &SessionUpdate) -> Self {
        let mut record = Self {
            id: id.to_owned(),
            last_accessed: update.last_accessed.unwrap_or_else(Utc::now),
            data: Map::new(),
        };
        record.apply(update);
        record
    }

    /// Merges `update` into this record field by field.
    ///
    /// Keys of `data` not named by the update are left untouched.
    pub fn apply(&mut self, update: &SessionUpdate) {
        if let Some(at) = update.last_accessed {
            self.last_accessed = at;
        }
        for (key, value) in &update.fields {
            self.data.insert(key.clone(), value.clone());
        }
    }
}

/// A partial update addressed at one session document.
///
/// Equivalent to a `$set` of `last_accessed` and/or individual `data.<key>`
/// paths; stores apply it atomically per document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    last_accessed: Option<DateTime<Utc>>,
    fields: Map<String, Value>,
}

impl SessionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn touch(mut self, at: DateTime<Utc>) -> Self {
        self.last_accessed = Some(at);
        self
    }

    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn last_accessed(&self) -> Option<DateTime<Utc>> {
        self.last_accessed
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.last_accessed.is_none() && self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_apply_only_touches_named_keys() {
        let earlier = Utc::now() - Duration::hours(1);
        let mut record = SessionRecord::from_update(
            "s1",
            &SessionUpdate::new()
                .touch(earlier)
                .set("iduser", json!("U1"))
                .set("crop", json!("maize")),
        );

        let now = Utc::now();
        record.apply(&SessionUpdate::new().touch(now).set("crop", json!("wheat")));

        assert_eq!(record.last_accessed, now);
        assert_eq!(record.data["iduser"], json!("U1"));
        assert_eq!(record.data["crop"], json!("wheat"));
    }

    #[test]
    fn test_apply_without_touch_keeps_timestamp() {
        let earlier = Utc::now() - Duration::minutes(5);
        let mut record = SessionRecord::from_update("s1", &SessionUpdate::new().touch(earlier));
        record.apply(&SessionUpdate::new().set("area", json!(1200.5)));

        assert_eq!(record.last_accessed, earlier);
        assert_eq!(record.data["area"], json!(1200.5));
    }

    #[test]
    fn test_update_builder() {
        assert!(SessionUpdate::new().is_empty());
        let update = SessionUpdate::new().set("k", json!(1));
        assert!(!update.is_empty());
        assert!(update.last_accessed().is_none());
        assert_eq!(update.fields().len(), 1);
    }

    #[test]
    fn test_record_roundtrips_through_json_without_data() {
        let record: SessionRecord = serde_json::from_value(json!({
            "id": "s1",
            "last_accessed": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(record.data.is_empty());
    }
}
