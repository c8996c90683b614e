use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use super::cookie::verify_signed_cookie;
use super::store::SessionStore;
use super::{SessionError, SessionUpdate};
use crate::crypto::generate_session_id;
use crate::SecretString;

/// One resolved session identifier and the store that holds its record.
///
/// Reads and writes go straight to the store on every call; nothing about the
/// record is cached here.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    store: Arc<dyn SessionStore>,
}

impl SessionHandle {
    /// Resolves the identifier for a request and freshens its record.
    ///
    /// An explicit identifier wins. Otherwise the signed cookie value is
    /// verified; a missing or invalid cookie yields a freshly minted
    /// identifier. In every case `last_accessed` is upserted, which also
    /// creates the record for new identifiers.
    pub async fn resolve(
        store: Arc<dyn SessionStore>,
        secret: &SecretString,
        explicit_id: Option<&str>,
        cookie_value: Option<&str>,
    ) -> Result<Self, SessionError> {
        let id = match explicit_id {
            Some(id) => id.to_owned(),
            None => cookie_value
                .and_then(|value| verify_signed_cookie(value, secret).ok())
                .unwrap_or_else(generate_session_id),
        };

        let handle = Self::attach(store, id);
        handle.touch().await?;
        Ok(handle)
    }

    /// Binds to `id` without touching the store.
    pub fn attach(store: Arc<dyn SessionStore>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            store,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    async fn touch(&self) -> Result<(), SessionError> {
        self.store
            .upsert(&self.id, SessionUpdate::new().touch(Utc::now()))
            .await
    }

    /// Reads `data.<key>`, freshening `last_accessed` first.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        self.touch().await?;

        Ok(self
            .store
            .find(&self.id)
            .await?
            .and_then(|mut record| record.data.remove(key)))
    }

    /// Writes `data.<key>`. A `null` value leaves the record untouched.
    pub async fn set(&self, key: &str, value: Value) -> Result<(), SessionError> {
        if value.is_null() {
            return Ok(());
        }

        self.store
            .upsert(
                &self.id,
                SessionUpdate::new().touch(Utc::now()).set(key, value),
            )
            .await
    }

    /// Membership check. Does not freshen `last_accessed`.
    pub async fn contains(&self, key: &str) -> Result<bool, SessionError> {
        Ok(self
            .store
            .find(&self.id)
            .await?
            .is_some_and(|record| record.data.contains_key(key)))
    }

    /// The whole `data` map, empty when the record does not exist.
    pub async fn snapshot(&self) -> Result<Map<String, Value>, SessionError> {
        Ok(self
            .store
            .find(&self.id)
            .await?
            .map(|record| record.data)
            .unwrap_or_default())
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};
    use serde_json::json;

    use super::*;
    use crate::session::{sign_session_id, InMemorySessionStore};

    fn secret() -> SecretString {
        SecretString::new("handle-test-secret-that-is-long-enough")
    }

    async fn last_accessed(store: &InMemorySessionStore, id: &str) -> DateTime<Utc> {
        store.find(id).await.unwrap().unwrap().last_accessed
    }

    async fn backdate(store: &InMemorySessionStore, id: &str) -> DateTime<Utc> {
        let past = Utc::now() - Duration::hours(1);
        store
            .upsert(id, SessionUpdate::new().touch(past))
            .await
            .unwrap();
        past
    }

    #[tokio::test]
    async fn test_resolve_without_cookie_mints_and_creates() {
        let store = InMemorySessionStore::new();
        let handle = SessionHandle::resolve(Arc::new(store.clone()), &secret(), None, None)
            .await
            .unwrap();

        assert_eq!(handle.id().len(), crate::crypto::IDENTIFIER_LENGTH);
        assert!(store.find(handle.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_resolve_with_valid_cookie_reuses_identifier() {
        let store = InMemorySessionStore::new();
        let cookie = sign_session_id("existingSession1", &secret());

        let handle =
            SessionHandle::resolve(Arc::new(store.clone()), &secret(), None, Some(&cookie))
                .await
                .unwrap();

        assert_eq!(handle.id(), "existingSession1");
    }

    #[tokio::test]
    async fn test_resolve_with_tampered_cookie_mints_fresh_identifier() {
        let store = InMemorySessionStore::new();
        let mut cookie = sign_session_id("existingSession1", &secret());
        cookie.replace_range(0..1, "X");

        let handle =
            SessionHandle::resolve(Arc::new(store.clone()), &secret(), None, Some(&cookie))
                .await
                .unwrap();

        assert_ne!(handle.id(), "existingSession1");
        assert_ne!(handle.id(), "XxistingSession1");
    }

    #[tokio::test]
    async fn test_explicit_identifier_wins_over_cookie() {
        let store = InMemorySessionStore::new();
        let cookie = sign_session_id("fromCookie", &secret());

        let handle = SessionHandle::resolve(
            Arc::new(store.clone()),
            &secret(),
            Some("adminLookup"),
            Some(&cookie),
        )
        .await
        .unwrap();

        assert_eq!(handle.id(), "adminLookup");
        assert!(store.find("adminLookup").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let store = InMemorySessionStore::new();
        let handle = SessionHandle::attach(Arc::new(store.clone()), "s1");

        let value = json!({"width": 40.5, "height": 12, "crop": "maize", "tags": ["dry", "north"]});
        handle.set("field", value.clone()).await.unwrap();

        assert_eq!(handle.get("field").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_set_null_is_a_no_op() {
        let store = InMemorySessionStore::new();
        let handle = SessionHandle::attach(Arc::new(store.clone()), "s1");

        handle.set("iduser", json!("U1")).await.unwrap();
        let before = backdate(&store, "s1").await;
        handle.set("iduser", Value::Null).await.unwrap();

        assert_eq!(last_accessed(&store, "s1").await, before);
        assert_eq!(handle.get("iduser").await.unwrap(), Some(json!("U1")));
    }

    #[tokio::test]
    async fn test_set_null_on_missing_record_creates_nothing() {
        let store = InMemorySessionStore::new();
        let handle = SessionHandle::attach(Arc::new(store.clone()), "s1");

        handle.set("iduser", Value::Null).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = InMemorySessionStore::new();
        let handle = SessionHandle::attach(Arc::new(store.clone()), "s1");

        assert_eq!(handle.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_contains_does_not_touch_but_get_does() {
        let store = InMemorySessionStore::new();
        let handle = SessionHandle::attach(Arc::new(store.clone()), "s1");
        handle.set("iduser", json!("U1")).await.unwrap();

        let before = backdate(&store, "s1").await;
        assert!(handle.contains("iduser").await.unwrap());
        assert!(!handle.contains("other").await.unwrap());
        assert_eq!(last_accessed(&store, "s1").await, before);

        handle.get("iduser").await.unwrap();
        assert!(last_accessed(&store, "s1").await > before);
    }

    #[tokio::test]
    async fn test_snapshot_is_read_only() {
        let store = InMemorySessionStore::new();
        let handle = SessionHandle::attach(Arc::new(store.clone()), "s1");

        assert!(handle.snapshot().await.unwrap().is_empty());
        assert!(store.is_empty());

        handle.set("a", json!(1)).await.unwrap();
        handle.set("b", json!("two")).await.unwrap();
        let before = backdate(&store, "s1").await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["b"], json!("two"));
        assert_eq!(last_accessed(&store, "s1").await, before);
    }

    #[tokio::test]
    async fn test_contains_on_missing_record_is_false() {
        let store = InMemorySessionStore::new();
        let handle = SessionHandle::attach(Arc::new(store), "nobody");
        assert!(!handle.contains("iduser").await.unwrap());
    }
}
