//! In-memory session storage.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::store::SessionStore;
use super::{SessionError, SessionRecord, SessionUpdate};

/// In-memory session storage.
///
/// Records live in a sharded `DashMap`; an upsert holds the shard lock for its
/// entry while it merges, which gives the per-document atomicity the
/// [`SessionStore`] contract asks for. Clones share the same map.
///
/// Sessions are lost when the process restarts. Use
/// [`FileSessionStore`](super::FileSessionStore) for persistence.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    records: Arc<DashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of sessions currently stored.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        Ok(self
            .records
            .get(session_id)
            .map(|record| record.value().clone()))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, update), err))]
    async fn upsert(&self, session_id: &str, update: SessionUpdate) -> Result<(), SessionError> {
        match self.records.entry(session_id.to_owned()) {
            Entry::Occupied(mut entry) => entry.get_mut().apply(&update),
            Entry::Vacant(entry) => {
                entry.insert(SessionRecord::from_update(session_id, &update));
            }
        }
        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        self.records.remove(session_id);
        Ok(())
    }
}
