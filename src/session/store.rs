//! Session store trait.

use async_trait::async_trait;

use super::{SessionError, SessionRecord, SessionUpdate};

/// Keyed-document storage for session records.
///
/// Every call is addressed by exact session identifier. Implementations must
/// apply [`SessionUpdate`]s atomically per document so that concurrent
/// requests on the same session never lose each other's field writes.
///
/// - [`InMemorySessionStore`](super::InMemorySessionStore): process-local, for
///   development, tests and single-instance deployments
/// - [`FileSessionStore`](super::FileSessionStore): one JSON file per session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Finds a session record by its ID.
    async fn find(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError>;

    /// Merges `update` into the record, creating it when absent.
    async fn upsert(&self, session_id: &str, update: SessionUpdate) -> Result<(), SessionError>;

    /// Removes the record. Deleting a missing record is not an error.
    async fn delete(&self, session_id: &str) -> Result<(), SessionError>;
}
