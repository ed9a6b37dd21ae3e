use crate::domain::session::Session;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

/// Server-side session records addressed by the id carried in the session cookie.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Returns the stored session, or `None` if the id is unknown.
    ///
    /// # Errors
    /// Returns `AppError::Session` if the backing store cannot be read.
    async fn get(&self, id: Uuid) -> Result<Option<Session>>;

    /// Stores `session` under `id`, replacing any previous record.
    ///
    /// # Errors
    /// Returns `AppError::Session` if the backing store cannot be written.
    async fn set(&self, id: Uuid, session: Session) -> Result<()>;

    /// Drops every record not touched within `max_idle_secs`. Returns how many were removed.
    ///
    /// # Errors
    /// Returns `AppError::Session` if the backing store cannot be pruned.
    async fn evict_idle(&self, max_idle_secs: u64) -> Result<usize>;

    /// Number of live records.
    async fn count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct Entry {
    session: Session,
    touched_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: DashMap<Uuid, Entry>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: Uuid) -> Result<Option<Session>> {
        Ok(self.entries.get_mut(&id).map(|mut entry| {
            entry.touched_at = OffsetDateTime::now_utc();
            entry.session.clone()
        }))
    }

    async fn set(&self, id: Uuid, session: Session) -> Result<()> {
        self.entries.insert(id, Entry { session, touched_at: OffsetDateTime::now_utc() });
        Ok(())
    }

    async fn evict_idle(&self, max_idle_secs: u64) -> Result<usize> {
        let max_idle = time::Duration::seconds(i64::try_from(max_idle_secs).unwrap_or(i64::MAX));
        let cutoff = OffsetDateTime::now_utc().checked_sub(max_idle).unwrap_or(OffsetDateTime::UNIX_EPOCH);

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.touched_at >= cutoff);
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn count(&self) -> usize {
        self.entries.len()
    }
}
