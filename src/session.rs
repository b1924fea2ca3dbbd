//! Per-browser-session storage of the dashboard stages.
//!
//! Each session holds the delimiter choice, the uploaded and enriched snapshots and the
//! selected export format. Sessions are created explicitly, ended explicitly and purged
//! after a period of inactivity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::export::ExportFormat;
use crate::ingestion::CsvSeparator;
use crate::snapshot::Snapshot;

/// Opaque session identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// State of one dashboard session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Delimiter applied to CSV uploads.
    pub separator: CsvSeparator,
    /// Last successfully uploaded record set.
    pub source: Option<Snapshot>,
    /// Last enrichment result.
    pub result: Option<Snapshot>,
    /// Format picked for `GET /download`.
    pub export_choice: Option<ExportFormat>,
    /// Time of the last operation on this session.
    pub last_seen: Instant,
}

impl Session {
    fn new(now: Instant) -> Self {
        Self {
            separator: CsvSeparator::default(),
            source: None,
            result: None,
            export_choice: None,
            last_seen: now,
        }
    }
}

/// In-memory session map.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Session>> {
        // Poisoning is ignored: every update is a plain field assignment.
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new session.
    pub fn create(&self) -> SessionId {
        let id = SessionId::new();
        self.lock().insert(id, Session::new(Instant::now()));
        tracing::info!(session = %id, "session created");
        id
    }

    /// Discard a session. Returns `false` for an unknown id.
    pub fn end(&self, id: SessionId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, "session ended");
        }
        removed
    }

    /// Copy of the session state, refreshing its idle timer.
    pub fn get(&self, id: SessionId) -> Option<Session> {
        self.update(id, |s| s.clone())
    }

    /// Run `f` against the session, refreshing its idle timer. `None` for an unknown id.
    pub fn update<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id)?;
        session.last_seen = Instant::now();
        Some(f(session))
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were dropped.
    pub fn purge_idle(&self, ttl: Duration) -> usize {
        self.purge_idle_at(Instant::now(), ttl)
    }

    fn purge_idle_at(&self, now: Instant, ttl: Duration) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| now.saturating_duration_since(s.last_seen) <= ttl);
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::info!(purged, remaining = sessions.len(), "purged idle sessions");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionId, SessionStore};
    use crate::export::ExportFormat;
    use crate::ingestion::CsvSeparator;
    use std::time::{Duration, Instant};

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);

        store.update(a, |s| s.export_choice = Some(ExportFormat::Json)).unwrap();
        store.update(b, |s| s.separator = CsvSeparator::Comma).unwrap();

        let a = store.get(a).unwrap();
        let b = store.get(b).unwrap();
        assert_eq!(a.export_choice, Some(ExportFormat::Json));
        assert_eq!(a.separator, CsvSeparator::Semicolon);
        assert_eq!(b.export_choice, None);
        assert_eq!(b.separator, CsvSeparator::Comma);
    }

    #[test]
    fn ended_and_unknown_sessions_are_gone() {
        let store = SessionStore::new();
        let id = store.create();
        assert!(store.end(id));
        assert!(!store.end(id));
        assert!(store.get(id).is_none());
        assert!(store.get(SessionId::new()).is_none());
    }

    #[test]
    fn purge_drops_only_idle_sessions() {
        let store = SessionStore::new();
        let old = store.create();
        let fresh = store.create();
        let now = Instant::now() + Duration::from_secs(120);
        store.update(fresh, |s| s.last_seen = now).unwrap();

        assert_eq!(store.purge_idle_at(now, Duration::from_secs(60)), 1);
        assert!(store.get(old).is_none());
        assert!(store.get(fresh).is_some());
    }

    #[test]
    fn session_id_parses_its_display_form() {
        let id = SessionId::new();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}
