//! TTL-scoped session store: session id → { placeholder → original }.
//!
//! The store is the only shared mutable state in the engine, so it is
//! internally locked and safe to use from concurrent callers. Expiry is
//! lazy: sessions are dropped when pruned at the start of a redaction or
//! when their mappings are requested past the deadline.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use uuid::Uuid;

const DEFAULT_TTL_SECS: i64 = 3600;

struct Session {
    created_at: DateTime<Utc>,
    mappings: HashMap<String, String>,
}

/// In-memory session store with lazy TTL expiry.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Mint a fresh session with an empty mapping.
    pub fn create(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.insert(
            session_id.clone(),
            Session {
                created_at: Utc::now(),
                mappings: HashMap::new(),
            },
        );
        session_id
    }

    /// Record a placeholder → original mapping. Idempotent; the last write
    /// wins for a given placeholder. Unknown ids are ignored (the session
    /// may have been pruned between the caller's create and this add).
    pub fn add(&self, session_id: &str, placeholder: &str, original: &str) {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        match sessions.get_mut(session_id) {
            Some(session) => {
                session
                    .mappings
                    .insert(placeholder.to_string(), original.to_string());
            }
            None => warn!(session_id, "add_mapping on unknown or expired session"),
        }
    }

    /// A shallow copy of the session's mappings, or `None` for unknown or
    /// expired ids.
    pub fn get(&self, session_id: &str) -> Option<HashMap<String, String>> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        let expired = match sessions.get(session_id) {
            Some(session) => now - session.created_at > self.ttl,
            None => return None,
        };
        if expired {
            sessions.remove(session_id);
            return None;
        }
        sessions.get(session_id).map(|s| s.mappings.clone())
    }

    /// Drop every session older than the TTL.
    pub fn prune_expired(&self) {
        self.prune_expired_at(Utc::now());
    }

    /// Prune against an explicit clock. Exposed so expiry is testable
    /// without sleeping.
    pub fn prune_expired_at(&self, now: DateTime<Utc>) {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.retain(|_, session| now - session.created_at <= self.ttl);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_returns_distinct_ids() {
        let store = SessionStore::default();
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn get_returns_copy_of_mappings() {
        let store = SessionStore::default();
        let id = store.create();
        store.add(&id, "[EMAIL_ADDRESS_1]", "a@b.com");
        let mappings = store.get(&id).unwrap();
        assert_eq!(mappings["[EMAIL_ADDRESS_1]"], "a@b.com");
    }

    #[test]
    fn add_is_last_write_wins() {
        let store = SessionStore::default();
        let id = store.create();
        store.add(&id, "[PERSON_1]", "Alice");
        store.add(&id, "[PERSON_1]", "Bob");
        assert_eq!(store.get(&id).unwrap()["[PERSON_1]"], "Bob");
        assert_eq!(store.get(&id).unwrap().len(), 1);
    }

    #[test]
    fn unknown_id_is_absent_not_error() {
        let store = SessionStore::default();
        assert!(store.get("no-such-session").is_none());
    }

    #[test]
    fn prune_drops_sessions_past_ttl() {
        let store = SessionStore::new(60);
        let id = store.create();
        store.prune_expired_at(Utc::now() + Duration::seconds(61));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn prune_keeps_sessions_within_ttl() {
        let store = SessionStore::new(60);
        let id = store.create();
        store.prune_expired_at(Utc::now() + Duration::seconds(30));
        assert!(store.get(&id).is_some());
    }

    #[test]
    fn get_expires_lazily() {
        let store = SessionStore::new(0);
        let id = store.create();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(store.get(&id).is_none());
    }
}
