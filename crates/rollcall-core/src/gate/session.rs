//! In-process registry of live sessions.
//!
//! Sessions are ephemeral: they exist only in this map, keyed by the
//! UUIDv7 handed to the client at login, and vanish at logout or process
//! restart. Each session sits behind its own async mutex so turns within
//! one session are serialized while independent sessions proceed freely.

use dashmap::DashMap;
use rollcall_types::chat::Session;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Concurrent map of live sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a freshly opened session, returning its id.
    pub fn insert(&self, session: Session) -> Uuid {
        let id = session.id;
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        id
    }

    /// Fetch a handle to a live session.
    pub fn get(&self, id: &Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Tear a session down. Returns false when the id was not live.
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
