//! Registry of live sessions keyed by session code.

use std::sync::{Arc, Mutex as StdMutex};

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::state::session::{GameSession, SessionCode};

/// One registered session: its state behind a lock, plus the slot holding
/// the scheduler task currently driving its rounds.
pub struct SessionHandle {
    code: SessionCode,
    session: Mutex<GameSession>,
    runner: StdMutex<Option<JoinHandle<()>>>,
}

impl SessionHandle {
    fn new(code: SessionCode) -> Arc<Self> {
        Arc::new(Self {
            code: code.clone(),
            session: Mutex::new(GameSession::new(code)),
            runner: StdMutex::new(None),
        })
    }

    /// Code this handle is registered under.
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    /// Acquire the session lock. Every command handler and every scheduler
    /// callback goes through here, which serializes all mutation and all
    /// broadcasts for this session.
    pub async fn lock(&self) -> MutexGuard<'_, GameSession> {
        self.session.lock().await
    }

    /// Install a new scheduler task, aborting whichever one was armed
    /// before. Two runner tasks for the same session never coexist.
    pub fn arm_runner(&self, task: JoinHandle<()>) {
        let mut slot = self.runner.lock().expect("runner slot poisoned");
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    /// Abort the armed scheduler task, if any.
    pub fn cancel_runner(&self) {
        let mut slot = self.runner.lock().expect("runner slot poisoned");
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

/// Process-wide mapping from session code to session. Sessions are created
/// lazily on first join and never evicted.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionCode, Arc<SessionHandle>>,
}

impl SessionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the session for `code`, creating it in `Waiting` if this is
    /// the first join under that code. The underlying map entry is locked
    /// for the duration, so two concurrent first-joins observe the same
    /// session object.
    pub fn get_or_create(&self, code: &SessionCode) -> Arc<SessionHandle> {
        self.sessions
            .entry(code.clone())
            .or_insert_with(|| SessionHandle::new(code.clone()))
            .value()
            .clone()
    }

    /// Resolve an existing session without creating one.
    pub fn get(&self, code: &SessionCode) -> Option<Arc<SessionHandle>> {
        self.sessions.get(code).map(|entry| entry.value().clone())
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session has been created yet.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent_per_code() {
        let store = SessionStore::new();
        let code = SessionCode::parse("QZ99AA").unwrap();

        let first = store.get_or_create(&code);
        let second = store.get_or_create(&code);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_does_not_create() {
        let store = SessionStore::new();
        let code = SessionCode::parse("QZ99AA").unwrap();
        assert!(store.get(&code).is_none());
        assert!(store.is_empty());
    }
}
