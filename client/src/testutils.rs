use async_trait::async_trait;
use session::store::SessionStore;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scripted session store for exercising refresh and retry behavior.
pub struct MockSessionStore {
    pub session: Option<String>,
    pub trigger_ok: bool,
    pub probe_ok: bool,
    pub triggers: AtomicUsize,
    pub probes: AtomicUsize,
}

impl MockSessionStore {
    pub fn new(trigger_ok: bool, probe_ok: bool) -> Self {
        MockSessionStore {
            session: Some("sess-1".to_string()),
            trigger_ok,
            probe_ok,
            triggers: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn healthy() -> Self {
        MockSessionStore::new(true, true)
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn session_id(&self) -> Option<String> {
        self.session.clone()
    }

    async fn trigger_refresh(&self) -> bool {
        self.triggers.fetch_add(1, Ordering::SeqCst);
        self.trigger_ok
    }

    async fn check_session(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.probe_ok
    }
}
