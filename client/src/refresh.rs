use crate::metrics_defs::{AUTH_REFRESH_ATTEMPT, AUTH_REFRESH_FAILURE};
use session::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;

/// Terminal states of one refresh attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The backend confirmed a valid session after the refresh.
    Refreshed,
    /// The trigger failed, or the probe still saw no valid session.
    Failed,
}

/// Runs the transparent re-authentication flow: trigger the external refresh,
/// wait out the settle delay, then probe whether a valid session exists.
#[derive(Clone)]
pub struct AuthRefresher {
    store: Arc<dyn SessionStore>,
    settle_delay: Duration,
}

impl AuthRefresher {
    pub fn new(store: Arc<dyn SessionStore>, settle_delay: Duration) -> Self {
        AuthRefresher {
            store,
            settle_delay,
        }
    }

    /// One refresh attempt. The retry policy runs this at most once per
    /// original request.
    pub async fn refresh(&self) -> RefreshOutcome {
        metrics::counter!(AUTH_REFRESH_ATTEMPT.name).increment(1);
        tracing::info!("authentication challenge received, triggering session refresh");

        if !self.store.trigger_refresh().await {
            metrics::counter!(AUTH_REFRESH_FAILURE.name).increment(1);
            tracing::warn!("session refresh trigger failed");
            return RefreshOutcome::Failed;
        }

        // The backend needs a moment to mint the new session before the
        // probe can see it.
        tokio::time::sleep(self.settle_delay).await;

        if self.store.check_session().await {
            tracing::debug!("session refresh confirmed");
            RefreshOutcome::Refreshed
        } else {
            metrics::counter!(AUTH_REFRESH_FAILURE.name).increment(1);
            tracing::warn!("session still invalid after refresh");
            RefreshOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::MockSessionStore;
    use std::sync::atomic::Ordering;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn successful_flow_reports_refreshed() {
        let store = Arc::new(MockSessionStore::healthy());
        let refresher = AuthRefresher::new(store.clone(), Duration::from_millis(1500));

        assert_eq!(refresher.refresh().await, RefreshOutcome::Refreshed);
        assert_eq!(store.triggers.load(Ordering::SeqCst), 1);
        assert_eq!(store.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_waits_out_the_settle_delay() {
        let store = Arc::new(MockSessionStore::healthy());
        let refresher = AuthRefresher::new(store, Duration::from_millis(1500));

        let started = Instant::now();
        refresher.refresh().await;
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_trigger_skips_the_probe() {
        let store = Arc::new(MockSessionStore::new(false, true));
        let refresher = AuthRefresher::new(store.clone(), Duration::from_millis(1500));

        assert_eq!(refresher.refresh().await, RefreshOutcome::Failed);
        assert_eq!(store.probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probe_reports_failure() {
        let store = Arc::new(MockSessionStore::new(true, false));
        let refresher = AuthRefresher::new(store.clone(), Duration::from_millis(1500));

        assert_eq!(refresher.refresh().await, RefreshOutcome::Failed);
        assert_eq!(store.triggers.load(Ordering::SeqCst), 1);
        assert_eq!(store.probes.load(Ordering::SeqCst), 1);
    }
}
