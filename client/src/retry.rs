use crate::errors::{ClientError, Result};
use crate::metrics_defs::AUTH_RETRIES;
use crate::refresh::{AuthRefresher, RefreshOutcome};
use std::future::Future;

/// Wrap `op` with the single-retry auth policy.
///
/// An `AuthRequired` failure runs the refresh flow and, if it confirms a
/// session, reissues `op` exactly once; the second outcome stands as-is. A
/// second challenge after a confirmed refresh means the session is gone for
/// good, so it surfaces as `SessionExpired` rather than leaking the internal
/// variant.
pub async fn with_auth_retry<T, F, Fut>(refresher: &AuthRefresher, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Err(ClientError::AuthRequired) => {}
        outcome => return outcome,
    }

    match refresher.refresh().await {
        RefreshOutcome::Failed => Err(ClientError::SessionExpired),
        RefreshOutcome::Refreshed => {
            metrics::counter!(AUTH_RETRIES.name).increment(1);
            tracing::debug!("reissuing request after session refresh");
            match op().await {
                Err(ClientError::AuthRequired) => Err(ClientError::SessionExpired),
                outcome => outcome,
            }
        }
    }
}
