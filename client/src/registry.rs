use crate::errors::{ClientError, Result};
use crate::key::RequestKey;
use crate::metrics_defs::{ANALYSIS_DEDUP_JOIN, ANALYSIS_DEDUP_START, ANALYSIS_INFLIGHT};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

type Slot<T> = watch::Receiver<Option<Result<T>>>;

struct Inner<T> {
    entries: Mutex<HashMap<RequestKey, Slot<T>>>,
    grace: Duration,
}

/// Tracks in-flight operations by request key so concurrent callers share one
/// underlying call instead of issuing duplicates.
///
/// A settled entry stays joinable for a grace window to absorb rapid
/// duplicate triggers, then an eviction task removes it; the next call with
/// that key starts fresh. Operations are never cancelled: once a factory has
/// started, it runs to completion even if every caller has gone away.
#[derive(Clone)]
pub struct InflightRegistry<T> {
    inner: Arc<Inner<T>>,
}

impl<T> InflightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(grace: Duration) -> Self {
        InflightRegistry {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                grace,
            }),
        }
    }

    /// Join the in-flight operation for `key`, or start one via `factory`.
    /// Every caller observes the same resolved value or error.
    pub async fn get_or_start<F, Fut>(&self, key: RequestKey, factory: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut slot = {
            // Sync lock, never held across an await: the check-and-insert
            // below is what makes duplicate factory runs impossible.
            let mut entries = self.inner.entries.lock();
            match entries.entry(key.clone()) {
                Entry::Occupied(entry) => {
                    metrics::counter!(ANALYSIS_DEDUP_JOIN.name).increment(1);
                    tracing::debug!(%key, "joining in-flight request");
                    entry.get().clone()
                }
                Entry::Vacant(vacant) => {
                    metrics::counter!(ANALYSIS_DEDUP_START.name).increment(1);
                    metrics::gauge!(ANALYSIS_INFLIGHT.name).increment(1.0);
                    let (tx, rx) = watch::channel(None);
                    vacant.insert(rx.clone());
                    self.spawn_entry(key, factory(), tx);
                    rx
                }
            }
        };

        let outcome = slot
            .wait_for(|resolved| resolved.is_some())
            .await
            .map_err(|_| {
                ClientError::Internal("in-flight entry dropped before resolving".to_string())
            })?
            .clone();

        match outcome {
            Some(result) => result,
            None => Err(ClientError::Internal(
                "in-flight entry resolved without a value".to_string(),
            )),
        }
    }

    fn spawn_entry<Fut>(
        &self,
        key: RequestKey,
        operation: Fut,
        tx: watch::Sender<Option<Result<T>>>,
    ) where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            // Run the operation on its own task so a panic still settles and
            // evicts the entry instead of wedging it.
            let result = match tokio::spawn(operation).await {
                Ok(result) => result,
                Err(err) => Err(ClientError::Internal(format!("analysis task failed: {err}"))),
            };

            // Send fails only when every receiver is gone; the entry still
            // lingers for the grace window so late duplicates get the result.
            let _ = tx.send(Some(result));

            tokio::time::sleep(inner.grace).await;
            inner.entries.lock().remove(&key);
            metrics::gauge!(ANALYSIS_INFLIGHT.name).decrement(1.0);
            tracing::trace!(%key, "evicted settled request entry");
        });
    }

    #[cfg(test)]
    fn contains(&self, key: &RequestKey) -> bool {
        self.inner.entries.lock().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(document: &str) -> RequestKey {
        RequestKey::for_document(document, Some("sess")).unwrap()
    }

    fn counting_op(
        calls: Arc<AtomicUsize>,
        delay: Duration,
        outcome: Result<String>,
    ) -> impl Future<Output = Result<String>> + Send + 'static {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            outcome
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_operation() {
        let registry = InflightRegistry::new(Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = registry.get_or_start(key("doc1"), || {
            counting_op(
                calls.clone(),
                Duration::from_millis(50),
                Ok("report".to_string()),
            )
        });
        let second = registry.get_or_start(key("doc1"), || {
            counting_op(
                calls.clone(),
                Duration::from_millis(50),
                Ok("report".to_string()),
            )
        });

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap(), "report");
        assert_eq!(second.unwrap(), "report");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_duplicate_calls_join_the_same_run() {
        let registry = InflightRegistry::new(Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let registry = registry.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                registry
                    .get_or_start(key("doc1"), || {
                        counting_op(
                            calls,
                            Duration::from_millis(50),
                            Ok("report".to_string()),
                        )
                    })
                    .await
            })
        };

        // Second trigger lands 10ms into the 50ms run.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = registry
            .get_or_start(key("doc1"), || {
                counting_op(
                    calls.clone(),
                    Duration::from_millis(50),
                    Ok("report".to_string()),
                )
            })
            .await;

        assert_eq!(first.await.unwrap().unwrap(), "report");
        assert_eq!(second.unwrap(), "report");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn joined_callers_share_errors_too() {
        let registry: InflightRegistry<String> = InflightRegistry::new(Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));
        let failure = Err(ClientError::NotFound("document missing".to_string()));

        let first = registry.get_or_start(key("doc1"), || {
            counting_op(calls.clone(), Duration::from_millis(50), failure.clone())
        });
        let second = registry.get_or_start(key("doc1"), || {
            counting_op(calls.clone(), Duration::from_millis(50), failure.clone())
        });

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap_err(), second.unwrap_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_keys_run_independently() {
        let registry = InflightRegistry::new(Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = registry.get_or_start(key("doc1"), || {
            counting_op(calls.clone(), Duration::from_millis(50), Ok("a".to_string()))
        });
        let second = registry.get_or_start(key("doc2"), || {
            counting_op(calls.clone(), Duration::from_millis(50), Ok("b".to_string()))
        });

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap(), "a");
        assert_eq!(second.unwrap(), "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_entry_is_served_within_the_grace_window() {
        let registry = InflightRegistry::new(Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = registry
            .get_or_start(key("doc1"), || {
                counting_op(
                    calls.clone(),
                    Duration::from_millis(50),
                    Ok("report".to_string()),
                )
            })
            .await;
        assert_eq!(first.unwrap(), "report");

        // Still inside the grace window: the cached outcome answers.
        let again = registry
            .get_or_start(key("doc1"), || {
                counting_op(
                    calls.clone(),
                    Duration::from_millis(50),
                    Ok("other".to_string()),
                )
            })
            .await;
        assert_eq!(again.unwrap(), "report");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_is_evicted_after_the_grace_window() {
        let registry = InflightRegistry::new(Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = registry
            .get_or_start(key("doc1"), || {
                counting_op(
                    calls.clone(),
                    Duration::from_millis(50),
                    Ok("report".to_string()),
                )
            })
            .await;
        assert_eq!(first.unwrap(), "report");
        assert!(registry.contains(&key("doc1")));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!registry.contains(&key("doc1")));

        // A fresh call starts a fresh run.
        let second = registry
            .get_or_start(key("doc1"), || {
                counting_op(
                    calls.clone(),
                    Duration::from_millis(50),
                    Ok("fresh".to_string()),
                )
            })
            .await;
        assert_eq!(second.unwrap(), "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn panicked_operation_settles_with_an_error() {
        let registry: InflightRegistry<String> = InflightRegistry::new(Duration::from_secs(1));

        let result = registry
            .get_or_start(key("doc1"), || async { panic!("analysis blew up") })
            .await;
        assert!(matches!(result.unwrap_err(), ClientError::Internal(_)));

        // The entry still gets evicted afterwards.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!registry.contains(&key("doc1")));
    }
}
