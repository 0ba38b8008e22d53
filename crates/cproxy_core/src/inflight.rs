//! Per-path single-flight for origin fetches.

use std::{future::Future, sync::Arc};

use cproxy_origin::{OriginError, OriginResponse};
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

type FetchResult = Result<OriginResponse, OriginError>;

/// Concurrent misses on one path await the same fetch.
///
/// Whoever initializes the cell runs the fetch (and the store that goes with
/// it); everybody else gets a clone of its result. If that caller is dropped
/// mid-fetch, `OnceCell` hands initialization to the next waiter.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    calls: DashMap<String, Arc<OnceCell<FetchResult>>>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    pub(crate) async fn run<F, Fut>(&self, key: &str, fetch: F) -> FetchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
    {
        let cell = self
            .calls
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        if cell.initialized() {
            debug!(target: "cproxy::router", path = %key, "Joining completed in-flight fetch");
        }

        let result = cell.get_or_init(fetch).await.clone();

        // Only drop the cell we used; a newer one may already be registered.
        self.calls
            .remove_if(key, |_, current| Arc::ptr_eq(current, &cell));

        result
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use http::StatusCode;
    use tokio::time::{sleep, Duration};

    use super::*;

    fn ok(body: &'static [u8]) -> FetchResult {
        Ok(OriginResponse {
            status: StatusCode::OK,
            content_type: None,
            body: Bytes::from_static(body),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_fetch() {
        let inflight = Arc::new(InFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let inflight = inflight.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    inflight
                        .run("/race", || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            sleep(Duration::from_millis(50)).await;
                            ok(b"shared")
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let result = task.await.expect("task panicked").expect("expected ok");
            assert_eq!(result.body, Bytes::from_static(b"shared"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(inflight.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_leader_hands_fetch_to_waiter() {
        let inflight = Arc::new(InFlight::new());

        let leader = {
            let inflight = inflight.clone();
            tokio::spawn(async move {
                inflight
                    .run("/slow", || async {
                        sleep(Duration::from_secs(60)).await;
                        ok(b"a")
                    })
                    .await
            })
        };
        sleep(Duration::from_millis(1)).await;

        let waiter = {
            let inflight = inflight.clone();
            tokio::spawn(async move {
                inflight
                    .run("/slow", || async {
                        sleep(Duration::from_millis(10)).await;
                        ok(b"b")
                    })
                    .await
            })
        };
        sleep(Duration::from_millis(1)).await;

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        let result = waiter.await.expect("task panicked").expect("expected ok");
        assert_eq!(result.body, Bytes::from_static(b"b"));
        assert_eq!(inflight.len(), 0);
    }

    #[tokio::test]
    async fn sequential_calls_fetch_again() {
        let inflight = InFlight::new();
        let first = inflight.run("/p", || async { ok(b"one") }).await;
        let second = inflight.run("/p", || async { ok(b"two") }).await;

        assert_eq!(first.expect("ok").body, Bytes::from_static(b"one"));
        assert_eq!(second.expect("ok").body, Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn errors_are_shared_but_not_retained() {
        let inflight = InFlight::new();
        let err = inflight
            .run("/down", || async { Err(OriginError::unavailable("refused")) })
            .await
            .unwrap_err();
        assert_eq!(err, OriginError::unavailable("refused"));
        assert_eq!(inflight.len(), 0);
    }
}
