//! Polling Transport - Fixed-delay Status Requests
//!
//! Calls the `StatusFetcher` port in a loop. Each cycle is scheduled
//! `interval` after the previous attempt settles, success or failure,
//! so a slow backend stretches the period instead of piling up
//! requests.
//!
//! Failure policy:
//! - Every failure emits `TransportError(Fetch)`
//! - A success resets the consecutive-failure counter
//! - Reaching `max_retries` emits `Closed { was_clean: false }` and exits

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::handle::{Emitter, EventSink, TransportHandle};
use crate::domain::{ConfigError, FeedEvent, TransportError, TransportKind};
use crate::ports::status_source::StatusFetcher;

/// Interval-based request/response transport.
#[derive(Clone)]
pub struct PollingTransport {
    /// Collaborator performing the authenticated request.
    fetcher: Arc<dyn StatusFetcher>,
    /// Delay after each settled attempt.
    interval: Duration,
    /// Consecutive failures before the transport closes.
    max_retries: u32,
}

impl PollingTransport {
    pub fn new(fetcher: Arc<dyn StatusFetcher>, interval: Duration, max_retries: u32) -> Self {
        Self {
            fetcher,
            interval,
            max_retries,
        }
    }

    /// Spawn the polling loop. The first request is issued immediately.
    ///
    /// # Errors
    /// `ConfigError::InvalidInterval` for a zero interval and
    /// `ConfigError::InvalidRetryLimit` for a zero retry budget.
    /// No task is spawned in either case.
    #[instrument(skip(self, sink), fields(generation = sink.generation()))]
    pub fn start(&self, sink: EventSink) -> Result<TransportHandle, ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidRetryLimit);
        }

        let (mut handle, emitter) = TransportHandle::new(TransportKind::Poll, sink);
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.fetcher),
            self.interval,
            self.max_retries,
            emitter,
        ));
        // In-flight requests are allowed to settle; the gate discards them.
        handle.attach(task, false);

        info!(
            interval_ms = self.interval.as_millis(),
            max_retries = self.max_retries,
            "Polling transport started"
        );
        Ok(handle)
    }
}

async fn poll_loop(
    fetcher: Arc<dyn StatusFetcher>,
    interval: Duration,
    max_retries: u32,
    emitter: Emitter,
) {
    let mut failures: u32 = 0;

    loop {
        let result = fetcher.fetch_status().await;

        if emitter.is_stopped() {
            debug!("Polling stopped during request, result discarded");
            return;
        }

        match result {
            Ok(payload) => {
                failures = 0;
                emitter.emit(FeedEvent::Data(payload));
            }
            Err(e) => {
                failures += 1;
                warn!(error = %e, failures, max_retries, "Status poll failed");
                emitter.emit(FeedEvent::TransportError(TransportError::Fetch(format!(
                    "{e:#}"
                ))));

                if failures >= max_retries {
                    warn!(failures, "Polling retries exhausted, closing transport");
                    emitter.emit(FeedEvent::Closed { was_clean: false });
                    return;
                }
            }
        }

        tokio::select! {
            biased;
            () = emitter.cancelled() => {
                debug!("Polling stopped, pending cycle cancelled");
                return;
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::domain::StatusPayload;

    /// Fetcher that replays a script, then keeps succeeding.
    struct ScriptedFetcher {
        script: Mutex<VecDeque<anyhow::Result<StatusPayload>>>,
        calls: AtomicU32,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<anyhow::Result<StatusPayload>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl StatusFetcher for ScriptedFetcher {
        async fn fetch_status(&self) -> anyhow::Result<StatusPayload> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({ "cycle": n })))
        }
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let transport = PollingTransport::new(fetcher.clone(), Duration::ZERO, 3);
        let (sink, _rx) = EventSink::channel(1);

        let err = transport.start(sink).unwrap_err();
        assert_eq!(err, ConfigError::InvalidInterval);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_closes_once() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(anyhow::anyhow!("boom 1")),
            Err(anyhow::anyhow!("boom 2")),
            Err(anyhow::anyhow!("boom 3")),
        ]);
        let transport = PollingTransport::new(fetcher.clone(), Duration::from_millis(100), 3);
        let (sink, mut rx) = EventSink::channel(1);
        let handle = transport.start(sink).unwrap();

        for _ in 0..3 {
            let env = rx.recv().await.unwrap();
            assert!(matches!(env.event, FeedEvent::TransportError(TransportError::Fetch(_))));
        }
        let env = rx.recv().await.unwrap();
        assert_eq!(env.event, FeedEvent::Closed { was_clean: false });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_counter() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(anyhow::anyhow!("a")),
            Ok(json!({ "ok": true })),
            Err(anyhow::anyhow!("b")),
        ]);
        let transport = PollingTransport::new(fetcher, Duration::from_millis(50), 2);
        let (sink, mut rx) = EventSink::channel(1);
        let _handle = transport.start(sink).unwrap();

        let mut labels = Vec::new();
        for _ in 0..4 {
            labels.push(rx.recv().await.unwrap().event.label());
        }
        assert_eq!(labels, ["transport_error", "data", "transport_error", "data"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_are_spaced_by_interval() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let transport = PollingTransport::new(fetcher, Duration::from_secs(3), 5);
        let (sink, mut rx) = EventSink::channel(1);
        let _handle = transport.start(sink).unwrap();

        let start = tokio::time::Instant::now();
        rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
        rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_cycle() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let transport = PollingTransport::new(fetcher.clone(), Duration::from_secs(1), 5);
        let (sink, mut rx) = EventSink::channel(1);
        let handle = transport.start(sink).unwrap();

        rx.recv().await.unwrap();
        assert!(handle.stop());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
