//! Motorcycle service implementation.
//!
//! This module defines [`MotorcycleService`], which answers the three
//! operations of the HTTP surface against a shared [`MotorcycleStore`]. Every
//! answer is preceded by the configured delay to model a slow backend.
//!
//! ## Responsibilities
//!
//! - Point lookups of a motorcycle or its specification.
//! - Spawning one tracked, cancellable emission task per stream.
//! - Refusing new work and draining open streams on shutdown.

use crate::{
    config::ServerConfig,
    error::{Error, Result},
    store::MotorcycleStore,
    streaming::{StreamHandle, StreamState, emit_records},
    telemetry::{
        decrement_streams_inflight, increment_items_streamed, increment_not_found,
        increment_requests, increment_stream_errors, increment_streams_inflight,
        record_stream_duration,
    },
};
use core::time::Duration;
use futures::Stream;
use motostream_core::types::{Motorcycle, MotorcycleId, Specification};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tokio::{
    sync::{mpsc, watch},
    time::{sleep, timeout},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::Instrument;

/// Time granted to cancelled emission tasks to exit during shutdown.
const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// Read-only motorcycle service with simulated latency.
///
/// Cloning is cheap; all clones share the store, the stream tracker and the
/// shutdown state.
#[derive(Clone)]
pub struct MotorcycleService {
    config: ServerConfig,
    store: Arc<MotorcycleStore>,
    streams: TaskTracker,
    shutdown_token: CancellationToken,
    accepting: Arc<AtomicBool>,
    next_stream_id: Arc<AtomicU64>,
}

impl MotorcycleService {
    /// Creates a service over an already populated store.
    pub fn new(store: Arc<MotorcycleStore>, config: ServerConfig) -> Self {
        Self {
            config,
            store,
            streams: TaskTracker::new(),
            shutdown_token: CancellationToken::new(),
            accepting: Arc::new(AtomicBool::new(true)),
            next_stream_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &Arc<MotorcycleStore> {
        &self.store
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of emission tasks that have not finished yet, including those
    /// whose subscriber already detached.
    pub fn streams_in_flight(&self) -> usize {
        self.streams.len()
    }

    /// Fetches a single motorcycle after the simulated delay.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `id` is unknown.
    /// - [`Error::ServiceShutdown`] if shutdown has begun.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn fetch_motorcycle(&self, id: &MotorcycleId) -> Result<Motorcycle> {
        self.ensure_accepting()?;
        increment_requests();
        sleep(self.config.delay).await;

        tracing::debug!("Request for motorcycle data, id: {id}");
        self.lookup(id)
    }

    /// Fetches the specification of a single motorcycle after the simulated
    /// delay.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `id` is unknown.
    /// - [`Error::ServiceShutdown`] if shutdown has begun.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn fetch_specification(&self, id: &MotorcycleId) -> Result<Specification> {
        self.ensure_accepting()?;
        increment_requests();
        sleep(self.config.delay).await;

        tracing::debug!("Request for specification for motorcycle id: {id}");
        self.lookup(id).map(|moto| moto.specs)
    }

    /// Opens a stream over a snapshot of every motorcycle in the store.
    ///
    /// Items are emitted in [`MotorcycleStore::list`] order, one per delay,
    /// by a background task. The handle is returned immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] if shutdown has begun.
    pub fn stream_all(&self) -> Result<StreamHandle> {
        self.ensure_accepting()?;
        let records = self.store.list();
        self.stream_from(futures::stream::iter(records.into_iter().map(Ok)))
    }

    /// Opens a stream over an arbitrary record source.
    ///
    /// An `Err` from `source` ends the stream in [`StreamState::Failed`] after
    /// forwarding the error to the subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] if shutdown has begun.
    pub fn stream_from<S>(&self, source: S) -> Result<StreamHandle>
    where
        S: Stream<Item = Result<Motorcycle>> + Send + 'static,
    {
        self.ensure_accepting()?;
        increment_requests();

        let stream_id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.config.stream_buffer_size);
        let (state_tx, state_rx) = watch::channel(StreamState::Open);
        let cancel = self.shutdown_token.child_token();
        let delay = self.config.delay;

        increment_streams_inflight();
        let fut = {
            let cancel = cancel.clone();
            async move {
                let start = std::time::Instant::now();
                let outcome = emit_records(source, delay, tx, state_tx, cancel).await;

                decrement_streams_inflight();
                increment_items_streamed(outcome.emitted() as u64);
                record_stream_duration(start.elapsed().as_millis() as f64);

                match &outcome {
                    StreamState::Completed { emitted } => {
                        tracing::info!("Stream completed after {emitted} items");
                    }
                    StreamState::Failed { emitted, reason } => {
                        increment_stream_errors();
                        tracing::warn!("Stream failed after {emitted} items: {reason}");
                    }
                    StreamState::Cancelled { emitted } => {
                        increment_stream_errors();
                        tracing::info!("Stream cancelled after {emitted} items");
                    }
                    StreamState::Open | StreamState::Emitting { .. } => {}
                }
            }
        };

        let span = tracing::info_span!("stream", stream_id);
        self.streams.spawn(fut.instrument(span));
        tracing::debug!("Opened stream {stream_id}");

        Ok(StreamHandle::new(stream_id, rx, state_rx, cancel))
    }

    /// Gracefully shuts the service down.
    ///
    /// - Refuses new requests with [`Error::ServiceShutdown`].
    /// - Waits up to `shutdown_timeout` for open streams to finish.
    /// - Cancels whatever is still running and waits briefly for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutdownTimedOut`] if emission tasks are still running
    /// after cancellation.
    pub async fn shutdown(&self) -> Result<()> {
        // === Phase 0: Stop accepting new requests ===
        tracing::info!("Refusing new requests");
        self.accepting.store(false, Ordering::Release);
        self.streams.close();

        // === Phase 1: Wait for in-flight streams to drain ===
        tracing::info!("Draining in-flight streams ({} active)", self.streams.len());
        if timeout(self.config.shutdown_timeout, self.streams.wait())
            .await
            .is_ok()
        {
            tracing::debug!("All in-flight streams drained successfully");
            return Ok(());
        }

        // === Phase 2: Cancel any remaining streams ===
        tracing::warn!(
            "Graceful drain timed out ({} streams still active), cancelling",
            self.streams.len()
        );
        self.shutdown_token.cancel();

        match timeout(CANCEL_GRACE, self.streams.wait()).await {
            Ok(()) => {
                tracing::info!("Stream shutdown complete");
                Ok(())
            }
            Err(_) => Err(Error::ShutdownTimedOut {
                in_flight: self.streams.len(),
            }),
        }
    }

    fn ensure_accepting(&self) -> Result<()> {
        if self.accepting.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::ServiceShutdown)
        }
    }

    fn lookup(&self, id: &MotorcycleId) -> Result<Motorcycle> {
        self.store.get(id).ok_or_else(|| {
            increment_not_found();
            Error::not_found(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{loader::reference_dataset, streaming::wait_terminal};
    use futures::{StreamExt, TryStreamExt, future::join_all};
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_millis(2000);

    fn service() -> MotorcycleService {
        let store = Arc::new(MotorcycleStore::with_records(reference_dataset()).unwrap());
        MotorcycleService::new(store, ServerConfig::with_delay(DELAY))
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_returns_requested_id_after_delay() {
        let service = service();
        let start = Instant::now();

        for id in ["1", "2", "3", "4"] {
            let moto = service.fetch_motorcycle(&id.into()).await.unwrap();
            assert_eq!(moto.id.as_str(), id);
        }

        assert!(start.elapsed() >= DELAY * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_v_strom() {
        let moto = service().fetch_motorcycle(&"2".into()).await.unwrap();
        assert_eq!(moto.make, "Suzuki");
        assert_eq!(moto.model, "V-Strom 650");
        assert_eq!(moto.specs, Specification::new(2005, "black", 15500.0));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_id_is_not_found() {
        let service = service();
        let err = service.fetch_motorcycle(&"9".into()).await.unwrap_err();
        assert_eq!(err, Error::NotFound { id: "9".into() });

        // The service keeps answering afterwards.
        assert!(service.fetch_motorcycle(&"1".into()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn specification_of_unknown_id_is_not_found() {
        let err = service()
            .fetch_specification(&"9".into())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn specification_belongs_to_requested_motorcycle() {
        let specs = service().fetch_specification(&"4".into()).await.unwrap();
        assert_eq!(specs, Specification::new(1997, "green", 12000.0));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_fetches_are_equal() {
        let service = service();
        let a = service.fetch_motorcycle(&"3".into()).await.unwrap();
        let b = service.fetch_motorcycle(&"3".into()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_overlap() {
        let service = service();
        let start = Instant::now();

        let ids: Vec<MotorcycleId> = (1..=4_usize).map(MotorcycleId::from).collect();
        let results = join_all(ids.iter().map(|id| service.fetch_motorcycle(id))).await;

        assert!(results.iter().all(Result::is_ok));
        assert!(start.elapsed() < DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_all_emits_store_order_then_completes() {
        let service = service();
        let handle = service.stream_all().unwrap();
        let watcher = handle.state_watcher();

        let received: Vec<Motorcycle> = handle.try_collect().await.unwrap();

        assert_eq!(received, service.store().list());
        assert_eq!(
            wait_terminal(watcher).await,
            StreamState::Completed { emitted: 4 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stream_from_failing_source_ends_with_error() {
        let service = service();
        let source = futures::stream::iter(vec![
            Ok(service.store().list().remove(0)),
            Err(Error::StreamFailure {
                reason: "source broke".to_string(),
            }),
        ]);
        let mut handle = service.stream_from(source).unwrap();

        assert!(handle.next().await.unwrap().is_ok());
        assert!(handle.next().await.unwrap().is_err());
        assert!(handle.next().await.is_none());
        assert!(matches!(
            handle.finished().await,
            StreamState::Failed { emitted: 1, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn detached_stream_keeps_running_until_next_push() {
        let service = service();
        let mut handle = service.stream_all().unwrap();
        let watcher = handle.state_watcher();

        handle.next().await.unwrap().unwrap();
        drop(handle);

        assert_eq!(service.streams_in_flight(), 1);

        let outcome = wait_terminal(watcher).await;
        assert!(matches!(outcome, StreamState::Failed { .. }));

        service.streams.close();
        service.streams.wait().await;
        assert_eq!(service.streams_in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn handle_cancel_stops_the_stream() {
        let service = service();
        let mut handle = service.stream_all().unwrap();

        handle.next().await.unwrap().unwrap();
        handle.cancel();

        assert!(matches!(
            handle.next().await,
            Some(Err(Error::StreamCancelled))
        ));
        assert_eq!(
            handle.finished().await,
            StreamState::Cancelled { emitted: 1 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_refuses_new_work() {
        let service = service();
        service.shutdown().await.unwrap();

        assert_eq!(
            service.fetch_motorcycle(&"1".into()).await.unwrap_err(),
            Error::ServiceShutdown
        );
        assert!(matches!(service.stream_all(), Err(Error::ServiceShutdown)));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_streams_that_outlive_the_drain() {
        let store = Arc::new(MotorcycleStore::with_records(reference_dataset()).unwrap());
        let config = ServerConfig {
            shutdown_timeout: Duration::from_secs(1),
            ..ServerConfig::with_delay(DELAY)
        };
        let service = MotorcycleService::new(store, config);

        let handle = service.stream_all().unwrap();
        let watcher = handle.state_watcher();

        service.shutdown().await.unwrap();

        assert!(matches!(
            wait_terminal(watcher).await,
            StreamState::Cancelled { .. }
        ));
        assert_eq!(service.streams_in_flight(), 0);
    }
}
