//! Push-style delivery of motorcycles to one subscriber per stream.
//!
//! Every stream is backed by a background task running [`emit_records`],
//! spawned by the service, never by the task that accepted the connection.
//! The subscriber side is a [`StreamHandle`]: it yields the events, exposes
//! the current [`StreamState`] and carries the cancellation hook.
//!
//! ## Structure
//!
//! - [`emitter`] - The emission loop.
//! - [`state`] - The stream state machine.

pub mod emitter;
pub mod state;

pub use emitter::emit_records;
pub use state::StreamState;

use crate::error::Result;
use core::{
    pin::Pin,
    task::{Context, Poll},
};
use futures::Stream;
use motostream_core::types::Motorcycle;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

/// Subscriber end of a single stream.
///
/// Yields `Ok(Motorcycle)` for every emitted record. The stream ends when the
/// emission task finishes; an `Err` item means the stream failed or was
/// cancelled and no further items follow.
///
/// Dropping the handle does not stop the emission task. Use
/// [`cancel`](Self::cancel) for that.
#[derive(Debug)]
pub struct StreamHandle {
    id: u64,
    events: ReceiverStream<Result<Motorcycle>>,
    state: watch::Receiver<StreamState>,
    cancel: CancellationToken,
}

impl StreamHandle {
    pub(crate) fn new(
        id: u64,
        events: mpsc::Receiver<Result<Motorcycle>>,
        state: watch::Receiver<StreamState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            events: ReceiverStream::new(events),
            state,
            cancel,
        }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Current state of the emission task.
    pub fn state(&self) -> StreamState {
        self.state.borrow().clone()
    }

    /// A receiver that outlives the handle, for observing the task after the
    /// subscriber has detached.
    pub fn state_watcher(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// Requests the emission task to stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits until the emission task has reached a terminal state.
    pub async fn finished(&self) -> StreamState {
        wait_terminal(self.state_watcher()).await
    }
}

impl Stream for StreamHandle {
    type Item = Result<Motorcycle>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().events).poll_next(cx)
    }
}

/// Waits on `watcher` until the stream reaches a terminal state.
///
/// If the emission task vanished without publishing one, the last observed
/// state is returned.
pub async fn wait_terminal(mut watcher: watch::Receiver<StreamState>) -> StreamState {
    let terminal = watcher
        .wait_for(StreamState::is_terminal)
        .await
        .map(|state| state.clone());
    terminal.unwrap_or_else(|_| watcher.borrow().clone())
}
