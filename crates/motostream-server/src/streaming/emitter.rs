use crate::{
    error::{Error, Result},
    streaming::state::StreamState,
};
use core::time::Duration;
use futures::{Stream, StreamExt};
use motostream_core::types::Motorcycle;
use tokio::{
    sync::{mpsc, watch},
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

/// How long a cancelled stream waits for the subscriber to make room for the
/// cancellation error.
pub const CANCEL_NOTIFY_TIMEOUT: Duration = Duration::from_millis(250);

/// Pushes every record of `source` to a single subscriber.
///
/// This is the body of a stream's background task. For each record it waits
/// `delay`, then sends the record on `tx`. Progress is published on `state`
/// and the terminal [`StreamState`] is also returned.
///
/// # Behavior
///
/// - Source exhausted: [`StreamState::Completed`]; `tx` is dropped, which the
///   subscriber observes as the normal end of the stream.
/// - Source yields an error: the error is forwarded to the subscriber, then
///   [`StreamState::Failed`].
/// - Subscriber gone: detected only when the next send fails, i.e. after the
///   next delay has elapsed. Detaching does not stop the task earlier.
/// - `cancel` fired: [`Error::StreamCancelled`] is forwarded, waiting up to
///   [`CANCEL_NOTIFY_TIMEOUT`] for room in the channel, then
///   [`StreamState::Cancelled`].
pub async fn emit_records<S>(
    source: S,
    delay: Duration,
    tx: mpsc::Sender<Result<Motorcycle>>,
    state: watch::Sender<StreamState>,
    cancel: CancellationToken,
) -> StreamState
where
    S: Stream<Item = Result<Motorcycle>>,
{
    let mut source = core::pin::pin!(source);
    let mut emitted = 0;
    state.send_replace(StreamState::Emitting { emitted });

    let outcome = loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break cancelled(&tx, emitted).await,
            next = source.next() => next,
        };

        let moto = match next {
            None => break StreamState::Completed { emitted },
            Some(Ok(moto)) => moto,
            Some(Err(e)) => {
                let reason = e.to_string();
                if tx.send(Err(e)).await.is_err() {
                    tracing::debug!("Subscriber gone before source error could be delivered");
                }
                break StreamState::Failed { emitted, reason };
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => break cancelled(&tx, emitted).await,
            () = sleep(delay) => {}
        }

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => break cancelled(&tx, emitted).await,
            sent = tx.send(Ok(moto)) => sent,
        };

        if sent.is_err() {
            break StreamState::Failed {
                emitted,
                reason: Error::SubscriberGone.to_string(),
            };
        }

        emitted += 1;
        tracing::trace!("Emitted item {emitted}");
        state.send_replace(StreamState::Emitting { emitted });
    };

    state.send_replace(outcome.clone());
    outcome
}

async fn cancelled(tx: &mpsc::Sender<Result<Motorcycle>>, emitted: usize) -> StreamState {
    match timeout(CANCEL_NOTIFY_TIMEOUT, tx.send(Err(Error::StreamCancelled))).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => tracing::debug!("Subscriber gone before cancellation could be delivered"),
        Err(_) => tracing::warn!("Subscriber did not drain in time, cancellation not delivered"),
    }
    StreamState::Cancelled { emitted }
}
