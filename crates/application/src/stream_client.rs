use std::sync::Arc;
use std::time::Duration;

use domain::alert::entity::AlertRecord;
use domain::alert::feed::AlertFeed;
use domain::alert::session::ConnectionState;
use domain::common::entity::Identity;
use ports::secondary::push_channel::{PushChannel, PushConnection};
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;

/// Owned push-channel session for one identity.
///
/// A spawned task drives the connection state machine: Connecting → Open,
/// then back through PendingRetry after every close or transport error,
/// with a fixed delay between attempts and no retry cap. Connection
/// failures never surface to the subscriber; availability of the feed is
/// preferred over bounding retry cost.
///
/// `close()` cancels the pending retry (if any), releases the live
/// connection, and drives the machine to Terminated. It is idempotent,
/// and dropping the client implies it.
pub struct StreamClient {
    cancel: CancellationToken,
    state_rx: watch::Receiver<ConnectionState>,
    // Option so shutdown() can take the handle out from under Drop.
    task: Option<tokio::task::JoinHandle<()>>,
}

impl StreamClient {
    /// Establish a session for `identity`, feeding validated records into
    /// `feed` and bumping `changes` on every accepted insert.
    ///
    /// The caller is responsible for having torn down any prior session
    /// first; each subscriber owns at most one `StreamClient` at a time.
    pub fn open(
        channel: Arc<dyn PushChannel>,
        identity: Identity,
        feed: Arc<RwLock<AlertFeed>>,
        changes: watch::Sender<u64>,
        reconnect_delay: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let task = tokio::spawn(run_session(
            channel,
            identity,
            feed,
            changes,
            reconnect_delay,
            cancel.clone(),
            state_tx,
        ));

        Self {
            cancel,
            state_rx,
            task: Some(task),
        }
    }

    /// Current session state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch session state changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Request teardown without waiting for it. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Tear down and wait until the session task has fully exited, so a
    /// successor session can be established without overlap.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Apply a state transition, ignoring ones the machine does not allow
/// (e.g. a retry transition racing a concurrent teardown).
fn transition(state_tx: &watch::Sender<ConnectionState>, next: ConnectionState) {
    state_tx.send_if_modified(|current| {
        if current.can_transition_to(next) {
            *current = next;
            true
        } else {
            false
        }
    });
}

async fn run_session(
    channel: Arc<dyn PushChannel>,
    identity: Identity,
    feed: Arc<RwLock<AlertFeed>>,
    changes: watch::Sender<u64>,
    reconnect_delay: Duration,
    cancel: CancellationToken,
    state_tx: watch::Sender<ConnectionState>,
) {
    loop {
        transition(&state_tx, ConnectionState::Connecting);

        let connected = tokio::select! {
            () = cancel.cancelled() => break,
            result = channel.connect(&identity) => result,
        };

        match connected {
            Ok(conn) => {
                transition(&state_tx, ConnectionState::Open);
                tracing::info!(identity = %identity, "push connection open");
                if !drain_connection(conn, &feed, &changes, &cancel).await {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "push connection attempt failed");
            }
        }

        transition(&state_tx, ConnectionState::PendingRetry);
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(reconnect_delay) => {}
        }
    }

    transition(&state_tx, ConnectionState::Terminated);
    tracing::debug!(identity = %identity, "push session terminated");
}

/// Receive until the connection closes or teardown is requested.
/// Returns false when the session should stop retrying (teardown).
async fn drain_connection(
    mut conn: Box<dyn PushConnection>,
    feed: &Arc<RwLock<AlertFeed>>,
    changes: &watch::Sender<u64>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        let message = tokio::select! {
            () = cancel.cancelled() => return false,
            msg = conn.next_message() => msg,
        };

        match message {
            Some(Ok(payload)) => deliver(&payload, feed, changes).await,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "push connection lost");
                return true;
            }
            None => {
                tracing::info!("push connection closed by server");
                return true;
            }
        }
    }
}

/// Parse one pushed payload and insert it into the feed.
///
/// A malformed payload is logged and dropped; it neither terminates the
/// connection nor surfaces an error. Duplicate deliveries are absorbed by
/// the feed's idempotent insert — no separate bookkeeping here.
async fn deliver(payload: &[u8], feed: &Arc<RwLock<AlertFeed>>, changes: &watch::Sender<u64>) {
    let record: AlertRecord = match serde_json::from_slice(payload) {
        Ok(rec) => rec,
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed push message");
            return;
        }
    };

    let id = record.id.clone();
    let inserted = feed.write().await.insert(record);
    if inserted {
        tracing::debug!(alert_id = %id, "alert inserted from stream");
        changes.send_modify(|n| *n += 1);
    } else {
        tracing::debug!(alert_id = %id, "duplicate stream delivery absorbed");
    }
}
