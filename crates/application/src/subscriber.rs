use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use domain::alert::entity::{AlertId, AlertRecord};
use domain::alert::feed::AlertFeed;
use domain::alert::session::ConnectionState;
use domain::common::entity::Identity;
use ports::secondary::alert_api::AlertApi;
use ports::secondary::push_channel::PushChannel;
use tokio::sync::{Mutex, RwLock, watch};

use crate::read_state::ReadStateSync;
use crate::snapshot::load_snapshot;
use crate::stream_client::StreamClient;

/// One subscriber's alert view: a feed, at most one live push session,
/// and the read-state synchronizer, all scoped to the active identity.
///
/// `activate` supersedes any previous identity: the prior session is shut
/// down before the new one is established, the feed is rebuilt, and an
/// epoch counter guarantees that completions still in flight for the old
/// identity (snapshot, commands) cannot touch the new state.
///
/// Consumers observe the feed through the cheap read accessors plus a
/// watch sequence number that bumps on every visible change.
pub struct AlertSubscriber {
    api: Arc<dyn AlertApi>,
    channel: Arc<dyn PushChannel>,
    reconnect_delay: Duration,
    feed: Arc<RwLock<AlertFeed>>,
    changes: watch::Sender<u64>,
    loading: Arc<AtomicBool>,
    load_error: Arc<AtomicBool>,
    epoch: Arc<AtomicU64>,
    read_sync: ReadStateSync,
    active: Mutex<Option<ActiveSession>>,
}

struct ActiveSession {
    identity: Identity,
    stream: StreamClient,
}

impl AlertSubscriber {
    pub fn new(
        api: Arc<dyn AlertApi>,
        channel: Arc<dyn PushChannel>,
        reconnect_delay: Duration,
    ) -> Self {
        let feed = Arc::new(RwLock::new(AlertFeed::new()));
        let (changes, _) = watch::channel(0);
        let read_sync = ReadStateSync::new(Arc::clone(&api), Arc::clone(&feed), changes.clone());
        Self {
            api,
            channel,
            reconnect_delay,
            feed,
            changes,
            loading: Arc::new(AtomicBool::new(false)),
            load_error: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
            read_sync,
            active: Mutex::new(None),
        }
    }

    /// Switch to `identity`: tear down any prior session, start the
    /// snapshot load, and open the push session. The snapshot resolves in
    /// the background; stream records arriving first are preserved by the
    /// feed's merge semantics.
    pub async fn activate(&self, identity: Identity) {
        let mut active = self.active.lock().await;
        self.teardown_locked(&mut active).await;

        tracing::info!(identity = %identity, "activating alert subscription");
        self.loading.store(true, Ordering::SeqCst);
        self.load_error.store(false, Ordering::SeqCst);

        let epoch = self.epoch.load(Ordering::SeqCst);
        tokio::spawn(apply_snapshot(
            Arc::clone(&self.api),
            identity.clone(),
            Arc::clone(&self.feed),
            self.changes.clone(),
            Arc::clone(&self.loading),
            Arc::clone(&self.load_error),
            Arc::clone(&self.epoch),
            epoch,
        ));

        let stream = StreamClient::open(
            Arc::clone(&self.channel),
            identity.clone(),
            Arc::clone(&self.feed),
            self.changes.clone(),
            self.reconnect_delay,
        );

        *active = Some(ActiveSession { identity, stream });
    }

    /// Clear the identity: close the session, cancel any pending retry,
    /// and discard the feed. In-flight completions for the cleared
    /// identity become no-ops.
    pub async fn deactivate(&self) {
        let mut active = self.active.lock().await;
        self.teardown_locked(&mut active).await;
    }

    async fn teardown_locked(&self, active: &mut Option<ActiveSession>) {
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(session) = active.take() {
            tracing::info!(identity = %session.identity, "tearing down alert subscription");
            session.stream.shutdown().await;
        }

        self.feed.write().await.replace(Vec::new());
        self.loading.store(false, Ordering::SeqCst);
        self.load_error.store(false, Ordering::SeqCst);
        self.changes.send_modify(|n| *n += 1);
    }

    /// Mark one alert read (optimistic; see [`ReadStateSync`]).
    pub async fn mark_read(&self, id: &AlertId) {
        let identity = self.current_identity().await;
        let Some(identity) = identity else {
            return;
        };
        self.read_sync.mark_one_read(&identity, id).await;
    }

    /// Mark all alerts read (optimistic; no-op when nothing is unread).
    pub async fn mark_all_read(&self) {
        let identity = self.current_identity().await;
        let Some(identity) = identity else {
            return;
        };
        self.read_sync.mark_all_read(&identity).await;
    }

    pub async fn current_identity(&self) -> Option<Identity> {
        self.active.lock().await.as_ref().map(|s| s.identity.clone())
    }

    /// Ordered records, newest first.
    pub async fn records(&self) -> Vec<AlertRecord> {
        self.feed.read().await.records().to_vec()
    }

    pub async fn unread_count(&self) -> usize {
        self.feed.read().await.unread_count()
    }

    /// Whether the initial snapshot for the active identity is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Whether the last snapshot load for the active identity failed.
    /// Cleared by the next activation.
    pub fn has_load_error(&self) -> bool {
        self.load_error.load(Ordering::SeqCst)
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.active
            .lock()
            .await
            .as_ref()
            .map_or(ConnectionState::Idle, |s| s.stream.state())
    }

    /// Sequence number bumped on every visible feed change; await it to
    /// re-render without polling.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

#[allow(clippy::too_many_arguments)]
async fn apply_snapshot(
    api: Arc<dyn AlertApi>,
    identity: Identity,
    feed: Arc<RwLock<AlertFeed>>,
    changes: watch::Sender<u64>,
    loading: Arc<AtomicBool>,
    load_error: Arc<AtomicBool>,
    epoch_counter: Arc<AtomicU64>,
    epoch: u64,
) {
    let result = load_snapshot(api.as_ref(), &identity).await;

    // The epoch check and the feed mutation happen under the same write
    // lock; a teardown that bumps the epoch first clears the feed after
    // this guard is released, so stale data never survives either order.
    let mut guard = feed.write().await;
    if epoch_counter.load(Ordering::SeqCst) != epoch {
        tracing::debug!(identity = %identity, "discarding snapshot for superseded identity");
        return;
    }

    match result {
        Ok(records) => {
            guard.merge_snapshot(records);
            load_error.store(false, Ordering::SeqCst);
        }
        Err(e) => {
            // Previously loaded state is left untouched.
            tracing::warn!(identity = %identity, error = %e, "snapshot load failed");
            load_error.store(true, Ordering::SeqCst);
        }
    }
    loading.store(false, Ordering::SeqCst);
    drop(guard);
    changes.send_modify(|n| *n += 1);
}
