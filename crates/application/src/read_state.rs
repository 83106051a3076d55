use std::sync::Arc;

use domain::alert::entity::AlertId;
use domain::alert::feed::AlertFeed;
use domain::common::entity::Identity;
use ports::secondary::alert_api::AlertApi;
use tokio::sync::{RwLock, watch};

/// Read-state synchronization against the remote authority.
///
/// Both operations are optimistic: the local feed mutation always applies,
/// and a failed remote command is logged, never reverted and never
/// retried. Local read-state may therefore run ahead of the backend until
/// the next snapshot load.
pub struct ReadStateSync {
    api: Arc<dyn AlertApi>,
    feed: Arc<RwLock<AlertFeed>>,
    changes: watch::Sender<u64>,
}

impl ReadStateSync {
    pub fn new(
        api: Arc<dyn AlertApi>,
        feed: Arc<RwLock<AlertFeed>>,
        changes: watch::Sender<u64>,
    ) -> Self {
        Self { api, feed, changes }
    }

    /// Mark one alert read locally, then notify the backend.
    pub async fn mark_one_read(&self, identity: &Identity, id: &AlertId) {
        let changed = self.feed.write().await.mark_read(id);
        if changed {
            self.changes.send_modify(|n| *n += 1);
        }

        if let Err(e) = self.api.mark_read(identity, id).await {
            tracing::warn!(
                identity = %identity,
                alert_id = %id,
                error = %e,
                "mark-read command failed, local state kept"
            );
        }
    }

    /// Mark every alert read. No-op when nothing is unread.
    ///
    /// The local mutation applies before the remote command is awaited,
    /// so a command still in flight when the identity changes cannot
    /// touch the successor feed.
    pub async fn mark_all_read(&self, identity: &Identity) {
        {
            let mut feed = self.feed.write().await;
            if feed.unread_count() == 0 {
                return;
            }
            feed.mark_all_read();
        }
        self.changes.send_modify(|n| *n += 1);

        if let Err(e) = self.api.mark_all_read(identity).await {
            tracing::warn!(
                identity = %identity,
                error = %e,
                "mark-all-read command failed, local state kept"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::alert::entity::{AlertCategory, AlertRecord};
    use domain::alert::error::SyncError;
    use ports::test_utils::StaticAlertApi;
    use std::sync::atomic::Ordering;

    fn make_alert(id: &str, is_read: bool) -> AlertRecord {
        AlertRecord {
            id: AlertId(id.to_string()),
            category: AlertCategory::BoundaryBreach,
            asset_id: "bed-7".to_string(),
            description: None,
            timestamp_ms: 1,
            is_read,
        }
    }

    fn setup(
        api: StaticAlertApi,
        records: Vec<AlertRecord>,
    ) -> (Arc<StaticAlertApi>, Arc<RwLock<AlertFeed>>, ReadStateSync) {
        let api = Arc::new(api);
        let mut feed = AlertFeed::new();
        feed.replace(records);
        let feed = Arc::new(RwLock::new(feed));
        let sync = ReadStateSync::new(
            Arc::clone(&api) as Arc<dyn AlertApi>,
            Arc::clone(&feed),
            watch::channel(0).0,
        );
        (api, feed, sync)
    }

    #[tokio::test]
    async fn mark_one_read_applies_locally_and_notifies_remote() {
        let (api, feed, sync) =
            setup(StaticAlertApi::new(), vec![make_alert("1", false), make_alert("2", false)]);

        sync.mark_one_read(&Identity::new("u1", "o1"), &AlertId("1".to_string()))
            .await;

        assert_eq!(feed.read().await.unread_count(), 1);
        assert_eq!(api.marked_read_ids(), ["1"]);
    }

    #[tokio::test]
    async fn mark_one_read_keeps_local_state_on_remote_failure() {
        let (api, feed, sync) = setup(
            StaticAlertApi::new().fail_commands(),
            vec![make_alert("1", false)],
        );

        sync.mark_one_read(&Identity::new("u1", "o1"), &AlertId("1".to_string()))
            .await;

        // Optimistic mutation is not rolled back.
        assert_eq!(feed.read().await.unread_count(), 0);
        assert_eq!(api.marked_read_ids(), ["1"]);
    }

    #[tokio::test]
    async fn mark_one_read_unknown_id_still_notifies_remote() {
        let (api, feed, sync) = setup(StaticAlertApi::new(), vec![make_alert("1", false)]);

        sync.mark_one_read(&Identity::new("u1", "o1"), &AlertId("ghost".to_string()))
            .await;

        assert_eq!(feed.read().await.unread_count(), 1);
        assert_eq!(api.marked_read_ids(), ["ghost"]);
    }

    #[tokio::test]
    async fn mark_all_read_zeroes_unread_and_notifies_remote() {
        let (api, feed, sync) =
            setup(StaticAlertApi::new(), vec![make_alert("1", false), make_alert("2", true)]);

        sync.mark_all_read(&Identity::new("u1", "o1")).await;

        assert_eq!(feed.read().await.unread_count(), 0);
        assert_eq!(api.mark_all_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn mark_all_read_is_noop_when_nothing_unread() {
        let (api, feed, sync) = setup(StaticAlertApi::new(), vec![make_alert("1", true)]);

        sync.mark_all_read(&Identity::new("u1", "o1")).await;

        assert_eq!(feed.read().await.unread_count(), 0);
        assert_eq!(api.mark_all_calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn mark_all_read_applies_locally_on_remote_failure() {
        let (api, feed, sync) = setup(
            StaticAlertApi::new().fail_commands(),
            vec![make_alert("1", false)],
        );

        sync.mark_all_read(&Identity::new("u1", "o1")).await;

        assert_eq!(feed.read().await.unread_count(), 0);
        assert_eq!(api.mark_all_calls.load(Ordering::Relaxed), 1);
    }

    /// `AlertApi` whose mark-all-read command blocks until a permit is
    /// added, so tests can observe state while the command is in flight.
    struct GatedCommandApi {
        gate: Arc<tokio::sync::Semaphore>,
    }

    impl AlertApi for GatedCommandApi {
        fn fetch_snapshot<'a>(
            &'a self,
            _identity: &'a Identity,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<Vec<u8>, SyncError>> + Send + 'a>,
        > {
            Box::pin(async { Ok(b"[]".to_vec()) })
        }

        fn mark_read<'a>(
            &'a self,
            _identity: &'a Identity,
            _id: &'a AlertId,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), SyncError>> + Send + 'a>>
        {
            Box::pin(async { Ok(()) })
        }

        fn mark_all_read<'a>(
            &'a self,
            _identity: &'a Identity,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), SyncError>> + Send + 'a>>
        {
            Box::pin(async move {
                let permit = self.gate.acquire().await;
                drop(permit);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn mark_all_read_applies_locally_before_remote_completes() {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let api = Arc::new(GatedCommandApi {
            gate: Arc::clone(&gate),
        });
        let mut initial = AlertFeed::new();
        initial.replace(vec![make_alert("1", false)]);
        let feed = Arc::new(RwLock::new(initial));
        let sync = Arc::new(ReadStateSync::new(
            api as Arc<dyn AlertApi>,
            Arc::clone(&feed),
            watch::channel(0).0,
        ));

        let task = tokio::spawn({
            let sync = Arc::clone(&sync);
            async move { sync.mark_all_read(&Identity::new("u1", "o1")).await }
        });
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }

        // Remote command still pending, local state already read.
        assert_eq!(feed.read().await.unread_count(), 0);

        gate.add_permits(1);
        task.await.unwrap();
    }
}
