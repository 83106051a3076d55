use std::future::Future;
use std::pin::Pin;

use domain::alert::entity::AlertId;
use domain::alert::error::SyncError;
use domain::common::entity::Identity;

/// Secondary port for the tracking backend's request/response alert API:
/// the historical snapshot and the two read-state commands.
///
/// `fetch_snapshot` returns the raw response body; JSON normalization
/// (including the not-list-shaped → empty-list rule) lives in the
/// application layer so serde stays out of callers that only need the
/// commands.
///
/// Uses `Pin<Box<dyn Future>>` return types (instead of RPITIT) so the
/// trait is dyn-compatible and can be held as `Arc<dyn AlertApi>`.
pub trait AlertApi: Send + Sync {
    /// Fetch the historical alert list for the identity.
    fn fetch_snapshot<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, SyncError>> + Send + 'a>>;

    /// Tell the backend one alert has been read.
    fn mark_read<'a>(
        &'a self,
        identity: &'a Identity,
        id: &'a AlertId,
    ) -> Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>>;

    /// Tell the backend every alert for the identity has been read.
    fn mark_all_read<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>>;
}
