use domain::alert::entity::AlertRecord;
use domain::alert::error::SyncError;
use domain::common::entity::Identity;
use ports::secondary::alert_api::AlertApi;

/// Parse a snapshot response body into alert records.
///
/// Defensive normalization: a body that is not a JSON array yields an
/// empty list, and elements that fail to parse are skipped. Shape
/// problems never become errors — only the transport can fail a load.
///
/// This lives in the application layer (rather than domain) to keep
/// `serde_json` out of the domain crate's production dependencies.
pub fn parse_snapshot(body: &[u8]) -> Vec<AlertRecord> {
    let parsed: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "snapshot body is not valid JSON, treating as empty");
            return Vec::new();
        }
    };

    let serde_json::Value::Array(items) = parsed else {
        tracing::warn!("snapshot body is not list-shaped, treating as empty");
        return Vec::new();
    };

    let total = items.len();
    let records: Vec<AlertRecord> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<AlertRecord>(item) {
            Ok(rec) => Some(rec),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unparseable snapshot element");
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(
            parsed = records.len(),
            total,
            "snapshot contained unparseable elements"
        );
    }

    records
}

/// Fetch and parse the historical alert list for an identity.
///
/// Order is preserved from the response. Transport failure surfaces as
/// [`SyncError::SnapshotFailed`]; anything the backend returned parses to
/// a (possibly empty) record list.
pub async fn load_snapshot(
    api: &dyn AlertApi,
    identity: &Identity,
) -> Result<Vec<AlertRecord>, SyncError> {
    let body = api.fetch_snapshot(identity).await?;
    let records = parse_snapshot(&body);
    tracing::debug!(identity = %identity, count = records.len(), "snapshot loaded");
    Ok(records)
}
