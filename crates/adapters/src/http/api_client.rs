use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use domain::alert::entity::AlertId;
use domain::alert::error::SyncError;
use domain::common::entity::Identity;
use ports::secondary::alert_api::AlertApi;

use super::{alerts_path, connection_error};

/// REST client for the trackwatch alerts API.
///
/// Snapshot bodies are returned as raw bytes; shape normalization is the
/// caller's concern, so a backend returning garbage degrades to an empty
/// list instead of a transport error.
pub struct HttpAlertApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAlertApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn post_command(&self, path: &str) -> Result<(), SyncError> {
        let resp = self
            .request(reqwest::Method::POST, path)
            .send()
            .await
            .map_err(|e| SyncError::CommandFailed(connection_error(&self.base_url, &e)))?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(SyncError::CommandFailed(format!(
            "command rejected with status {}",
            resp.status()
        )))
    }
}

impl AlertApi for HttpAlertApi {
    fn fetch_snapshot<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, SyncError>> + Send + 'a>> {
        Box::pin(async move {
            let resp = self
                .request(reqwest::Method::GET, &alerts_path(identity))
                .send()
                .await
                .map_err(|e| SyncError::SnapshotFailed(connection_error(&self.base_url, &e)))?;
            if !resp.status().is_success() {
                return Err(SyncError::SnapshotFailed(format!(
                    "snapshot request rejected with status {}",
                    resp.status()
                )));
            }
            let body = resp
                .bytes()
                .await
                .map_err(|e| SyncError::SnapshotFailed(format!("failed to read body: {e}")))?;
            tracing::debug!(identity = %identity, bytes = body.len(), "snapshot fetched");
            Ok(body.to_vec())
        })
    }

    fn mark_read<'a>(
        &'a self,
        identity: &'a Identity,
        id: &'a AlertId,
    ) -> Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>> {
        Box::pin(async move {
            let path = format!("{}/{}/read", alerts_path(identity), id.0);
            self.post_command(&path).await
        })
    }

    fn mark_all_read<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>> {
        Box::pin(async move {
            let path = format!("{}/read", alerts_path(identity));
            self.post_command(&path).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_in_base_url_is_normalized() {
        let api = HttpAlertApi::new("http://localhost:8080/", None, Duration::from_secs(5));
        assert_eq!(api.base_url, "http://localhost:8080");
    }
}
