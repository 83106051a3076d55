pub mod api_client;
pub mod stream_client;

pub use api_client::HttpAlertApi;
pub use stream_client::HttpPushChannel;

use domain::common::entity::Identity;

fn alerts_path(identity: &Identity) -> String {
    format!(
        "/api/v1/orgs/{}/users/{}/alerts",
        identity.org_id, identity.user_id
    )
}

fn connection_error(base_url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        format!("cannot connect to backend at {base_url}")
    } else if err.is_timeout() {
        format!("connection to backend at {base_url} timed out")
    } else {
        format!("request to backend failed: {err}")
    }
}
