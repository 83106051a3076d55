pub mod alert_api;
pub mod push_channel;
