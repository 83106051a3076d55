#![forbid(unsafe_code)]

pub mod read_state;
pub mod snapshot;
pub mod stream_client;
pub mod subscriber;
