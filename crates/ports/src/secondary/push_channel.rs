use std::future::Future;
use std::pin::Pin;

use domain::alert::error::SyncError;
use domain::common::entity::Identity;

/// One live server-push connection. The client never sends on it.
///
/// The handle is an owned object: dropping it releases the transport, and
/// the session state machine that owns it is the only reconnect authority.
pub trait PushConnection: Send {
    /// Await the next pushed payload.
    ///
    /// - `Some(Ok(bytes))` — one serialized alert representation.
    /// - `Some(Err(_))` — transport error; the connection is dead.
    /// - `None` — orderly close by the server.
    fn next_message(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Result<Vec<u8>, SyncError>>> + Send + '_>>;
}

/// Secondary port for establishing push connections, one per identity.
pub trait PushChannel: Send + Sync {
    fn connect<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn PushConnection>, SyncError>> + Send + 'a>>;
}
