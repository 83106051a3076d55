use thiserror::Error;

/// Failure taxonomy for the alert synchronization subsystem.
///
/// None of these are fatal to the host: `SnapshotFailed` becomes a visible
/// error flag on the subscriber, the rest degrade locally (message dropped,
/// reconnect scheduled, or optimistic state left ahead of the remote).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("snapshot load failed: {0}")]
    SnapshotFailed(String),

    #[error("malformed push message: {0}")]
    MalformedMessage(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("remote command failed: {0}")]
    CommandFailed(String),
}

impl SyncError {
    /// Whether the error may surface to the subscriber as a visible error
    /// state. Everything else is logged and absorbed.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::SnapshotFailed(_))
    }
}
