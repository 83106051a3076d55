use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_RECONNECT_DELAY_SECS;

use super::common::{ConfigError, validation};

/// Alert synchronization tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Seconds between push connection attempts after a loss.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconnect_delay_secs == 0 {
            return Err(validation("sync.reconnect_delay_secs", "must be > 0"));
        }
        if self.reconnect_delay_secs > 3600 {
            return Err(validation(
                "sync.reconnect_delay_secs",
                "must be at most 3600",
            ));
        }
        Ok(())
    }
}

fn default_reconnect_delay() -> u64 {
    DEFAULT_RECONNECT_DELAY_SECS
}
