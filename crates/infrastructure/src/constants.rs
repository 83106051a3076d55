use std::time::Duration;

// ── Paths ──────────────────────────────────────────────────────────

pub const DEFAULT_CONFIG_PATH: &str = "/etc/trackwatch/config.yaml";

// ── Network defaults ───────────────────────────────────────────────

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// ── Sync behavior ──────────────────────────────────────────────────

/// Delay between a lost push connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

// ── Timeouts ───────────────────────────────────────────────────────

pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
