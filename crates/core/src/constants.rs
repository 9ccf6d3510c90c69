//! Shared constants

use std::time::Duration;

/// Poll interval used when none is configured (2s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Request timeout used when none is configured (10s)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);
