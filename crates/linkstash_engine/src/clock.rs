//! Wall-clock access.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current time as epoch milliseconds.
///
/// Change versions and the sync watermark are both stamped with this
/// clock; correctness across clients assumes reasonably synchronized
/// clocks (see the protocol crate's versioning notes).
#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
