//! Small shared utilities.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time as seconds since the Unix epoch,
/// with sub-second (microsecond-level) precision.
///
/// This is the default time source used to stamp order entries whose
/// order carries no explicit time.
pub fn current_time_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
