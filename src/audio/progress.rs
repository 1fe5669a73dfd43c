//! Time arithmetic for the player bar.

use std::time::Duration;

/// `progress / duration * 100`, or `0` when the duration is unknown.
pub fn progress_percent(progress: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    progress.as_secs_f64() / duration.as_secs_f64() * 100.0
}

pub fn remaining(progress: Duration, duration: Duration) -> Duration {
    duration.saturating_sub(progress)
}

/// Render as `m:ss`, flooring to whole seconds.
pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
