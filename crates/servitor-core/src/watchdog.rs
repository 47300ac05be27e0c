use std::time::Duration;

use tracing::warn;

pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Heartbeat interval for a service manager watchdog: half the configured timeout so one
/// extra heartbeat always lands before the deadline.
pub fn heartbeat_interval(timeout: Duration) -> Duration {
    let interval = timeout / 2;
    if interval < MIN_HEARTBEAT_INTERVAL {
        warn!(
            "Watchdog timeout of {timeout:?} is too small, sending heartbeats every {MIN_HEARTBEAT_INTERVAL:?}"
        );
        return MIN_HEARTBEAT_INTERVAL;
    }
    interval
}

#[cfg(test)]
#[path = "./watchdog_test.rs"]
mod watchdog_test;
