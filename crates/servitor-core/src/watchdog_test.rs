use std::time::Duration;

use super::heartbeat_interval;

#[test]
fn test_half_of_timeout() {
    assert_eq!(
        Duration::from_millis(2000),
        heartbeat_interval(Duration::from_millis(4000))
    );
}

#[test]
fn test_clamped_to_one_millisecond() {
    assert_eq!(
        Duration::from_millis(1),
        heartbeat_interval(Duration::from_micros(500))
    );
    assert_eq!(Duration::from_millis(1), heartbeat_interval(Duration::ZERO));
}
