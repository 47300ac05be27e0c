use super::status_from_unit;
use crate::Status;

#[test]
fn test_missing_unit() {
    assert_eq!(
        Status::NotInstalled,
        status_from_unit("not-found", "inactive", "dead")
    );
}

#[test]
fn test_unit_states() {
    assert_eq!(Status::Running, status_from_unit("loaded", "active", "running"));
    assert_eq!(Status::Reloading, status_from_unit("loaded", "active", "reload"));
    assert_eq!(Status::Starting, status_from_unit("loaded", "activating", "start"));
    assert_eq!(Status::Stopping, status_from_unit("loaded", "deactivating", "stop"));
    assert_eq!(Status::Stopped, status_from_unit("loaded", "inactive", "dead"));
    assert_eq!(Status::Errored, status_from_unit("loaded", "failed", "failed"));
    assert_eq!(Status::Unknown, status_from_unit("loaded", "maintenance", ""));
}
