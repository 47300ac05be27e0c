use strum::IntoEnumIterator;

use crate::{LifecycleCommand, ServiceState};

#[test]
fn test_stopped_accepts_nothing() {
    for command in LifecycleCommand::iter() {
        assert!(!ServiceState::Stopped.accepts(command), "{command}");
    }
}

#[test]
fn test_redundant_triggers_rejected() {
    assert!(!ServiceState::Paused.accepts(LifecycleCommand::Pause));
    assert!(!ServiceState::Running.accepts(LifecycleCommand::Resume));
    assert!(!ServiceState::Running.accepts(LifecycleCommand::Start));
    assert!(!ServiceState::Paused.accepts(LifecycleCommand::Reload));
}

#[test]
fn test_stop_from_any_settled_state() {
    for state in [
        ServiceState::Idle,
        ServiceState::Running,
        ServiceState::Paused,
    ] {
        assert!(state.accepts(LifecycleCommand::Stop), "{state}");
    }
}

#[test]
fn test_failures_settle_back() {
    assert_eq!(
        ServiceState::Stopped,
        ServiceState::settle(LifecycleCommand::Start, false)
    );
    assert_eq!(
        ServiceState::Running,
        ServiceState::settle(LifecycleCommand::Pause, false)
    );
    assert_eq!(
        ServiceState::Paused,
        ServiceState::settle(LifecycleCommand::Resume, false)
    );
    assert_eq!(
        ServiceState::Running,
        ServiceState::settle(LifecycleCommand::Reload, false)
    );
    assert_eq!(
        ServiceState::Stopped,
        ServiceState::settle(LifecycleCommand::Stop, false)
    );
}

#[test]
fn test_handler_names_round_trip() {
    for command in LifecycleCommand::iter() {
        assert_eq!(
            Some(command),
            LifecycleCommand::from_handler_name(command.handler_name())
        );
    }
    assert_eq!(None, LifecycleCommand::from_handler_name("onBind"));
}
