use servitor_core::{Command, LifecycleCommand};

use crate::Signal;

#[test]
fn test_termination_signals_stop() {
    for name in ["SIGINT", "SIGTERM", "sigquit"] {
        assert_eq!(
            Some(Command::Lifecycle(LifecycleCommand::Stop)),
            Signal::from(name).command(),
            "{name}"
        );
    }
}

#[test]
fn test_lifecycle_signals() {
    assert_eq!(
        Some(LifecycleCommand::Reload),
        Signal::SIGHUP.command().and_then(|c| c.lifecycle())
    );
    assert_eq!(
        Some(LifecycleCommand::Pause),
        Signal::SIGTSTP.command().and_then(|c| c.lifecycle())
    );
    assert_eq!(
        Some(LifecycleCommand::Resume),
        Signal::SIGCONT.command().and_then(|c| c.lifecycle())
    );
}

#[test]
fn test_user_signals_are_named_commands() {
    assert_eq!("SIGUSR1", Signal::SIGUSR1.command().unwrap().name());
    assert_eq!("SIGUSR2", Signal::from("SIGUSR2").command().unwrap().name());
    assert_eq!(None, Signal::from("SIGWINCH").command());
}
