use serde::{Deserialize, Serialize};

use crate::LifecycleCommand;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, Serialize, Deserialize, Default,
)]
pub enum ServiceState {
    #[default]
    Idle,
    Starting,
    Running,
    Pausing,
    Paused,
    Resuming,
    Reloading,
    Stopping,
    Stopped,
}

impl ServiceState {
    pub fn is_terminal(&self) -> bool {
        *self == ServiceState::Stopped
    }

    /// Whether `command` can run from this state. Anything else is skipped as a no-op.
    pub fn accepts(&self, command: LifecycleCommand) -> bool {
        use LifecycleCommand::*;
        use ServiceState::*;

        matches!(
            (self, command),
            (Idle, Start)
                | (Idle | Running | Paused, Stop)
                | (Running, Pause)
                | (Paused, Resume)
                | (Running, Reload)
        )
    }

    pub(crate) fn transient(command: LifecycleCommand) -> Self {
        match command {
            LifecycleCommand::Start => ServiceState::Starting,
            LifecycleCommand::Stop => ServiceState::Stopping,
            LifecycleCommand::Pause => ServiceState::Pausing,
            LifecycleCommand::Resume => ServiceState::Resuming,
            LifecycleCommand::Reload => ServiceState::Reloading,
        }
    }

    /// State after `command` finished, given whether its handler succeeded.
    pub(crate) fn settle(command: LifecycleCommand, success: bool) -> Self {
        match (command, success) {
            (LifecycleCommand::Start, true) => ServiceState::Running,
            (LifecycleCommand::Start, false) => ServiceState::Stopped,
            (LifecycleCommand::Stop, _) => ServiceState::Stopped,
            (LifecycleCommand::Pause, true) => ServiceState::Paused,
            (LifecycleCommand::Pause, false) => ServiceState::Running,
            (LifecycleCommand::Resume, true) => ServiceState::Running,
            (LifecycleCommand::Resume, false) => ServiceState::Paused,
            (LifecycleCommand::Reload, _) => ServiceState::Running,
        }
    }
}

#[cfg(test)]
#[path = "./state_test.rs"]
mod state_test;
