use crate::{CommandError, LifecycleCommand};

#[derive(Clone, Debug, PartialEq)]
pub enum ServiceEvent {
    Started,
    Paused,
    Resumed,
    Reloaded { success: bool },
    Stopped { exit_code: i32 },
    LifecycleFailed {
        command: LifecycleCommand,
        error: CommandError,
    },
    CommandCompleted { name: String, success: bool },
}
