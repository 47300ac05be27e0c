use async_trait::async_trait;

use crate::{CommandError, LifecycleCommand, Value};

/// Backend callbacks run on the command loop around every lifecycle transition.
#[async_trait]
pub trait RuntimeHooks: Send {
    async fn before_lifecycle(&mut self, _command: LifecycleCommand) {}

    async fn after_lifecycle(
        &mut self,
        _command: LifecycleCommand,
        _result: &Result<Value, CommandError>,
    ) {
    }

    /// Called once, when the service reaches its terminal state.
    async fn on_stopped(&mut self, _exit_code: i32) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl RuntimeHooks for NoHooks {}
