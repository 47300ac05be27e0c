use servitor_core::{
    CancellationToken, CommandError, LifecycleCommand, Value,
    runtime::RuntimeHooks,
    server::ServiceManager,
};
use servitor_signals::SignalListener;

use crate::{Service, ServiceError, run_to_completion};

/// Hooks for a plain process driven by signals.
#[derive(Debug, Default)]
pub struct StandardHooks;

#[async_trait::async_trait]
impl RuntimeHooks for StandardHooks {
    async fn after_lifecycle(
        &mut self,
        command: LifecycleCommand,
        result: &Result<Value, CommandError>,
    ) {
        #[cfg(unix)]
        if command == LifecycleCommand::Pause && result.is_ok() {
            super::suspend_process();
        }
        #[cfg(not(unix))]
        let _ = (command, result);
    }
}

pub async fn run(service: Service) -> Result<i32, ServiceError> {
    let pid_file = service.pid_file();
    let _pid_guard = pid_file
        .create()
        .map_err(|e| ServiceError::initialization("Error creating pid file", e))?;

    let manager = ServiceManager::new(CancellationToken::new());
    let listener = SignalListener::new(service.sender())
        .map_err(|e| ServiceError::initialization("Error registering signal handlers", e))?;
    manager.get_context().add_service(listener).await?;

    run_to_completion(service.runtime, manager, &mut StandardHooks).await
}

#[cfg(test)]
#[path = "./standard_test.rs"]
mod standard_test;
