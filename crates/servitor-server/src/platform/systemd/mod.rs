mod control;
pub use control::*;

mod hooks;
pub use hooks::*;

mod watchdog;
pub use watchdog::*;

use servitor_core::{CancellationToken, server::ServiceManager};
use servitor_signals::SignalListener;
use tracing::info;

use crate::{Service, ServiceError, run_to_completion};

pub async fn run(service: Service) -> Result<i32, ServiceError> {
    let manager = ServiceManager::new(CancellationToken::new());
    let context = manager.get_context();

    let listener = SignalListener::new(service.sender())
        .map_err(|e| ServiceError::initialization("Error registering signal handlers", e))?;
    context.add_service(listener).await?;

    let connection = serve_control_channel(&service.label, service.bus_scope(), service.sender())
        .await
        .map_err(|e| ServiceError::initialization("Error registering control channel", e))?;

    let watchdog = match WatchdogService::from_env() {
        Some(watchdog) => {
            info!("Watchdog enabled, sending heartbeats every {:?}", watchdog.interval());
            Some(context.add_service(watchdog).await?)
        }
        None => None,
    };

    let mut hooks = SystemdHooks::new(connection, watchdog)
        .map_err(|e| ServiceError::initialization("Error creating signal emitter", e))?;
    run_to_completion(service.runtime, manager, &mut hooks).await
}
