use std::{ffi::OsString, sync::Mutex, time::Duration};

use servitor_core::{
    CancellationToken, CommandError, LifecycleCommand, Value,
    runtime::{CommandSender, RuntimeHooks},
    server::ServiceManager,
};
use tap::TapFallible;
use tracing::{error, info};
use windows_service::{
    service::{
        ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState, ServiceStatus,
        ServiceType,
    },
    service_control_handler::{self, ServiceControlHandlerResult, ServiceStatusHandle},
    service_dispatcher,
};

use crate::{Service, ServiceError, run_to_completion};

const PENDING_WAIT_HINT: Duration = Duration::from_secs(10);

struct PreparedLaunch {
    service: Service,
    handle: tokio::runtime::Handle,
    result_tx: std::sync::mpsc::Sender<Result<i32, ServiceError>>,
}

// The dispatcher calls back into a plain function pointer, so the service it should run is
// handed over through this slot. Only one service can run per process.
static LAUNCH: Mutex<Option<PreparedLaunch>> = Mutex::new(None);

windows_service::define_windows_service!(ffi_service_main, service_main);

pub async fn run(service: Service) -> Result<i32, ServiceError> {
    let name = service.label.application.clone();
    let (result_tx, result_rx) = std::sync::mpsc::channel();
    {
        let mut launch = LAUNCH
            .lock()
            .map_err(|e| ServiceError::initialization("Error preparing service", e.to_string()))?;
        if launch.is_some() {
            return Err(ServiceError::initialization(
                "Error preparing service",
                "a service is already waiting for the dispatcher",
            ));
        }
        *launch = Some(PreparedLaunch {
            service,
            handle: tokio::runtime::Handle::current(),
            result_tx,
        });
    }

    // Blocks until the service control manager reports the service stopped
    tokio::task::spawn_blocking(move || service_dispatcher::start(name, ffi_service_main))
        .await
        .map_err(|e| ServiceError::initialization("Service dispatcher panicked", e))?
        .map_err(|e| ServiceError::initialization("Error starting service dispatcher", e))?;

    result_rx.try_recv().map_err(|e| {
        ServiceError::initialization("Service dispatcher exited without running the service", e)
    })?
}

fn service_main(_arguments: Vec<OsString>) {
    let launch = LAUNCH.lock().ok().and_then(|mut launch| launch.take());
    let Some(PreparedLaunch {
        service,
        handle,
        result_tx,
    }) = launch
    else {
        error!("Service dispatcher started without a prepared service");
        return;
    };
    let result = handle.block_on(run_dispatched(service));
    if let Err(e) = &result {
        error!("{e}");
    }
    result_tx.send(result).ok();
}

async fn run_dispatched(service: Service) -> Result<i32, ServiceError> {
    let sender = service.sender();
    let status_handle =
        service_control_handler::register(&service.label.application, move |control_event| {
            handle_control_event(&sender, control_event)
        })
        .map_err(|e| ServiceError::initialization("Error registering control handler", e))?;

    let mut hooks = WindowsHooks { status_handle };
    hooks.set_status(ServiceState::StartPending, 0);

    let manager = ServiceManager::new(CancellationToken::new());
    run_to_completion(service.runtime, manager, &mut hooks).await
}

/// Runs on the manager's thread. It only hands the control code over to the loop.
fn handle_control_event(
    sender: &CommandSender,
    control_event: ServiceControl,
) -> ServiceControlHandlerResult {
    let command = match control_event {
        // Always return NoError for interrogations even if nothing changed
        ServiceControl::Interrogate => return ServiceControlHandlerResult::NoError,
        ServiceControl::Stop | ServiceControl::Shutdown | ServiceControl::Preshutdown => {
            LifecycleCommand::Stop
        }
        ServiceControl::Pause => LifecycleCommand::Pause,
        ServiceControl::Continue => LifecycleCommand::Resume,
        ServiceControl::ParamChange => LifecycleCommand::Reload,
        _ => return ServiceControlHandlerResult::NotImplemented,
    };
    info!("Received {command} from the service control manager");
    sender.post(command);
    ServiceControlHandlerResult::NoError
}

struct WindowsHooks {
    status_handle: ServiceStatusHandle,
}

impl WindowsHooks {
    fn set_status(&self, current_state: ServiceState, exit_code: u32) {
        let pending = matches!(
            current_state,
            ServiceState::StartPending
                | ServiceState::StopPending
                | ServiceState::PausePending
                | ServiceState::ContinuePending
        );
        let controls_accepted = match current_state {
            ServiceState::Running | ServiceState::Paused => {
                ServiceControlAccept::STOP
                    | ServiceControlAccept::SHUTDOWN
                    | ServiceControlAccept::PAUSE_CONTINUE
                    | ServiceControlAccept::PARAM_CHANGE
            }
            _ => ServiceControlAccept::empty(),
        };
        self.status_handle
            .set_service_status(ServiceStatus {
                service_type: ServiceType::OWN_PROCESS,
                current_state,
                controls_accepted,
                exit_code: ServiceExitCode::Win32(exit_code),
                checkpoint: 0,
                wait_hint: if pending {
                    PENDING_WAIT_HINT
                } else {
                    Duration::default()
                },
                process_id: None,
            })
            .tap_err(|e| error!("Error setting service status to {current_state:?}: {e:?}"))
            .ok();
    }
}

#[async_trait::async_trait]
impl RuntimeHooks for WindowsHooks {
    async fn before_lifecycle(&mut self, command: LifecycleCommand) {
        match command {
            LifecycleCommand::Stop => self.set_status(ServiceState::StopPending, 0),
            LifecycleCommand::Pause => self.set_status(ServiceState::PausePending, 0),
            LifecycleCommand::Resume => self.set_status(ServiceState::ContinuePending, 0),
            LifecycleCommand::Start | LifecycleCommand::Reload => {}
        }
    }

    async fn after_lifecycle(
        &mut self,
        command: LifecycleCommand,
        result: &Result<Value, CommandError>,
    ) {
        match (command, result.is_ok()) {
            (LifecycleCommand::Start, true)
            | (LifecycleCommand::Resume, true)
            | (LifecycleCommand::Pause, false) => self.set_status(ServiceState::Running, 0),
            (LifecycleCommand::Pause, true) | (LifecycleCommand::Resume, false) => {
                self.set_status(ServiceState::Paused, 0)
            }
            _ => {}
        }
    }

    async fn on_stopped(&mut self, exit_code: i32) {
        info!("Setting status to 'stopped'");
        self.set_status(ServiceState::Stopped, exit_code as u32);
    }
}
