use std::sync::Arc;

use servitor_core::{
    BackendKind, BusScope, Dispatcher, Label, PidFile, ServiceState,
    runtime::{CommandSender, RuntimeHooks, ServiceEvent, ServiceRuntime},
    server::{BroadcastEventStore, ServiceManager},
};
use tracing::info;

use crate::{ServiceError, platform};

/// A service process: the command runtime plus what a backend needs to drive it.
pub struct Service {
    pub(crate) label: Label,
    pub(crate) runtime: ServiceRuntime,
    pub(crate) bus_scope: Option<BusScope>,
    pub(crate) pid_file: Option<PidFile>,
    pub(crate) native_host: Option<Arc<dyn platform::call_in::NativeHost>>,
}

impl Service {
    pub fn new(label: Label, dispatcher: Dispatcher) -> Self {
        Self {
            label,
            runtime: ServiceRuntime::new(dispatcher),
            bus_scope: None,
            pid_file: None,
            native_host: None,
        }
    }

    pub fn with_bus_scope(mut self, bus_scope: BusScope) -> Self {
        self.bus_scope = Some(bus_scope);
        self
    }

    pub fn with_pid_file(mut self, pid_file: PidFile) -> Self {
        self.pid_file = Some(pid_file);
        self
    }

    pub fn with_native_host(mut self, host: Arc<dyn platform::call_in::NativeHost>) -> Self {
        self.native_host = Some(host);
        self
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Handle for queueing commands from outside the backend.
    pub fn sender(&self) -> CommandSender {
        self.runtime.sender()
    }

    pub fn state(&self) -> ServiceState {
        self.runtime.state()
    }

    pub fn event_store(&self) -> BroadcastEventStore<ServiceEvent> {
        self.runtime.event_store()
    }

    pub(crate) fn bus_scope(&self) -> BusScope {
        self.bus_scope.unwrap_or_else(BusScope::detect)
    }

    pub(crate) fn pid_file(&self) -> PidFile {
        self.pid_file
            .clone()
            .unwrap_or_else(|| PidFile::for_label(&self.label))
    }

    /// Runs the service under `backend` until it stops. Returns the process exit status.
    pub async fn run(self, backend: BackendKind) -> Result<i32, ServiceError> {
        info!(
            "Running {} with the {backend} backend",
            self.label.qualified_name()
        );
        match backend {
            BackendKind::Standard => platform::standard::run(self).await,
            #[cfg(target_os = "linux")]
            BackendKind::Systemd => platform::systemd::run(self).await,
            #[cfg(windows)]
            BackendKind::Windows => platform::windows::run(self).await,
            BackendKind::CallIn => platform::call_in::run(self).await,
            #[allow(unreachable_patterns)]
            other => Err(ServiceError::UnsupportedBackend(other)),
        }
    }
}

/// Drives the command loop to completion, then joins the background services.
pub(crate) async fn run_to_completion<H: RuntimeHooks>(
    runtime: ServiceRuntime,
    manager: ServiceManager,
    hooks: &mut H,
) -> Result<i32, ServiceError> {
    let result = runtime.run(hooks).await;
    let background_service_errors = manager.stop().await;
    ServiceError::from_service_result(result, background_service_errors)
}

#[cfg(test)]
#[path = "./service_test.rs"]
mod service_test;
