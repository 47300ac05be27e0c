use std::{ffi::OsStr, time::Duration};

use async_trait::async_trait;
use enumflags2::BitFlags;
use servitor_core::{CommandError, ServiceDescriptor};
use tracing::info;
use windows_service::{
    service::{
        Service, ServiceAccess, ServiceControl as ControlCode, ServiceInfo, ServiceStartType,
        ServiceState,
    },
    service_manager::{ServiceManager, ServiceManagerAccess},
};

use crate::{BlockMode, ServiceControl, Status, SupportFlag};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn scm_error(context: &str) -> impl Fn(windows_service::Error) -> CommandError + '_ {
    move |e| CommandError::ChannelError(format!("{context}: {e:?}"))
}

fn status_from_state(state: ServiceState) -> Status {
    match state {
        ServiceState::Stopped => Status::Stopped,
        ServiceState::StartPending => Status::Starting,
        ServiceState::StopPending => Status::Stopping,
        ServiceState::Running => Status::Running,
        ServiceState::ContinuePending => Status::Resuming,
        ServiceState::PausePending => Status::Pausing,
        ServiceState::Paused => Status::Paused,
    }
}

/// Controls a service registered with the service control manager.
#[derive(Clone, Debug)]
pub struct WindowsControl {
    descriptor: ServiceDescriptor,
    blocking: bool,
}

impl WindowsControl {
    pub fn new(descriptor: ServiceDescriptor) -> Self {
        Self {
            descriptor,
            blocking: true,
        }
    }

    fn open(&self, access: ServiceAccess) -> Result<Option<Service>, CommandError> {
        let manager = ServiceManager::local_computer(None::<&str>, ServiceManagerAccess::CONNECT)
            .map_err(scm_error("Error connecting to the service control manager"))?;
        match manager.open_service(self.descriptor.service_name(), access) {
            Ok(service) => Ok(Some(service)),
            Err(windows_service::Error::Winapi(e))
                if e.raw_os_error() == Some(ERROR_SERVICE_DOES_NOT_EXIST) =>
            {
                Ok(None)
            }
            Err(e) => Err(scm_error("Error opening service")(e)),
        }
    }

    fn open_existing(&self, access: ServiceAccess) -> Result<Service, CommandError> {
        self.open(access)?.ok_or_else(|| {
            CommandError::BackendUnavailable(format!(
                "{} is not installed",
                self.descriptor.service_name()
            ))
        })
    }

    async fn wait_for(&self, service: &Service, desired: ServiceState) -> Result<(), CommandError> {
        if !self.blocking {
            return Ok(());
        }
        loop {
            let status = service
                .query_status()
                .map_err(scm_error("Error querying service status"))?;
            if status.current_state == desired {
                return Ok(());
            }
            if status.current_state == ServiceState::Stopped && desired != ServiceState::Stopped {
                return Err(CommandError::handler_failure(
                    self.descriptor.service_name(),
                    "service stopped unexpectedly",
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn set_start_type(&self, start_type: ServiceStartType) -> Result<(), CommandError> {
        let service = self.open_existing(
            ServiceAccess::QUERY_CONFIG | ServiceAccess::QUERY_STATUS | ServiceAccess::CHANGE_CONFIG,
        )?;
        let config = service
            .query_config()
            .map_err(scm_error("Error querying service config"))?;
        let full_path = config.executable_path.to_string_lossy();
        // The stored command line may be escaped twice
        let mut command_line = windows_args::Args::parse_cmd(&full_path.replace(r#"\""#, r#"""#))
            .filter(|a| !a.is_empty());
        let executable_path = command_line.next().ok_or_else(|| {
            CommandError::BackendUnavailable("Service executable path is empty".to_owned())
        })?;
        let info = ServiceInfo {
            name: self.descriptor.service_name().into(),
            display_name: config.display_name,
            service_type: config.service_type,
            start_type,
            error_control: config.error_control,
            executable_path: executable_path.into(),
            launch_arguments: command_line.map(Into::into).collect(),
            dependencies: config.dependencies,
            account_name: config.account_name,
            account_password: None,
        };
        service
            .change_config(&info)
            .map_err(scm_error("Error changing service config"))
    }
}

const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;

#[async_trait]
impl ServiceControl for WindowsControl {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn support_flags(&self) -> BitFlags<SupportFlag> {
        BitFlags::all() & !SupportFlag::CustomCommands & !SupportFlag::SetEnabled
    }

    fn block_mode(&self) -> BlockMode {
        if self.blocking {
            BlockMode::Blocking
        } else {
            BlockMode::NonBlocking
        }
    }

    fn set_blocking(&mut self, blocking: bool) -> Result<(), CommandError> {
        self.blocking = blocking;
        Ok(())
    }

    async fn service_exists(&self) -> Result<bool, CommandError> {
        Ok(self.open(ServiceAccess::QUERY_STATUS)?.is_some())
    }

    async fn status(&self) -> Result<Status, CommandError> {
        let Some(service) = self.open(ServiceAccess::QUERY_STATUS)? else {
            return Ok(Status::NotInstalled);
        };
        let status = service
            .query_status()
            .map_err(scm_error("Error querying service status"))?;
        Ok(status_from_state(status.current_state))
    }

    async fn is_autostart_enabled(&self) -> Result<bool, CommandError> {
        let service = self.open_existing(ServiceAccess::QUERY_CONFIG)?;
        let config = service
            .query_config()
            .map_err(scm_error("Error querying service config"))?;
        Ok(config.start_type == ServiceStartType::AutoStart)
    }

    async fn start(&self) -> Result<(), CommandError> {
        let service = self.open_existing(ServiceAccess::QUERY_STATUS | ServiceAccess::START)?;
        info!("Starting {}", self.descriptor.service_name());
        service
            .start::<&OsStr>(&[])
            .map_err(scm_error("Error starting service"))?;
        self.wait_for(&service, ServiceState::Running).await
    }

    async fn stop(&self) -> Result<(), CommandError> {
        let service = self.open_existing(ServiceAccess::QUERY_STATUS | ServiceAccess::STOP)?;
        info!("Stopping {}", self.descriptor.service_name());
        service.stop().map_err(scm_error("Error stopping service"))?;
        self.wait_for(&service, ServiceState::Stopped).await
    }

    async fn pause(&self) -> Result<(), CommandError> {
        let service =
            self.open_existing(ServiceAccess::QUERY_STATUS | ServiceAccess::PAUSE_CONTINUE)?;
        service.pause().map_err(scm_error("Error pausing service"))?;
        self.wait_for(&service, ServiceState::Paused).await
    }

    async fn resume(&self) -> Result<(), CommandError> {
        let service =
            self.open_existing(ServiceAccess::QUERY_STATUS | ServiceAccess::PAUSE_CONTINUE)?;
        service.resume().map_err(scm_error("Error resuming service"))?;
        self.wait_for(&service, ServiceState::Running).await
    }

    async fn reload(&self) -> Result<(), CommandError> {
        let service =
            self.open_existing(ServiceAccess::QUERY_STATUS | ServiceAccess::PAUSE_CONTINUE)?;
        service
            .notify(ControlCode::ParamChange)
            .map_err(scm_error("Error reloading service"))?;
        Ok(())
    }

    async fn enable_autostart(&self) -> Result<(), CommandError> {
        self.set_start_type(ServiceStartType::AutoStart)
    }

    async fn disable_autostart(&self) -> Result<(), CommandError> {
        self.set_start_type(ServiceStartType::OnDemand)
    }
}
