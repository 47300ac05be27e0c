use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use futures::{Stream, StreamExt};
use servitor_client::{ServiceControl, ServiceControlBuilder};
use servitor_config::{ServiceSettings, SettingsStore};
use servitor_core::{
    BackendKind, BusScope, CommandError, Label, PidFile, ServiceDescriptor,
    runtime::{EXIT_FAILURE, EXIT_SUCCESS, ServiceEvent},
    server::EventStore,
};
use servitor_logging::LoggingRole;
use servitor_server::Service;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, error, info, warn};

use crate::{
    CliBuilder,
    builder::{BACKEND_ARG, COMMAND_ARG, SYSTEM_ARG, USER_ARG},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ControlAction {
    Stop,
    Reload,
}

/// What this invocation of the binary does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Run the service itself.
    Service,
    /// Send a command to the already running instance.
    Controller(ControlAction),
}

pub struct Cli {
    label: Label,
    settings: SettingsStore,
    matches: clap::ArgMatches,
    role: Role,
    bus_scope: BusScope,
    backend: BackendKind,
}

impl Cli {
    pub fn builder(label: Label) -> CliBuilder {
        CliBuilder::new(label)
    }

    pub(crate) fn new(label: Label, settings: SettingsStore, matches: clap::ArgMatches) -> Self {
        let explicit_scope = if matches.get_flag(SYSTEM_ARG) {
            Some(BusScope::System)
        } else if matches.get_flag(USER_ARG) {
            Some(BusScope::User)
        } else {
            None
        };
        let bus_scope = settings.current().resolve_bus_scope(explicit_scope);
        let backend = matches
            .get_one::<BackendKind>(BACKEND_ARG)
            .copied()
            .unwrap_or_else(BackendKind::detect);
        let role = match matches.get_one::<String>(COMMAND_ARG).map(String::as_str) {
            Some("stop") => Role::Controller(ControlAction::Stop),
            Some("reload") => Role::Controller(ControlAction::Reload),
            _ => Role::Service,
        };
        Self {
            label,
            settings,
            matches,
            role,
            bus_scope,
            backend,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn logging_role(&self) -> LoggingRole {
        match self.role {
            Role::Service => LoggingRole::Service,
            Role::Controller(_) => LoggingRole::Controller,
        }
    }

    pub fn bus_scope(&self) -> BusScope {
        self.bus_scope
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// The settings as of the last load or reload.
    pub fn settings(&self) -> Arc<ServiceSettings> {
        self.settings.current()
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn matches(&self) -> &clap::ArgMatches {
        &self.matches
    }

    pub fn pid_file(&self) -> PidFile {
        self.settings.current().resolve_pid_file(&self.label)
    }

    pub fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor::new(self.label.application.clone(), self.backend)
    }

    /// Runs the selected role to completion and returns the process exit status.
    ///
    /// `service_factory` is only called for the service role.
    pub async fn handle_input<F>(self, service_factory: F) -> i32
    where
        F: FnOnce(&Label) -> Service,
    {
        match self.role {
            Role::Service => {
                let service = service_factory(&self.label)
                    .with_bus_scope(self.bus_scope)
                    .with_pid_file(self.pid_file());
                let reloads = tokio::spawn(reload_settings(
                    service.event_store().subscribe_events(),
                    self.settings.clone(),
                ));
                let result = service.run(self.backend).await;
                reloads.abort();
                match result {
                    Ok(exit_code) => exit_code,
                    Err(e) => {
                        error!("{e}");
                        e.exit_code()
                    }
                }
            }
            Role::Controller(action) => match self.control(action).await {
                Ok(exit_code) => exit_code,
                Err(e) => {
                    eprintln!("{e}");
                    EXIT_FAILURE
                }
            },
        }
    }

    async fn control(&self, action: ControlAction) -> Result<i32, CommandError> {
        info!(
            "Sending {action} to {} via the {} backend",
            self.label.application, self.backend
        );
        match self.backend {
            #[cfg(target_os = "linux")]
            BackendKind::Systemd => self.control_channel(action).await,
            _ => {
                let control = ServiceControlBuilder::new(self.descriptor())
                    .with_bus_scope(self.bus_scope)
                    .with_pid_file(self.pid_file())
                    .build()
                    .await?;
                let request = async {
                    match action {
                        ControlAction::Stop => control.stop().await,
                        ControlAction::Reload => control.reload().await,
                    }
                };
                bounded(self.settings.current().control_timeout(), request).await??;
                Ok(EXIT_SUCCESS)
            }
        }
    }

    #[cfg(target_os = "linux")]
    async fn control_channel(&self, action: ControlAction) -> Result<i32, CommandError> {
        use servitor_client::platform::systemd::ControlChannel;
        use tap::TapFallible;
        use tracing::warn;

        // Reaches the manager when invoked from ExecStop or ExecReload
        let state = match action {
            ControlAction::Stop => sd_notify::NotifyState::Stopping,
            ControlAction::Reload => sd_notify::NotifyState::Reloading,
        };
        sd_notify::notify(false, &[state])
            .tap_err(|e| warn!("Error notifying the service manager: {e}"))
            .ok();

        let channel = ControlChannel::connect(&self.label, self.bus_scope).await?;
        let bound = self.settings.current().control_timeout();
        let outcome = match action {
            ControlAction::Stop => channel.quit(bound).await?,
            ControlAction::Reload => channel.reload(bound).await?,
        };
        Ok(outcome.exit_code())
    }
}

type ServiceEvents = Pin<Box<dyn Stream<Item = Result<ServiceEvent, BroadcastStreamRecvError>> + Send>>;

/// Reads the settings sources again whenever the service finished a reload.
async fn reload_settings(mut events: ServiceEvents, settings: SettingsStore) {
    while let Some(event) = events.next().await {
        match event {
            Ok(ServiceEvent::Reloaded { .. }) => {
                if let Err(e) = settings.reload() {
                    warn!("Keeping the previous settings: {e}");
                }
            }
            Ok(_) => {}
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                debug!("Settings watcher missed {missed} service event(s)");
            }
        }
    }
}

async fn bounded<T>(
    bound: Option<Duration>,
    request: impl Future<Output = T>,
) -> Result<T, CommandError> {
    match bound {
        Some(bound) => tokio::time::timeout(bound, request)
            .await
            .map_err(|_| CommandError::Timeout(bound)),
        None => Ok(request.await),
    }
}

#[cfg(test)]
#[path = "./cli_test.rs"]
mod cli_test;
