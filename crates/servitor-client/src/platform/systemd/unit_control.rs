use async_trait::async_trait;
use enumflags2::BitFlags;
use futures::StreamExt;
use nix::sys::signal::Signal;
use servitor_core::{Arguments, BusScope, CommandError, ServiceDescriptor, Value};
use tracing::{debug, info};
use zbus::{Connection, zvariant::OwnedObjectPath};

use super::proxies::{SystemdManagerProxy, SystemdUnitProxy};
use crate::{BlockMode, ServiceControl, Status, SupportFlag};

const JOB_MODE: &str = "replace";

/// Maps systemd unit states onto [`Status`].
pub fn status_from_unit(load_state: &str, active_state: &str, sub_state: &str) -> Status {
    if load_state == "not-found" {
        return Status::NotInstalled;
    }
    match active_state {
        "active" if sub_state == "reload" => Status::Reloading,
        "active" => Status::Running,
        "reloading" => Status::Reloading,
        "activating" => Status::Starting,
        "deactivating" => Status::Stopping,
        "inactive" => Status::Stopped,
        "failed" => Status::Errored,
        _ => Status::Unknown,
    }
}

fn channel_error(context: &str) -> impl Fn(zbus::Error) -> CommandError + '_ {
    move |e| CommandError::ChannelError(format!("{context}: {e}"))
}

/// Controls a unit through the systemd manager on the user or system bus.
#[derive(Clone, Debug)]
pub struct SystemdControl {
    descriptor: ServiceDescriptor,
    unit_name: String,
    bus_scope: BusScope,
    connection: Connection,
    manager: SystemdManagerProxy<'static>,
    blocking: bool,
}

impl SystemdControl {
    pub async fn connect(
        descriptor: ServiceDescriptor,
        bus_scope: BusScope,
    ) -> Result<Self, CommandError> {
        let connection = match bus_scope {
            BusScope::User => Connection::session().await,
            BusScope::System => Connection::system().await,
        }
        .map_err(channel_error("Error connecting to the bus"))?;
        let manager = SystemdManagerProxy::new(&connection)
            .await
            .map_err(channel_error("Error connecting to systemd"))?;
        Ok(Self {
            unit_name: descriptor.unit_name(),
            descriptor,
            bus_scope,
            connection,
            manager,
            blocking: true,
        })
    }

    pub fn bus_scope(&self) -> BusScope {
        self.bus_scope
    }

    async fn unit(&self) -> Result<SystemdUnitProxy<'static>, CommandError> {
        let path = self
            .manager
            .load_unit(&self.unit_name)
            .await
            .map_err(channel_error("Error loading unit"))?;
        SystemdUnitProxy::builder(&self.connection)
            .path(path)
            .map_err(channel_error("Invalid unit path"))?
            .build()
            .await
            .map_err(channel_error("Error creating unit proxy"))
    }

    async fn ensure_exists(&self) -> Result<(), CommandError> {
        if self.service_exists().await? {
            Ok(())
        } else {
            Err(CommandError::BackendUnavailable(format!(
                "{} is not installed",
                self.unit_name
            )))
        }
    }

    /// Queues a job and, in blocking mode, waits for systemd to finish it.
    async fn run_job<F, Fut>(&self, description: &str, start_job: F) -> Result<(), CommandError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = zbus::Result<OwnedObjectPath>> + Send,
    {
        if !self.blocking {
            start_job()
                .await
                .map_err(channel_error(description))?;
            return Ok(());
        }

        self.manager
            .subscribe()
            .await
            .map_err(channel_error("Error subscribing to systemd"))?;
        let mut removed = self
            .manager
            .receive_job_removed()
            .await
            .map_err(channel_error("Error subscribing to job results"))?;
        let job = start_job().await.map_err(channel_error(description))?;
        debug!("Waiting for job {}", job.as_str());

        while let Some(signal) = removed.next().await {
            let args = signal
                .args()
                .map_err(channel_error("Invalid job result"))?;
            if args.job().as_str() != job.as_str() {
                continue;
            }
            return match args.result().as_str() {
                "done" | "skipped" => Ok(()),
                result => Err(CommandError::handler_failure(
                    description,
                    format!("job finished with result '{result}'"),
                )),
            };
        }
        Err(CommandError::ChannelError(format!(
            "{description}: lost connection to systemd"
        )))
    }

    async fn kill(&self, signal: Signal) -> Result<(), CommandError> {
        self.ensure_exists().await?;
        info!("Sending {signal} to {}", self.unit_name);
        self.manager
            .kill_unit(&self.unit_name, "main", signal as i32)
            .await
            .map_err(channel_error("Error signaling unit"))
    }
}

#[async_trait]
impl ServiceControl for SystemdControl {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn support_flags(&self) -> BitFlags<SupportFlag> {
        BitFlags::all()
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
        let load_state = self
            .unit()
            .await?
            .load_state()
            .await
            .map_err(channel_error("Error reading unit state"))?;
        Ok(load_state != "not-found")
    }

    async fn status(&self) -> Result<Status, CommandError> {
        let unit = self.unit().await?;
        let load_state = unit
            .load_state()
            .await
            .map_err(channel_error("Error reading unit state"))?;
        let active_state = unit
            .active_state()
            .await
            .map_err(channel_error("Error reading unit state"))?;
        let sub_state = unit
            .sub_state()
            .await
            .map_err(channel_error("Error reading unit state"))?;
        Ok(status_from_unit(&load_state, &active_state, &sub_state))
    }

    async fn is_autostart_enabled(&self) -> Result<bool, CommandError> {
        let state = self
            .manager
            .get_unit_file_state(&self.unit_name)
            .await
            .map_err(channel_error("Error reading unit file state"))?;
        Ok(matches!(state.as_str(), "enabled" | "enabled-runtime"))
    }

    async fn is_enabled(&self) -> Result<bool, CommandError> {
        self.service_exists().await
    }

    async fn start(&self) -> Result<(), CommandError> {
        self.ensure_exists().await?;
        self.run_job("Error starting unit", || {
            self.manager.start_unit(&self.unit_name, JOB_MODE)
        })
        .await
    }

    async fn stop(&self) -> Result<(), CommandError> {
        self.ensure_exists().await?;
        self.run_job("Error stopping unit", || {
            self.manager.stop_unit(&self.unit_name, JOB_MODE)
        })
        .await
    }

    async fn pause(&self) -> Result<(), CommandError> {
        self.kill(Signal::SIGTSTP).await
    }

    async fn resume(&self) -> Result<(), CommandError> {
        self.kill(Signal::SIGCONT).await
    }

    async fn reload(&self) -> Result<(), CommandError> {
        self.ensure_exists().await?;
        self.run_job("Error reloading unit", || {
            self.manager.reload_unit(&self.unit_name, JOB_MODE)
        })
        .await
    }

    async fn restart(&self) -> Result<(), CommandError> {
        self.ensure_exists().await?;
        self.run_job("Error restarting unit", || {
            self.manager.restart_unit(&self.unit_name, JOB_MODE)
        })
        .await
    }

    async fn enable_autostart(&self) -> Result<(), CommandError> {
        self.manager
            .enable_unit_files(&[self.unit_name.as_str()], false, true)
            .await
            .map_err(channel_error("Error enabling unit"))?;
        self.manager
            .reload()
            .await
            .map_err(channel_error("Error reloading systemd"))
    }

    async fn disable_autostart(&self) -> Result<(), CommandError> {
        self.manager
            .disable_unit_files(&[self.unit_name.as_str()], false)
            .await
            .map_err(channel_error("Error disabling unit"))?;
        self.manager
            .reload()
            .await
            .map_err(channel_error("Error reloading systemd"))
    }

    async fn call_generic_command(
        &self,
        name: &str,
        arguments: Arguments,
    ) -> Result<Value, CommandError> {
        let signal = match name {
            "SIGUSR1" => Signal::SIGUSR1,
            "SIGUSR2" => Signal::SIGUSR2,
            _ => return Err(CommandError::UnknownCommand(name.to_owned())),
        };
        arguments.expect_len(name, 0..=0)?;
        self.kill(signal).await?;
        Ok(Value::Unit)
    }
}

#[cfg(test)]
#[path = "./unit_control_test.rs"]
mod unit_control_test;
