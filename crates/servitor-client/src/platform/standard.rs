use std::{path::PathBuf, process::Stdio, time::Duration};

use async_trait::async_trait;
use enumflags2::BitFlags;
use nix::{
    errno::Errno,
    sys::signal::{Signal, kill},
    unistd::Pid,
};
use servitor_core::{Arguments, CommandError, PidFile, ServiceDescriptor, Value};
use tracing::{debug, info};

use crate::{BlockMode, ServiceControl, Status, SupportFlag};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Controls a plain process through its pid file and signals.
#[derive(Clone, Debug)]
pub struct StandardControl {
    descriptor: ServiceDescriptor,
    pid_file: PidFile,
    program: Option<PathBuf>,
    arguments: Vec<String>,
    blocking: bool,
}

impl StandardControl {
    pub fn new(descriptor: ServiceDescriptor, pid_file: PidFile) -> Self {
        Self {
            descriptor,
            pid_file,
            program: None,
            arguments: vec![],
            blocking: true,
        }
    }

    /// The executable [`ServiceControl::start`] launches.
    pub fn with_program(
        mut self,
        program: impl Into<PathBuf>,
        arguments: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.program = Some(program.into());
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// Pid of the running instance. A pid file left behind by a dead process counts as stopped.
    pub fn running_pid(&self) -> Result<Option<Pid>, CommandError> {
        let pid = self.pid_file.read().map_err(|e| {
            CommandError::BackendUnavailable(format!(
                "Error reading pid file {:?}: {e}",
                self.pid_file.path()
            ))
        })?;
        Ok(pid.map(Pid::from_raw).filter(|pid| is_alive(*pid)))
    }

    fn send(&self, signal: Signal) -> Result<Pid, CommandError> {
        let pid = self.running_pid()?.ok_or_else(|| {
            CommandError::BackendUnavailable(format!(
                "{} is not running",
                self.descriptor.service_name()
            ))
        })?;
        info!("Sending {signal} to {pid}");
        kill(pid, signal).map_err(|e| CommandError::channel_error(format!("kill {pid}: {e}")))?;
        Ok(pid)
    }
}

fn is_alive(pid: Pid) -> bool {
    match kill(pid, None) {
        Ok(()) => true,
        // Exists but belongs to someone else
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[async_trait]
impl ServiceControl for StandardControl {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn support_flags(&self) -> BitFlags<SupportFlag> {
        SupportFlag::Status
            | SupportFlag::Start
            | SupportFlag::Stop
            | SupportFlag::Pause
            | SupportFlag::Resume
            | SupportFlag::Reload
            | SupportFlag::Restart
            | SupportFlag::CustomCommands
            | SupportFlag::SetBlocking
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
        let installed = self.program.as_ref().is_some_and(|program| program.exists());
        Ok(installed || self.running_pid()?.is_some())
    }

    async fn status(&self) -> Result<Status, CommandError> {
        if self.running_pid()?.is_some() {
            Ok(Status::Running)
        } else if self.service_exists().await? {
            Ok(Status::Stopped)
        } else {
            Ok(Status::NotInstalled)
        }
    }

    async fn start(&self) -> Result<(), CommandError> {
        if self.running_pid()?.is_some() {
            debug!("{} is already running", self.descriptor.service_name());
            return Ok(());
        }
        let program = self.program.as_ref().ok_or_else(|| {
            CommandError::BackendUnavailable("No executable configured for the service".to_owned())
        })?;
        info!("Launching {program:?}");
        tokio::process::Command::new(program)
            .args(&self.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CommandError::BackendUnavailable(format!("Error launching {program:?}: {e}")))?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), CommandError> {
        let pid = self.send(Signal::SIGTERM)?;
        if self.blocking {
            // A clean exit releases the pid file before the process is reaped
            while is_alive(pid) && self.pid_file.read().ok().flatten() == Some(pid.as_raw()) {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
        Ok(())
    }

    async fn pause(&self) -> Result<(), CommandError> {
        self.send(Signal::SIGTSTP).map(|_| ())
    }

    async fn resume(&self) -> Result<(), CommandError> {
        self.send(Signal::SIGCONT).map(|_| ())
    }

    async fn reload(&self) -> Result<(), CommandError> {
        self.send(Signal::SIGHUP).map(|_| ())
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
        self.send(signal)?;
        Ok(Value::Unit)
    }
}

#[cfg(test)]
#[path = "./standard_test.rs"]
mod standard_test;
