use async_trait::async_trait;
use enumflags2::{BitFlags, bitflags};
use servitor_core::{Arguments, BackendKind, CommandError, ServiceDescriptor, Value};

use crate::Status;

#[bitflags]
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupportFlag {
    Status = 1 << 0,
    Start = 1 << 1,
    Stop = 1 << 2,
    Pause = 1 << 3,
    Resume = 1 << 4,
    Reload = 1 << 5,
    Restart = 1 << 6,
    Autostart = 1 << 7,
    SetEnabled = 1 << 8,
    CustomCommands = 1 << 9,
    SetBlocking = 1 << 10,
}

impl SupportFlag {
    pub fn start_stop() -> BitFlags<SupportFlag> {
        SupportFlag::Start | SupportFlag::Stop
    }
}

/// Whether a command returns only once the service finished the transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum BlockMode {
    Undetermined,
    Blocking,
    NonBlocking,
}

pub(crate) fn unsupported<T>(operation: &str) -> Result<T, CommandError> {
    Err(CommandError::Unsupported(operation.to_owned()))
}

/// Controller side view of one installed service.
///
/// Every operation a backend cannot perform reports [`CommandError::Unsupported`];
/// [`ServiceControl::support_flags`] says up front which ones are available.
#[async_trait]
pub trait ServiceControl: Send + Sync {
    fn descriptor(&self) -> &ServiceDescriptor;

    fn backend(&self) -> BackendKind {
        self.descriptor().backend()
    }

    fn support_flags(&self) -> BitFlags<SupportFlag>;

    fn supports(&self, flag: SupportFlag) -> bool {
        self.support_flags().contains(flag)
    }

    fn block_mode(&self) -> BlockMode {
        BlockMode::Undetermined
    }

    fn set_blocking(&mut self, _blocking: bool) -> Result<(), CommandError> {
        unsupported("setBlocking")
    }

    async fn service_exists(&self) -> Result<bool, CommandError>;

    async fn status(&self) -> Result<Status, CommandError> {
        unsupported("status")
    }

    async fn is_autostart_enabled(&self) -> Result<bool, CommandError> {
        unsupported("isAutostartEnabled")
    }

    async fn is_enabled(&self) -> Result<bool, CommandError> {
        unsupported("isEnabled")
    }

    async fn start(&self) -> Result<(), CommandError> {
        unsupported("start")
    }

    async fn stop(&self) -> Result<(), CommandError> {
        unsupported("stop")
    }

    async fn pause(&self) -> Result<(), CommandError> {
        unsupported("pause")
    }

    async fn resume(&self) -> Result<(), CommandError> {
        unsupported("resume")
    }

    async fn reload(&self) -> Result<(), CommandError> {
        unsupported("reload")
    }

    async fn restart(&self) -> Result<(), CommandError> {
        self.stop().await?;
        self.start().await
    }

    async fn enable_autostart(&self) -> Result<(), CommandError> {
        unsupported("enableAutostart")
    }

    async fn disable_autostart(&self) -> Result<(), CommandError> {
        unsupported("disableAutostart")
    }

    async fn set_enabled(&self, _enabled: bool) -> Result<(), CommandError> {
        unsupported("setEnabled")
    }

    async fn call_generic_command(
        &self,
        name: &str,
        _arguments: Arguments,
    ) -> Result<Value, CommandError> {
        Err(CommandError::UnknownCommand(name.to_owned()))
    }
}

#[cfg(test)]
#[path = "./control_test.rs"]
mod control_test;
