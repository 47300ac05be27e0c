use std::sync::Arc;

use async_trait::async_trait;
use enumflags2::BitFlags;
use servitor_core::{Arguments, CommandError, ServiceDescriptor, Value};
use tracing::{debug, error};

use crate::{BlockMode, ServiceControl, SupportFlag};

const BIND_MESSAGE: &str = "must be called with a service connection as first parameter and bind flags as optional second parameter";
const UNBIND_MESSAGE: &str = "must be called with a service connection as only parameter";
const START_WITH_INTENT_MESSAGE: &str = "must be called with an intent as only parameter";

/// Bind flags used when the caller passes none.
pub const BIND_NONE: i64 = 0;

/// Component enabled setting as stored by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnabledSetting {
    /// Never changed. The manifest decides.
    Default,
    Enabled,
    Disabled,
}

/// The platform side of a call-in service, addressed by the component's class path.
pub trait ComponentHost: Send + Sync {
    fn component_exists(&self, class_path: &str) -> bool;

    /// `None` when the component cannot be resolved.
    fn enabled_setting(&self, class_path: &str) -> Option<EnabledSetting>;

    fn manifest_enabled(&self, class_path: &str) -> bool;

    fn set_enabled_setting(&self, class_path: &str, enabled: bool) -> bool;

    fn start_service(&self, class_path: &str, intent: Option<Value>) -> bool;

    fn stop_service(&self, class_path: &str) -> bool;

    fn bind_service(&self, class_path: &str, connection: Value, flags: i64) -> bool;

    fn unbind_service(&self, connection: Value);
}

fn opaque_argument(
    arguments: &Arguments,
    command: &str,
    index: usize,
    message: &str,
) -> Result<Value, CommandError> {
    match arguments.get::<Value>(command, index) {
        Ok(value @ Value::Opaque(_)) => Ok(value),
        _ => Err(CommandError::invalid_argument(command, message)),
    }
}

pub struct CallInControl {
    descriptor: ServiceDescriptor,
    host: Arc<dyn ComponentHost>,
}

impl CallInControl {
    pub fn new(descriptor: ServiceDescriptor, host: Arc<dyn ComponentHost>) -> Self {
        Self { descriptor, host }
    }

    fn class_path(&self) -> String {
        self.descriptor.class_path()
    }

    fn ensure_exists(&self) -> Result<String, CommandError> {
        let class_path = self.class_path();
        if self.host.component_exists(&class_path) {
            Ok(class_path)
        } else {
            error!("Cannot find component {class_path}");
            Err(CommandError::BackendUnavailable(format!(
                "component {class_path} does not exist"
            )))
        }
    }

    fn bind(&self, arguments: &Arguments) -> Result<Value, CommandError> {
        if arguments.expect_len("bind", 1..=2).is_err() {
            return Err(CommandError::invalid_argument("bind", BIND_MESSAGE));
        }
        let connection = opaque_argument(arguments, "bind", 0, BIND_MESSAGE)?;
        let flags = arguments
            .get_opt::<i64>("bind", 1)
            .map_err(|_| CommandError::invalid_argument("bind", BIND_MESSAGE))?
            .unwrap_or(BIND_NONE);
        let class_path = self.class_path();
        if !self.host.component_exists(&class_path) {
            return Ok(Value::Bool(false));
        }
        Ok(Value::Bool(
            self.host.bind_service(&class_path, connection, flags),
        ))
    }

    fn unbind(&self, arguments: &Arguments) -> Result<Value, CommandError> {
        if arguments.expect_len("unbind", 1..=1).is_err() {
            return Err(CommandError::invalid_argument("unbind", UNBIND_MESSAGE));
        }
        let connection = opaque_argument(arguments, "unbind", 0, UNBIND_MESSAGE)?;
        self.host.unbind_service(connection);
        Ok(Value::Unit)
    }

    fn start_with_intent(&self, arguments: &Arguments) -> Result<Value, CommandError> {
        if arguments.expect_len("startWithIntent", 1..=1).is_err() {
            return Err(CommandError::invalid_argument(
                "startWithIntent",
                START_WITH_INTENT_MESSAGE,
            ));
        }
        let intent = opaque_argument(arguments, "startWithIntent", 0, START_WITH_INTENT_MESSAGE)?;
        let class_path = self.ensure_exists()?;
        self.host.start_service(&class_path, Some(intent));
        Ok(Value::Unit)
    }
}

#[async_trait]
impl ServiceControl for CallInControl {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn support_flags(&self) -> BitFlags<SupportFlag> {
        SupportFlag::start_stop() | SupportFlag::CustomCommands | SupportFlag::SetEnabled
    }

    fn block_mode(&self) -> BlockMode {
        BlockMode::NonBlocking
    }

    async fn service_exists(&self) -> Result<bool, CommandError> {
        Ok(self.host.component_exists(&self.class_path()))
    }

    async fn is_enabled(&self) -> Result<bool, CommandError> {
        let class_path = self.class_path();
        let setting = self.host.enabled_setting(&class_path);
        debug!("Component enabled setting of {class_path}: {setting:?}");
        Ok(match setting {
            Some(EnabledSetting::Enabled) => true,
            Some(EnabledSetting::Disabled) | None => false,
            Some(EnabledSetting::Default) => self.host.manifest_enabled(&class_path),
        })
    }

    async fn start(&self) -> Result<(), CommandError> {
        let class_path = self.ensure_exists()?;
        self.host.start_service(&class_path, None);
        Ok(())
    }

    async fn stop(&self) -> Result<(), CommandError> {
        let class_path = self.ensure_exists()?;
        if self.host.stop_service(&class_path) {
            Ok(())
        } else {
            Err(CommandError::handler_failure(
                "stop",
                format!("host refused to stop {class_path}"),
            ))
        }
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), CommandError> {
        let class_path = self.class_path();
        if self.host.enabled_setting(&class_path).is_none() {
            return Err(CommandError::BackendUnavailable(format!(
                "component {class_path} does not exist"
            )));
        }
        if self.host.set_enabled_setting(&class_path, enabled) {
            Ok(())
        } else {
            Err(CommandError::handler_failure(
                "setEnabled",
                format!("host refused to change {class_path}"),
            ))
        }
    }

    async fn call_generic_command(
        &self,
        name: &str,
        arguments: Arguments,
    ) -> Result<Value, CommandError> {
        match name {
            "bind" => self.bind(&arguments),
            "unbind" => self.unbind(&arguments),
            "startWithIntent" => self.start_with_intent(&arguments),
            _ => Err(CommandError::UnknownCommand(name.to_owned())),
        }
    }
}

#[cfg(test)]
#[path = "./call_in_test.rs"]
mod call_in_test;
