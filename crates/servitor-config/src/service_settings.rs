use std::{path::PathBuf, time::Duration};

use confique::Config;
use servitor_core::{BusScope, Label, PidFile};
use servitor_logging::LogLevel;

/// Settings shared by the service and controller roles.
#[derive(Config, Clone, Debug, PartialEq)]
pub struct ServiceSettings {
    /// Minimum level of emitted log events.
    #[config(env = "SERVITOR_LOG_LEVEL", default = "info")]
    pub log_level: LogLevel,
    /// Bus the control channel is registered on: "user" or "system".
    /// Detected from the effective user when unset.
    #[config(env = "SERVITOR_BUS_SCOPE")]
    pub bus_scope: Option<BusScope>,
    /// Upper bound in milliseconds when waiting for a running service.
    #[config(env = "SERVITOR_CONTROL_TIMEOUT_MS")]
    pub control_timeout_ms: Option<u64>,
    /// Pid file of services running under the standard backend.
    #[config(env = "SERVITOR_PID_FILE")]
    pub pid_file: Option<PathBuf>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            bus_scope: None,
            control_timeout_ms: None,
            pid_file: None,
        }
    }
}

impl ServiceSettings {
    pub fn control_timeout(&self) -> Option<Duration> {
        self.control_timeout_ms.map(Duration::from_millis)
    }

    /// An explicit choice wins over the configured scope, which wins over detection.
    pub fn resolve_bus_scope(&self, explicit: Option<BusScope>) -> BusScope {
        explicit
            .or(self.bus_scope)
            .unwrap_or_else(BusScope::detect)
    }

    pub fn resolve_pid_file(&self, label: &Label) -> PidFile {
        match &self.pid_file {
            Some(path) => PidFile::new(path),
            None => PidFile::for_label(label),
        }
    }
}

#[cfg(test)]
#[path = "./service_settings_test.rs"]
mod service_settings_test;
