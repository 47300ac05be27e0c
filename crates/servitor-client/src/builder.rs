use std::{path::PathBuf, sync::Arc};

use servitor_core::{BackendKind, BusScope, CommandError, PidFile, ServiceDescriptor};

use crate::{ServiceControl, platform::call_in::ComponentHost};

/// Creates the [`ServiceControl`] matching the descriptor's backend.
#[derive(Clone)]
pub struct ServiceControlBuilder {
    pub(crate) descriptor: ServiceDescriptor,
    pub(crate) bus_scope: BusScope,
    pub(crate) pid_file: Option<PidFile>,
    pub(crate) program: Option<(PathBuf, Vec<String>)>,
    pub(crate) component_host: Option<Arc<dyn ComponentHost>>,
    pub(crate) blocking: Option<bool>,
}

impl ServiceControlBuilder {
    pub fn new(descriptor: ServiceDescriptor) -> Self {
        Self {
            descriptor,
            bus_scope: BusScope::detect(),
            pid_file: None,
            program: None,
            component_host: None,
            blocking: None,
        }
    }

    pub fn with_bus_scope(mut self, bus_scope: BusScope) -> Self {
        self.bus_scope = bus_scope;
        self
    }

    pub fn with_pid_file(mut self, pid_file: PidFile) -> Self {
        self.pid_file = Some(pid_file);
        self
    }

    pub fn with_program<T: Into<String>>(
        mut self,
        program: impl Into<PathBuf>,
        arguments: impl IntoIterator<Item = T>,
    ) -> Self {
        self.program = Some((
            program.into(),
            arguments.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn with_component_host(mut self, host: Arc<dyn ComponentHost>) -> Self {
        self.component_host = Some(host);
        self
    }

    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.blocking = Some(blocking);
        self
    }

    #[cfg_attr(not(unix), allow(unused))]
    pub(crate) fn default_pid_file(&self) -> PidFile {
        self.pid_file.clone().unwrap_or_else(|| {
            PidFile::new(
                std::env::temp_dir().join(format!("{}.pid", self.descriptor.service_name())),
            )
        })
    }

    pub async fn build(self) -> Result<Box<dyn ServiceControl>, CommandError> {
        let mut control = self.build_backend().await?;
        if let Some(blocking) = self.blocking {
            control.set_blocking(blocking)?;
        }
        Ok(control)
    }

    async fn build_backend(&self) -> Result<Box<dyn ServiceControl>, CommandError> {
        match self.descriptor.backend() {
            BackendKind::CallIn => {
                let host = self.component_host.clone().ok_or_else(|| {
                    CommandError::BackendUnavailable(
                        "a component host is required to control call-in services".to_owned(),
                    )
                })?;
                Ok(Box::new(crate::platform::call_in::CallInControl::new(
                    self.descriptor.clone(),
                    host,
                )))
            }
            #[cfg(unix)]
            BackendKind::Standard => {
                let mut control = crate::platform::standard::StandardControl::new(
                    self.descriptor.clone(),
                    self.default_pid_file(),
                );
                if let Some((program, arguments)) = &self.program {
                    control = control.with_program(program, arguments.iter().cloned());
                }
                Ok(Box::new(control))
            }
            #[cfg(target_os = "linux")]
            BackendKind::Systemd => Ok(Box::new(
                crate::platform::systemd::SystemdControl::connect(
                    self.descriptor.clone(),
                    self.bus_scope,
                )
                .await?,
            )),
            #[cfg(windows)]
            BackendKind::Windows => Ok(Box::new(crate::platform::windows::WindowsControl::new(
                self.descriptor.clone(),
            ))),
            #[allow(unreachable_patterns)]
            backend => Err(CommandError::BackendUnavailable(format!(
                "{backend} services cannot be controlled on this platform"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "./builder_test.rs"]
mod builder_test;
