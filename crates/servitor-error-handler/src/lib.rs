use std::{
    fmt::{Debug, Display},
    sync::OnceLock,
};

use color_eyre::Report;
pub use color_eyre::config::Theme;
use servitor_core::{BoxedError, Label};
use tracing::error;

pub use color_eyre;

static HANDLER: OnceLock<ErrorHandler> = OnceLock::new();

#[derive(thiserror::Error, Debug)]
#[error("Unable to install error handler: {0}")]
pub struct HookInstallError(String);

/// Decides where fatal errors and panics of a binary are written.
#[derive(Clone)]
pub struct ErrorHandler {
    label: Label,
    theme: Theme,
    write_to_stderr: bool,
    log: bool,
}

impl ErrorHandler {
    pub fn new(label: Label) -> Self {
        Self {
            label,
            theme: Theme::dark(),
            write_to_stderr: true,
            log: false,
        }
    }

    pub fn with_theme(self, theme: Theme) -> Self {
        Self { theme, ..self }
    }

    pub fn with_write_to_stderr(self, write_to_stderr: bool) -> Self {
        Self {
            write_to_stderr,
            ..self
        }
    }

    /// Also emit the report as an `error!` event, which reaches the journal for services.
    pub fn with_log(self, log: bool) -> Self {
        Self { log, ..self }
    }

    /// Installs the report and panic hooks. Only the first call succeeds.
    pub fn install(self) -> Result<(), HookInstallError> {
        // color-eyre panics when its hooks are built twice
        HANDLER
            .set(self.clone())
            .map_err(|_| HookInstallError("a handler is already installed".to_owned()))?;
        let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
            .add_default_filters()
            .theme(self.theme)
            .into_hooks();
        eyre_hook
            .install()
            .map_err(|e| HookInstallError(e.to_string()))?;

        std::panic::set_hook(Box::new(move |info| {
            self.write_output(panic_hook.panic_report(info));
        }));
        Ok(())
    }

    fn write_output(&self, output: impl Display) {
        if self.log {
            error!("{} failed: {output}", self.label.application);
        }
        if self.write_to_stderr {
            eprintln!("{output}");
        }
    }
}

/// Error type for `main`. Printing it through `Debug` routes the report to the installed
/// [`ErrorHandler`].
pub struct ErrorSink {
    report: Report,
}

impl ErrorSink {
    pub fn new(source: impl Into<Report>) -> Self {
        Self {
            report: source.into(),
        }
    }

    pub fn from_error(source: BoxedError) -> Self {
        Self::new(color_eyre::eyre::eyre!(source))
    }

    pub fn report(&self) -> &Report {
        &self.report
    }
}

impl<R> From<R> for ErrorSink
where
    R: Into<Report>,
{
    fn from(value: R) -> Self {
        Self::new(value)
    }
}

impl Debug for ErrorSink {
    fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handler = HANDLER
            .get()
            .cloned()
            .unwrap_or_else(|| ErrorHandler::new(Label::default()));
        handler.write_output(format!("{:?}", self.report));
        Ok(())
    }
}

#[cfg(test)]
#[path = "./lib_test.rs"]
mod lib_test;
