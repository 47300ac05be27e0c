use std::{
    collections::HashMap,
    io::{self, IsTerminal, stderr, stdout},
    sync::OnceLock,
};

use servitor_core::Label;
use time::{
    UtcOffset,
    format_description::well_known::{self, Rfc3339},
};
use tracing::{Subscriber, metadata::LevelFilter};
use tracing_appender::non_blocking::NonBlockingBuilder;
use tracing_subscriber::{
    EnvFilter,
    filter::Directive,
    fmt::{Layer, time::OffsetTime},
    prelude::*,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::{LogLevel, LoggerGuard};

static LOCAL_TIME: OnceLock<Result<OffsetTime<Rfc3339>, time::error::IndeterminateOffset>> =
    OnceLock::new();

// The local offset can only be determined safely while the process is single threaded
#[ctor::ctor]
fn init_time() {
    LOCAL_TIME.set(OffsetTime::local_rfc_3339()).ok();
}

#[derive(thiserror::Error, Debug)]
pub enum LoggerCreationError {
    #[error("Error creating file logging layer: Unable to locate a home directory")]
    NoHomeDir,
    #[error("Error creating log directory: {0}")]
    LogDirectory(#[source] io::Error),
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug, strum::Display)]
pub enum LogTarget {
    File,
    JournalD,
    Stdout,
    Stderr,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Timezone {
    #[default]
    Local,
    Utc,
}

/// Which side of the lifecycle the process is on. Decides the default outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum LoggingRole {
    /// Running as the service: the system journal, plus stderr when attached to a terminal.
    Service,
    /// Issuing commands to a service: stderr only.
    Controller,
}

impl LoggingRole {
    pub fn writes_to_stderr(self, is_terminal: bool) -> bool {
        match self {
            LoggingRole::Service => is_terminal,
            LoggingRole::Controller => true,
        }
    }

    pub fn writes_to_journal(self) -> bool {
        self == LoggingRole::Service
    }
}

#[derive(Debug, Clone)]
pub struct LoggerBuilder {
    label: Label,
    role: LoggingRole,
    log_level: LogLevel,
    #[cfg(feature = "file")]
    file_rotation_period: Option<tracing_appender::rolling::Rotation>,
    #[cfg(feature = "file")]
    log_dir: Option<std::path::PathBuf>,
    timezone: Timezone,
    output_buffer_limit: usize,
    target_directives: HashMap<LogTarget, Vec<Directive>>,
    env_filter_directives: Vec<Directive>,
    log_to_stdout: bool,
    log_to_stderr: Option<bool>,
    log_to_journal: Option<bool>,
}

impl LoggerBuilder {
    pub fn new(label: Label) -> Self {
        Self {
            label,
            role: LoggingRole::Service,
            log_level: LogLevel::default(),
            #[cfg(feature = "file")]
            file_rotation_period: None,
            #[cfg(feature = "file")]
            log_dir: None,
            timezone: Timezone::Local,
            // Few lines are logged so a small buffer is enough
            output_buffer_limit: 256,
            target_directives: Default::default(),
            env_filter_directives: vec![],
            log_to_stdout: false,
            log_to_stderr: None,
            log_to_journal: None,
        }
    }

    pub fn with_role(mut self, role: LoggingRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Enables the rolling file layer. Files go to the project cache directory unless
    /// [`LoggerBuilder::with_log_dir`] is set.
    #[cfg(feature = "file")]
    pub fn with_file_rotation_period(
        mut self,
        rotation: tracing_appender::rolling::Rotation,
    ) -> Self {
        self.file_rotation_period = Some(rotation);
        self
    }

    #[cfg(feature = "file")]
    pub fn with_log_dir(mut self, log_dir: impl Into<std::path::PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_log_to_stdout(mut self, log_to_stdout: bool) -> Self {
        self.log_to_stdout = log_to_stdout;
        self
    }

    /// Overrides the role's stderr policy.
    pub fn with_log_to_stderr(mut self, log_to_stderr: bool) -> Self {
        self.log_to_stderr = Some(log_to_stderr);
        self
    }

    /// Overrides the role's journal policy.
    pub fn with_log_to_journal(mut self, log_to_journal: bool) -> Self {
        self.log_to_journal = Some(log_to_journal);
        self
    }

    pub fn with_output_buffer_limit(mut self, output_buffer_limit: usize) -> Self {
        self.output_buffer_limit = output_buffer_limit;
        self
    }

    pub fn with_env_filter_directive(mut self, directive: Directive) -> Self {
        self.env_filter_directives.push(directive);
        self
    }

    pub fn with_target_directive(mut self, target: LogTarget, directive: Directive) -> Self {
        self.target_directives
            .entry(target)
            .or_default()
            .push(directive);
        self
    }

    pub fn role(&self) -> LoggingRole {
        self.role
    }

    pub fn stderr_enabled(&self) -> bool {
        self.log_to_stderr
            .unwrap_or_else(|| self.role.writes_to_stderr(stderr().is_terminal()))
    }

    pub fn journal_enabled(&self) -> bool {
        self.log_to_journal
            .unwrap_or_else(|| self.role.writes_to_journal())
    }

    fn base_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.log_level.to_level_filter().into())
            .from_env_lossy()
    }

    fn get_filter_for_target(&self, target: LogTarget) -> EnvFilter {
        let mut env_filter = self.base_filter();
        for directive in self.target_directives.get(&target).into_iter().flatten() {
            env_filter = env_filter.add_directive(directive.clone());
        }
        env_filter
    }

    fn timer(&self) -> OffsetTime<Rfc3339> {
        match (self.timezone, LOCAL_TIME.get()) {
            (Timezone::Local, Some(Ok(offset))) => offset.clone(),
            (Timezone::Local, Some(Err(e))) => {
                eprintln!("Error getting local time: {e}");
                OffsetTime::new(UtcOffset::UTC, well_known::Rfc3339)
            }
            _ => OffsetTime::new(UtcOffset::UTC, well_known::Rfc3339),
        }
    }

    pub fn build(
        self,
    ) -> Result<
        (
            impl SubscriberInitExt + Subscriber + for<'a> LookupSpan<'a>,
            LoggerGuard,
        ),
        LoggerCreationError,
    > {
        let offset = self.timer();

        let mut env_filter = self.base_filter();
        for directive in &self.env_filter_directives {
            env_filter = env_filter.add_directive(directive.clone());
        }

        let collector = tracing_subscriber::registry().with(env_filter);
        let mut guard = LoggerGuard::default();

        #[cfg(feature = "file")]
        let file_layer = match &self.file_rotation_period {
            Some(rotation) => {
                let log_dir = match &self.log_dir {
                    Some(log_dir) => log_dir.clone(),
                    None => directories::ProjectDirs::from(
                        &self.label.qualifier,
                        &self.label.organization,
                        &self.label.application,
                    )
                    .ok_or(LoggerCreationError::NoHomeDir)?
                    .cache_dir()
                    .to_owned(),
                };
                std::fs::create_dir_all(&log_dir).map_err(LoggerCreationError::LogDirectory)?;
                let file_appender = tracing_appender::rolling::RollingFileAppender::new(
                    rotation.clone(),
                    log_dir,
                    format!("{}.log", self.label.application),
                );
                let (non_blocking_file, file_guard) = NonBlockingBuilder::default()
                    .buffered_lines_limit(self.output_buffer_limit)
                    .finish(file_appender);
                guard.add_guard(file_guard);
                Some(
                    Layer::new()
                        .with_timer(offset.clone())
                        .with_thread_ids(true)
                        .with_thread_names(true)
                        .with_ansi(false)
                        .with_writer(non_blocking_file)
                        .with_filter(self.get_filter_for_target(LogTarget::File)),
                )
            }
            None => None,
        };
        #[cfg(feature = "file")]
        let collector = collector.with(file_layer);

        let stdout_layer = if self.log_to_stdout {
            let (non_blocking_stdout, stdout_guard) = NonBlockingBuilder::default()
                .buffered_lines_limit(self.output_buffer_limit)
                .finish(stdout());
            guard.add_guard(stdout_guard);
            Some(
                Layer::new()
                    .pretty()
                    .with_timer(offset.clone())
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_writer(non_blocking_stdout)
                    .with_filter(self.get_filter_for_target(LogTarget::Stdout)),
            )
        } else {
            None
        };

        let stderr_layer = if self.stderr_enabled() {
            let (non_blocking_stderr, stderr_guard) = NonBlockingBuilder::default()
                .buffered_lines_limit(self.output_buffer_limit)
                .finish(stderr());
            guard.add_guard(stderr_guard);
            Some(
                Layer::new()
                    .compact()
                    .with_timer(offset)
                    .with_target(false)
                    .with_ansi(stderr().is_terminal())
                    .with_writer(non_blocking_stderr)
                    .with_filter(self.get_filter_for_target(LogTarget::Stderr)),
            )
        } else {
            None
        };

        let collector = collector
            .with(stdout_layer)
            .with(stderr_layer)
            .with(tracing_error::ErrorLayer::default());

        #[cfg(all(target_os = "linux", feature = "linux-journald"))]
        let collector = {
            let journald_layer = if self.journal_enabled() {
                // Not every system runs journald. Missing it is not fatal.
                match tracing_journald::layer() {
                    Ok(layer) => Some(
                        layer
                            .with_syslog_identifier(self.label.application.clone())
                            .with_filter(self.get_filter_for_target(LogTarget::JournalD)),
                    ),
                    Err(e) => {
                        eprintln!("Error connecting to journald: {e}");
                        None
                    }
                }
            } else {
                None
            };
            collector.with(journald_layer)
        };

        Ok((collector, guard))
    }
}

#[cfg(test)]
#[path = "./logger_builder_test.rs"]
mod logger_builder_test;
