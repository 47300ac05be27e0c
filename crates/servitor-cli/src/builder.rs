use std::ffi::OsString;

use clap::{Arg, ArgAction, value_parser};
use servitor_config::{ServiceSettings, SettingsStore};
use servitor_core::{BackendKind, Label};

use crate::Cli;

pub(crate) const SYSTEM_ARG: &str = "system";
pub(crate) const USER_ARG: &str = "user";
pub(crate) const BACKEND_ARG: &str = "backend";
pub(crate) const COMMAND_ARG: &str = "command";

pub struct CliBuilder {
    label: Label,
    settings: SettingsStore,
    base_command: clap::Command,
}

impl CliBuilder {
    pub(crate) fn new(label: Label) -> Self {
        let base_command = clap::Command::new(label.application.clone());
        Self {
            label,
            settings: SettingsStore::fixed(ServiceSettings::default()),
            base_command,
        }
    }

    /// Base command to add the service arguments to, e.g. one carrying a version and about text.
    pub fn with_base_command(mut self, command: clap::Command) -> Self {
        self.base_command = command;
        self
    }

    /// Settings that stay the same for the life of the process.
    pub fn with_settings(self, settings: ServiceSettings) -> Self {
        self.with_settings_store(SettingsStore::fixed(settings))
    }

    /// Settings that the service reads again after each reload.
    pub fn with_settings_store(mut self, settings: SettingsStore) -> Self {
        self.settings = settings;
        self
    }

    pub fn command(&self) -> clap::Command {
        self.base_command
            .clone()
            .arg(
                Arg::new(SYSTEM_ARG)
                    .long(SYSTEM_ARG)
                    .action(ArgAction::SetTrue)
                    .conflicts_with(USER_ARG)
                    .help("Run as a system service, independent of the current user id"),
            )
            .arg(
                Arg::new(USER_ARG)
                    .long(USER_ARG)
                    .action(ArgAction::SetTrue)
                    .help("Run as a user service, independent of the current user id"),
            )
            .arg(
                Arg::new(BACKEND_ARG)
                    .long(BACKEND_ARG)
                    .hide(true)
                    .value_parser(value_parser!(BackendKind)),
            )
            .arg(
                Arg::new(COMMAND_ARG)
                    .value_name("stop|reload")
                    .value_parser(["stop", "reload"])
                    .help(
                        "Command for the running instance: 'reload' to reload its \
                         configuration or 'stop' to halt it",
                    ),
            )
    }

    /// Parses the process arguments. Exits on `--help` or invalid input.
    pub fn build(self) -> Cli {
        let matches = self.command().get_matches();
        Cli::new(self.label, self.settings, matches)
    }

    pub fn build_from<I, T>(self, args: I) -> Result<Cli, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command().try_get_matches_from(args)?;
        Ok(Cli::new(self.label, self.settings, matches))
    }
}
