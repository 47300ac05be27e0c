use crate::{Arguments, CommandError, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum LifecycleCommand {
    Start,
    Stop,
    Pause,
    Resume,
    Reload,
}

impl LifecycleCommand {
    /// Reserved handler name the command dispatches to.
    pub fn handler_name(&self) -> &'static str {
        match self {
            LifecycleCommand::Start => "onStart",
            LifecycleCommand::Stop => "onStop",
            LifecycleCommand::Pause => "onPause",
            LifecycleCommand::Resume => "onResume",
            LifecycleCommand::Reload => "onReload",
        }
    }

    pub fn from_handler_name(name: &str) -> Option<Self> {
        match name {
            "onStart" => Some(LifecycleCommand::Start),
            "onStop" => Some(LifecycleCommand::Stop),
            "onPause" => Some(LifecycleCommand::Pause),
            "onResume" => Some(LifecycleCommand::Resume),
            "onReload" => Some(LifecycleCommand::Reload),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Lifecycle(LifecycleCommand),
    Generic { name: String, arguments: Arguments },
}

impl Command {
    pub fn generic(name: impl Into<String>, arguments: Arguments) -> Self {
        Self::Generic {
            name: name.into(),
            arguments,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Command::Lifecycle(command) => command.handler_name(),
            Command::Generic { name, .. } => name,
        }
    }

    pub fn lifecycle(&self) -> Option<LifecycleCommand> {
        match self {
            Command::Lifecycle(command) => Some(*command),
            Command::Generic { .. } => None,
        }
    }
}

impl From<LifecycleCommand> for Command {
    fn from(command: LifecycleCommand) -> Self {
        Command::Lifecycle(command)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    Completed(Value),
    /// The command could not apply to the current state and was skipped.
    NoOp,
}

impl CommandOutcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            CommandOutcome::Completed(value) => Some(value),
            CommandOutcome::NoOp => None,
        }
    }
}

pub type CommandResult = Result<CommandOutcome, CommandError>;
