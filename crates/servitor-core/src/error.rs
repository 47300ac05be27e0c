use std::{fmt::Display, time::Duration};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Invalid arguments for {command}: {message}")]
    InvalidArgument { command: String, message: String },
    #[error("No handler is registered for command {0}")]
    UnknownCommand(String),
    #[error("Service backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("Control channel error: {0}")]
    ChannelError(String),
    #[error("No result was received within {0:?}")]
    Timeout(Duration),
    #[error("Handler for {command} failed: {message}")]
    HandlerFailure { command: String, message: String },
    #[error("Command {0} was discarded because the service is stopping")]
    ServiceStopping(String),
    #[error("{0} is not supported by this backend")]
    Unsupported(String),
}

impl CommandError {
    pub fn invalid_argument(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn handler_failure(command: impl Into<String>, source: impl Display) -> Self {
        Self::HandlerFailure {
            command: command.into(),
            message: source.to_string(),
        }
    }

    pub fn channel_error(source: impl Display) -> Self {
        Self::ChannelError(source.to_string())
    }
}
