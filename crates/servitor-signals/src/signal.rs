use servitor_core::{Arguments, Command, LifecycleCommand};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Signal {
    SIGTERM,
    SIGQUIT,
    SIGINT,
    SIGTSTP,
    SIGHUP,
    SIGCONT,
    SIGUSR1,
    SIGUSR2,
    Other(String),
}

impl Signal {
    /// The command a signal is turned into, if any.
    pub fn command(&self) -> Option<Command> {
        match self {
            Signal::SIGINT | Signal::SIGTERM | Signal::SIGQUIT => {
                Some(LifecycleCommand::Stop.into())
            }
            Signal::SIGHUP => Some(LifecycleCommand::Reload.into()),
            Signal::SIGTSTP => Some(LifecycleCommand::Pause.into()),
            Signal::SIGCONT => Some(LifecycleCommand::Resume.into()),
            Signal::SIGUSR1 => Some(Command::generic("SIGUSR1", Arguments::default())),
            Signal::SIGUSR2 => Some(Command::generic("SIGUSR2", Arguments::default())),
            Signal::Other(_) => None,
        }
    }
}

impl From<&str> for Signal {
    fn from(source: &str) -> Self {
        match source.to_uppercase().as_ref() {
            "SIGTERM" => Signal::SIGTERM,
            "SIGQUIT" => Signal::SIGQUIT,
            "SIGINT" => Signal::SIGINT,
            "SIGTSTP" => Signal::SIGTSTP,
            "SIGHUP" => Signal::SIGHUP,
            "SIGCONT" => Signal::SIGCONT,
            "SIGUSR1" => Signal::SIGUSR1,
            "SIGUSR2" => Signal::SIGUSR2,
            _ => Signal::Other(source.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "./signal_test.rs"]
mod signal_test;
