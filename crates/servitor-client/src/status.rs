use owo_colors::{AnsiColors, OwoColorize};
use serde::{Deserialize, Serialize};
use strum::EnumProperty;

#[derive(
    strum::Display, strum::EnumProperty, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum Status {
    #[strum(props(color = "white"))]
    Unknown,
    #[strum(props(color = "blue"), serialize = "Not Installed")]
    NotInstalled,
    #[strum(props(color = "red"))]
    Stopped,
    #[strum(props(color = "cyan"))]
    Starting,
    #[strum(props(color = "green"))]
    Running,
    #[strum(props(color = "cyan"))]
    Stopping,
    #[strum(props(color = "yellow"))]
    Paused,
    #[strum(props(color = "cyan"))]
    Pausing,
    #[strum(props(color = "cyan"))]
    Resuming,
    #[strum(props(color = "cyan"))]
    Reloading,
    #[strum(props(color = "magenta"))]
    Errored,
}

impl Status {
    pub fn pretty_print(&self) -> String {
        let val = self.to_string();
        let color: AnsiColors = self.get_str("color").unwrap_or("default").into();
        val.color(color).to_string()
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Status::Running | Status::Paused | Status::Pausing | Status::Resuming | Status::Reloading
        )
    }
}

#[cfg(test)]
#[path = "./status_test.rs"]
mod status_test;
