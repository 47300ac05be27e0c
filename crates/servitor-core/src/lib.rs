mod command;
mod descriptor;
mod dispatcher;
mod error;
mod label;
mod pid_file;
mod state;
mod value;

pub mod remote_call;
pub mod runtime;
pub mod server;
pub mod socket_activation;
pub mod watchdog;

use std::error::Error;

pub use async_trait::async_trait;
pub use command::*;
pub use descriptor::*;
pub use dispatcher::*;
pub use error::*;
pub use label::*;
pub use pid_file::*;
pub use state::*;
pub use tokio_util::sync::CancellationToken;
pub use value::*;

pub type BoxedError = Box<dyn Error + Send + Sync + 'static>;

/// Interface name of the control channel exposed by services running under systemd.
pub const CONTROL_INTERFACE: &str = "io.servitor.ControlChannel1";
/// Object path the control channel is served at.
pub const CONTROL_PATH: &str = "/io/servitor/ControlChannel";
