mod builder;
pub use builder::*;

mod control;
pub use control::*;

pub mod platform;

mod status;
pub use status::Status;

pub use servitor_core::{
    Arguments, BackendKind, BusScope, CommandError, Label, ServiceDescriptor, Value,
};
