mod service;
pub use service::*;

mod service_error;
pub use service_error::*;

pub mod platform;

pub mod socket_activation;

pub use servitor_core::runtime::{CommandSender, RuntimeHooks, ServiceEvent};
pub use servitor_core::server::{
    BackgroundService, BroadcastEventStore, EventStore, ServiceContext,
};
pub use servitor_core::{Arguments, Dispatcher, Label, Value, async_trait};
pub use servitor_signals::Signal;
#[cfg(target_os = "linux")]
pub use sd_notify;
#[cfg(windows)]
pub use windows_service;
pub use {futures, tokio};
