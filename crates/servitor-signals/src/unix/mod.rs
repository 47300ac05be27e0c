mod signal_listener;
pub use signal_listener::*;

mod signal_listener_client;
pub use signal_listener_client::*;
