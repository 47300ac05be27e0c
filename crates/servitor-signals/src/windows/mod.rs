mod signal_listener;
pub use signal_listener::*;

#[derive(Clone, Debug)]
pub struct SignalListenerClient {}
