mod channel;
pub use channel::*;

mod proxies;

mod unit_control;
pub use unit_control::*;
