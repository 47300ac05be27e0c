mod event;
pub use event::*;

mod hooks;
pub use hooks::*;

mod sender;
pub use sender::*;

mod service_runtime;
pub use service_runtime::*;
