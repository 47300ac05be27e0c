pub mod core {
    pub use servitor_core::*;
}
#[cfg(feature = "client")]
pub mod client {
    pub use servitor_client::*;
}
#[cfg(feature = "cli")]
pub mod cli {
    pub use servitor_cli::*;
}
#[cfg(feature = "config")]
pub mod config {
    pub use servitor_config::*;
}
#[cfg(feature = "error-handler")]
pub mod error_handler {
    pub use servitor_error_handler::*;
}
#[cfg(feature = "logging")]
pub mod logging {
    pub use servitor_logging::*;
}
#[cfg(feature = "server")]
pub mod server {
    pub use servitor_server::*;
}
#[cfg(feature = "signals")]
pub mod signals {
    pub use servitor_signals::*;
}
