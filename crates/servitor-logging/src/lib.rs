mod log_level;
mod logger_builder;
mod logger_guard;

pub use log_level::*;
pub use logger_builder::*;
pub use logger_guard::LoggerGuard;
pub use {time, tracing_subscriber};
