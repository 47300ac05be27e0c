mod error;
mod service_settings;
mod settings_store;

pub use confique;
pub use error::*;
pub use service_settings::*;
pub use settings_store::*;
