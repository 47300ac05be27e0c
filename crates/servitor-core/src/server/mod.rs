mod background_service;
pub use background_service::*;

mod event_store;
pub use event_store::*;

mod service_manager;
pub use service_manager::*;

pub use futures::Stream;
pub use tokio_stream;
