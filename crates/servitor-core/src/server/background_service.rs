use std::time::Duration;

use async_trait::async_trait;

use super::ServiceContext;
use crate::BoxedError;

/// A task that lives alongside the command loop, such as a signal listener or a watchdog.
#[async_trait]
pub trait BackgroundService: Send {
    type Client: Send;

    fn shutdown_timeout() -> Duration {
        Duration::from_secs(1)
    }

    fn name<'a>() -> &'a str;

    async fn run(self, context: ServiceContext) -> Result<(), BoxedError>;

    async fn get_client(&mut self) -> Self::Client;
}
