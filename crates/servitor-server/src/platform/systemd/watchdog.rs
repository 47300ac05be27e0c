use std::time::Duration;

use sd_notify::NotifyState;
use servitor_core::{
    BoxedError, CancellationToken,
    server::{BackgroundService, ServiceContext},
    watchdog::heartbeat_interval,
};
use tap::TapFallible;
use tracing::{debug, error, info};

/// Sends `WATCHDOG=1` at half the timeout systemd configured for the unit.
pub struct WatchdogService {
    interval: Duration,
    cancellation_token: CancellationToken,
}

#[derive(Clone, Debug)]
pub struct WatchdogClient {
    cancellation_token: CancellationToken,
}

impl WatchdogClient {
    pub fn stop(&self) {
        self.cancellation_token.cancel();
    }
}

impl WatchdogService {
    pub fn new(timeout: Duration) -> Self {
        Self {
            interval: heartbeat_interval(timeout),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// `None` unless the unit has `WatchdogSec=` set.
    pub fn from_env() -> Option<Self> {
        let mut usec = 0;
        if sd_notify::watchdog_enabled(false, &mut usec) {
            Some(Self::new(Duration::from_micros(usec)))
        } else {
            None
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait::async_trait]
impl BackgroundService for WatchdogService {
    type Client = WatchdogClient;

    fn name<'a>() -> &'a str {
        "watchdog_service"
    }

    async fn run(self, context: ServiceContext) -> Result<(), BoxedError> {
        let shutdown = context.cancellation_token();
        let mut interval = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    debug!("Sending watchdog heartbeat");
                    sd_notify::notify(false, &[NotifyState::Watchdog])
                        .tap_err(|e| error!("Error sending watchdog heartbeat: {e:?}"))
                        .ok();
                }
                _ = self.cancellation_token.cancelled() => break,
                _ = shutdown.cancelled() => break,
            }
        }
        info!("Watchdog stopped");
        Ok(())
    }

    async fn get_client(&mut self) -> Self::Client {
        WatchdogClient {
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

#[cfg(test)]
#[path = "./watchdog_test.rs"]
mod watchdog_test;
