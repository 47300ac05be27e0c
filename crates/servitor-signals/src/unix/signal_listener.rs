use std::{ffi::c_int, io};

use futures::stream::StreamExt;
use servitor_core::{
    BoxedError,
    runtime::CommandSender,
    server::{BackgroundService, BroadcastEventStore, ServiceContext},
};
use signal_hook::consts::signal::{
    SIGCONT, SIGHUP, SIGINT, SIGQUIT, SIGTERM, SIGTSTP, SIGUSR1, SIGUSR2,
};
use signal_hook_tokio::{Signals, SignalsInfo};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::SignalListenerClient;
use crate::Signal;

/// Signals a service process reacts to by default.
pub const SERVICE_SIGNALS: [c_int; 8] = [
    SIGHUP, SIGTERM, SIGINT, SIGQUIT, SIGTSTP, SIGCONT, SIGUSR1, SIGUSR2,
];

/// Translates process signals into commands on the service's queue.
pub struct SignalListener {
    signals: SignalsInfo,
    sender: CommandSender,
    signal_tx: broadcast::Sender<Signal>,
}

impl SignalListener {
    pub fn new(sender: CommandSender) -> io::Result<Self> {
        Self::with_signals(sender, SERVICE_SIGNALS)
    }

    pub fn with_signals(
        sender: CommandSender,
        signals: impl IntoIterator<Item = c_int>,
    ) -> io::Result<Self> {
        let (signal_tx, _) = broadcast::channel(32);
        Ok(Self {
            signals: Signals::new(signals)?,
            sender,
            signal_tx,
        })
    }

    pub fn get_event_store(&self) -> BroadcastEventStore<Signal> {
        BroadcastEventStore::new(self.signal_tx.clone())
    }
}

#[async_trait::async_trait]
impl BackgroundService for SignalListener {
    type Client = SignalListenerClient;

    fn name<'a>() -> &'a str {
        "signal_listener_service"
    }

    async fn run(self, context: ServiceContext) -> Result<(), BoxedError> {
        let cancellation_token = context.cancellation_token();
        let handle = self.signals.handle();
        let mut signals = self.signals.fuse();

        loop {
            tokio::select! {
                signal = signals.next() => {
                    let Some(signal) = signal else {
                        break;
                    };
                    let name = signal_hook::low_level::signal_name(signal).unwrap_or("unknown");
                    let signal: Signal = name.into();
                    debug!("Received {signal:?}");
                    self.signal_tx.send(signal.clone()).ok();

                    let Some(command) = signal.command() else {
                        warn!("Ignoring unmapped signal {name}");
                        continue;
                    };
                    if !self.sender.post(command) {
                        info!("Service already stopped. Stopping signal listener.");
                        break;
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("Shutdown requested. Stopping signal listener.");
                    break;
                }
            }
        }
        handle.close();
        Ok(())
    }

    async fn get_client(&mut self) -> Self::Client {
        SignalListenerClient::new(self.signals.handle())
    }
}

#[cfg(test)]
#[path = "./signal_listener_test.rs"]
mod signal_listener_test;
