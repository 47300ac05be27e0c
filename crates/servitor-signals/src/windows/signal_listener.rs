use servitor_core::{
    BoxedError,
    runtime::CommandSender,
    server::{BackgroundService, BroadcastEventStore, ServiceContext},
};
use tokio::sync::broadcast;
use tracing::info;

use super::SignalListenerClient;
use crate::Signal;

/// Turns console control events into stop requests.
pub struct SignalListener {
    sender: CommandSender,
    signal_tx: broadcast::Sender<Signal>,
}

impl SignalListener {
    pub fn new(sender: CommandSender) -> std::io::Result<Self> {
        let (signal_tx, _) = broadcast::channel(32);
        Ok(Self { sender, signal_tx })
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
        let mut ctrl_c = tokio::signal::windows::ctrl_c()?;
        let mut ctrl_break = tokio::signal::windows::ctrl_break()?;
        let mut ctrl_shutdown = tokio::signal::windows::ctrl_shutdown()?;
        let mut ctrl_close = tokio::signal::windows::ctrl_close()?;

        loop {
            tokio::select! {
                _ = ctrl_c.recv() => {}
                _ = ctrl_break.recv() => {}
                _ = ctrl_shutdown.recv() => {}
                _ = ctrl_close.recv() => {}
                _ = cancellation_token.cancelled() => {
                    info!("Shutdown requested. Stopping signal listener.");
                    return Ok(());
                }
            }
            self.signal_tx.send(Signal::SIGINT).ok();
            if let Some(command) = Signal::SIGINT.command() {
                info!("Console event received. Requesting stop.");
                if !self.sender.post(command) {
                    return Ok(());
                }
            }
        }
    }

    async fn get_client(&mut self) -> Self::Client {
        SignalListenerClient {}
    }
}
