use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use pin_project_lite::pin_project;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::{Command, CommandError, CommandResult, ServiceState};

#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) command: Command,
    pub(crate) reply: Option<oneshot::Sender<CommandResult>>,
}

/// Thread-safe handle for enqueueing commands from any producer.
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Envelope>,
    state: watch::Receiver<ServiceState>,
}

#[derive(Debug)]
pub enum Enqueued {
    Queued(PendingCommand),
    /// The service already stopped. Nothing was queued.
    Unreachable,
}

impl Enqueued {
    pub fn is_queued(&self) -> bool {
        matches!(self, Enqueued::Queued(_))
    }

    pub async fn completion(self) -> CommandResult {
        match self {
            Enqueued::Queued(pending) => pending.await,
            Enqueued::Unreachable => Ok(crate::CommandOutcome::NoOp),
        }
    }
}

impl CommandSender {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Envelope>,
        state: watch::Receiver<ServiceState>,
    ) -> Self {
        Self { tx, state }
    }

    pub fn enqueue(&self, command: impl Into<Command>) -> Enqueued {
        let command = command.into();
        let name = command.name().to_owned();
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.send(command, Some(reply_tx)) {
            Enqueued::Queued(PendingCommand {
                name,
                rx: reply_rx,
            })
        } else {
            Enqueued::Unreachable
        }
    }

    /// Enqueues without waiting for a result. Returns false if the service already stopped.
    pub fn post(&self, command: impl Into<Command>) -> bool {
        self.send(command.into(), None)
    }

    pub fn state(&self) -> ServiceState {
        *self.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<ServiceState> {
        self.state.clone()
    }

    fn send(&self, command: Command, reply: Option<oneshot::Sender<CommandResult>>) -> bool {
        if self.state().is_terminal() {
            debug!("Not queueing {} because the service stopped", command.name());
            return false;
        }
        self.tx.send(Envelope { command, reply }).is_ok()
    }
}

pin_project! {
    /// Resolves once the command loop finished executing the command.
    #[derive(Debug)]
    pub struct PendingCommand {
        name: String,
        #[pin]
        rx: oneshot::Receiver<CommandResult>,
    }
}

impl PendingCommand {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocks the current thread. Only for native threads outside the async runtime.
    pub fn wait_blocking(self) -> CommandResult {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(CommandError::ServiceStopping(self.name)))
    }
}

impl Future for PendingCommand {
    type Output = CommandResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        this.rx.poll(cx).map(|result| {
            result.unwrap_or_else(|_| Err(CommandError::ServiceStopping(this.name.clone())))
        })
    }
}
