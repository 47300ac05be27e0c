use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use super::{CommandSender, Envelope, NoHooks, RuntimeHooks, ServiceEvent};
use crate::{
    Arguments, Command, CommandError, CommandOutcome, CommandResult, Dispatcher, LifecycleCommand,
    ServiceState, Value,
    server::BroadcastEventStore,
};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Service failed to start: {0}")]
    StartFailed(CommandError),
}

impl RuntimeError {
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedCommand {
    pub command: Command,
    pub result: CommandResult,
    pub state: ServiceState,
}

/// The command queue and lifecycle state machine of one service process.
///
/// Any number of [`CommandSender`]s may enqueue from any thread. Commands are executed one
/// at a time, in arrival order, by whoever drives [`ServiceRuntime::run`] or
/// [`ServiceRuntime::process_next`].
pub struct ServiceRuntime {
    dispatcher: Arc<Dispatcher>,
    tx: mpsc::UnboundedSender<Envelope>,
    rx: mpsc::UnboundedReceiver<Envelope>,
    state_tx: watch::Sender<ServiceState>,
    state_rx: watch::Receiver<ServiceState>,
    event_tx: broadcast::Sender<ServiceEvent>,
    exit_code: i32,
}

impl ServiceRuntime {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ServiceState::Idle);
        let (event_tx, _) = broadcast::channel(32);
        Self {
            dispatcher: Arc::new(dispatcher),
            tx,
            rx,
            state_tx,
            state_rx,
            event_tx,
            exit_code: EXIT_SUCCESS,
        }
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender::new(self.tx.clone(), self.state_rx.clone())
    }

    pub fn state(&self) -> ServiceState {
        *self.state_rx.borrow()
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn event_store(&self) -> BroadcastEventStore<ServiceEvent> {
        BroadcastEventStore::new(self.event_tx.clone())
    }

    /// Queues `Start` and processes commands until the service stops.
    pub async fn run<H: RuntimeHooks + ?Sized>(mut self, hooks: &mut H) -> Result<i32, RuntimeError> {
        if self.state() == ServiceState::Idle {
            self.sender().post(LifecycleCommand::Start);
        }

        let mut start_error = None;
        while let Some(processed) = self.process_next_with(hooks).await {
            if let (Command::Lifecycle(LifecycleCommand::Start), Err(e)) =
                (&processed.command, &processed.result)
            {
                start_error = Some(e.clone());
            }
        }

        match start_error {
            Some(e) => Err(RuntimeError::StartFailed(e)),
            None => Ok(self.exit_code),
        }
    }

    pub async fn process_next(&mut self) -> Option<ProcessedCommand> {
        self.process_next_with(&mut NoHooks).await
    }

    /// Waits for the next queued command and executes it. Returns `None` once stopped.
    pub async fn process_next_with<H: RuntimeHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
    ) -> Option<ProcessedCommand> {
        if self.state().is_terminal() {
            return None;
        }
        let Envelope { command, reply } = self.rx.recv().await?;

        let result = match &command {
            Command::Lifecycle(lifecycle) => self.execute_lifecycle(*lifecycle, hooks).await,
            Command::Generic { name, arguments } => {
                self.execute_generic(name, arguments.clone()).await
            }
        };

        if let Some(reply) = reply {
            reply.send(result.clone()).ok();
        }
        if self.state().is_terminal() {
            self.discard_queued();
        }

        Some(ProcessedCommand {
            command,
            result,
            state: self.state(),
        })
    }

    async fn execute_lifecycle<H: RuntimeHooks + ?Sized>(
        &mut self,
        command: LifecycleCommand,
        hooks: &mut H,
    ) -> CommandResult {
        let current = self.state();
        if !current.accepts(command) {
            debug!("Ignoring {command} while {current}");
            return Ok(CommandOutcome::NoOp);
        }

        hooks.before_lifecycle(command).await;
        self.set_state(ServiceState::transient(command));

        let result = if current == ServiceState::Idle && command == LifecycleCommand::Stop {
            info!("Stop requested before the service started");
            Ok(Value::Unit)
        } else {
            self.invoke(command).await
        };

        let next = ServiceState::settle(command, result.is_ok());
        match &result {
            Ok(_) => info!("{command} completed"),
            Err(e) => error!("{command} failed: {e}"),
        }
        if !next.is_terminal() {
            self.set_state(next);
        }

        hooks.after_lifecycle(command, &result).await;

        let event = match (command, &result) {
            (LifecycleCommand::Start, Ok(_)) => Some(ServiceEvent::Started),
            (LifecycleCommand::Pause, Ok(_)) => Some(ServiceEvent::Paused),
            (LifecycleCommand::Resume, Ok(_)) => Some(ServiceEvent::Resumed),
            (LifecycleCommand::Reload, result) => Some(ServiceEvent::Reloaded {
                success: result.is_ok(),
            }),
            (LifecycleCommand::Stop, _) => None,
            (command, Err(e)) => Some(ServiceEvent::LifecycleFailed {
                command,
                error: e.clone(),
            }),
        };
        if let Some(event) = event {
            self.publish(event);
        }

        if next.is_terminal() {
            let exit_code = match (command, &result) {
                (LifecycleCommand::Stop, Ok(Value::Int(code))) => {
                    i32::try_from(*code).unwrap_or(EXIT_FAILURE)
                }
                (_, Ok(_)) => EXIT_SUCCESS,
                (_, Err(_)) => EXIT_FAILURE,
            };
            self.finish(exit_code, hooks).await;
        }

        result.map(CommandOutcome::Completed)
    }

    async fn invoke(&self, command: LifecycleCommand) -> Result<Value, CommandError> {
        let name = command.handler_name();
        if !self.dispatcher.is_registered(name) {
            debug!("No {name} handler registered, using the default");
            return Ok(Value::Unit);
        }
        self.dispatcher.dispatch(name, Arguments::default()).await
    }

    async fn execute_generic(&self, name: &str, arguments: Arguments) -> CommandResult {
        let result = self.dispatcher.dispatch(name, arguments).await;
        if let Err(e) = &result {
            warn!("Command {name} failed: {e}");
        }
        self.publish(ServiceEvent::CommandCompleted {
            name: name.to_owned(),
            success: result.is_ok(),
        });
        result.map(CommandOutcome::Completed)
    }

    async fn finish<H: RuntimeHooks + ?Sized>(&mut self, exit_code: i32, hooks: &mut H) {
        self.exit_code = exit_code;
        self.set_state(ServiceState::Stopped);
        hooks.on_stopped(exit_code).await;
        self.publish(ServiceEvent::Stopped { exit_code });
    }

    fn discard_queued(&mut self) {
        self.rx.close();
        while let Ok(Envelope { command, reply }) = self.rx.try_recv() {
            debug!("Discarding {} queued behind shutdown", command.name());
            if let Some(reply) = reply {
                reply
                    .send(Err(CommandError::ServiceStopping(command.name().to_owned())))
                    .ok();
            }
        }
    }

    fn set_state(&self, state: ServiceState) {
        let previous = self.state_tx.send_replace(state);
        debug!("State {previous} -> {state}");
    }

    fn publish(&self, event: ServiceEvent) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

#[cfg(test)]
#[path = "./service_runtime_test.rs"]
mod service_runtime_test;
