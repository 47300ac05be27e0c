//! Entry points for hosts that call into the service from their own native threads.
//!
//! The host (an Android `Service` subclass behind a JNI shim, for example) owns the process
//! lifecycle and calls [`CallInBridge`] from whatever thread it happens to be on. Every call is
//! turned into a command on the service's queue, so the handlers still run one at a time on
//! the loop. Only one bridge exists per process.

use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicBool, Ordering},
};

use servitor_core::{
    Arguments, CommandError, CommandOutcome, LifecycleCommand, Value,
    runtime::{CommandSender, Enqueued, EXIT_FAILURE, RuntimeHooks},
    server::ServiceManager,
    CancellationToken,
};
use tracing::{debug, error, info};

use crate::{Service, ServiceError, run_to_completion};

static BRIDGE: OnceLock<CallInBridge> = OnceLock::new();

/// Callbacks into the host that owns the process.
pub trait NativeHost: Send + Sync {
    /// The service registered its entry points and is about to start.
    fn native_ready(&self) {}

    /// Ask the host to tear the service down. The host answers with
    /// [`CallInBridge::exit_service`].
    fn stop_self(&self);

    /// The service finished. The host may release the process.
    fn native_exited(&self, exit_code: i32);
}

pub struct CallInBridge {
    sender: CommandSender,
    startup_failed: Arc<AtomicBool>,
}

impl CallInBridge {
    pub(crate) fn new(sender: CommandSender, startup_failed: Arc<AtomicBool>) -> Self {
        Self {
            sender,
            startup_failed,
        }
    }

    /// The bridge of the running service, once one started.
    pub fn get() -> Option<&'static CallInBridge> {
        BRIDGE.get()
    }

    fn install(bridge: CallInBridge) -> Result<&'static CallInBridge, ServiceError> {
        BRIDGE.set(bridge).map_err(|_| {
            ServiceError::initialization(
                "Error installing call-in bridge",
                "a call-in service already ran in this process",
            )
        })?;
        BRIDGE.get().ok_or_else(|| {
            ServiceError::initialization("Error installing call-in bridge", "bridge missing")
        })
    }

    /// Runs `onStartCommand(intent, flags, start_id)` and returns its integer result, or
    /// `fallback` if the handler is missing, failed, or returned something else.
    ///
    /// Blocks the calling thread until the command ran. Must not be called from the loop.
    pub fn call_start_command(&self, intent: Value, flags: i32, start_id: i32, fallback: i32) -> i32 {
        debug!("Native onStartCommand with start id {start_id}");
        let arguments = Arguments::new(vec![intent, flags.into(), start_id.into()]);
        match self.call_blocking("onStartCommand", arguments) {
            Some(Value::Int(result)) => i32::try_from(result).unwrap_or(fallback),
            _ => fallback,
        }
    }

    /// Runs `onBind(intent)` and returns the binder it produced.
    pub fn call_bind(&self, intent: Value) -> Option<Value> {
        debug!("Native onBind");
        match self.call_blocking("onBind", Arguments::new(vec![intent])) {
            Some(Value::Unit) | None => None,
            binder => binder,
        }
    }

    /// The host is destroying the service. Queues a stop unless startup already failed.
    pub fn exit_service(&self) -> bool {
        if self.startup_failed.load(Ordering::SeqCst) {
            info!("Exit requested after a failed start");
            return true;
        }
        self.sender.post(LifecycleCommand::Stop)
    }

    fn call_blocking(&self, name: &str, arguments: Arguments) -> Option<Value> {
        let command = servitor_core::Command::generic(name, arguments);
        let Enqueued::Queued(pending) = self.sender.enqueue(command) else {
            debug!("Not calling {name} because the service stopped");
            return None;
        };
        match pending.wait_blocking() {
            Ok(CommandOutcome::Completed(value)) => Some(value),
            Ok(CommandOutcome::NoOp) => None,
            Err(CommandError::UnknownCommand(_)) => {
                debug!("No handler for {name}");
                None
            }
            Err(e) => {
                error!("{name} failed: {e}");
                None
            }
        }
    }
}

pub struct CallInHooks {
    host: Arc<dyn NativeHost>,
    startup_failed: Arc<AtomicBool>,
}

impl CallInHooks {
    pub(crate) fn new(host: Arc<dyn NativeHost>, startup_failed: Arc<AtomicBool>) -> Self {
        Self {
            host,
            startup_failed,
        }
    }
}

#[async_trait::async_trait]
impl RuntimeHooks for CallInHooks {
    async fn after_lifecycle(
        &mut self,
        command: LifecycleCommand,
        result: &Result<Value, CommandError>,
    ) {
        if command == LifecycleCommand::Start && result.is_err() {
            self.startup_failed.store(true, Ordering::SeqCst);
            self.host.stop_self();
        }
    }

    async fn on_stopped(&mut self, exit_code: i32) {
        let exit_code = if self.startup_failed.load(Ordering::SeqCst) {
            EXIT_FAILURE
        } else {
            exit_code
        };
        info!("Service exited with code {exit_code}");
        self.host.native_exited(exit_code);
    }
}

pub async fn run(service: Service) -> Result<i32, ServiceError> {
    let Some(host) = service.native_host.clone() else {
        return Err(ServiceError::initialization(
            "Error starting call-in service",
            "no native host was configured",
        ));
    };
    let startup_failed = Arc::new(AtomicBool::new(false));
    CallInBridge::install(CallInBridge::new(service.sender(), startup_failed.clone()))?;
    host.native_ready();

    let manager = ServiceManager::new(CancellationToken::new());
    let mut hooks = CallInHooks::new(host, startup_failed);
    run_to_completion(service.runtime, manager, &mut hooks).await
}

#[cfg(test)]
#[path = "./call_in_test.rs"]
mod call_in_test;
