use sd_notify::NotifyState;
use servitor_core::{CONTROL_PATH, CommandError, LifecycleCommand, Value, runtime::RuntimeHooks};
use tap::TapFallible;
use tracing::{error, warn};
use zbus::object_server::SignalEmitter;

use super::{ControlInterface, WatchdogClient};

fn notify(state: NotifyState<'_>) {
    sd_notify::notify(false, &[state])
        .tap_err(|e| error!("Error sending systemd notification: {e:?}"))
        .ok();
}

/// Reports lifecycle transitions to systemd and to controllers listening on the bus.
pub struct SystemdHooks {
    _connection: zbus::Connection,
    emitter: SignalEmitter<'static>,
    watchdog: Option<WatchdogClient>,
}

impl SystemdHooks {
    pub fn new(connection: zbus::Connection, watchdog: Option<WatchdogClient>) -> zbus::Result<Self> {
        let emitter = SignalEmitter::new(&connection, CONTROL_PATH)?;
        Ok(Self {
            _connection: connection,
            emitter,
            watchdog,
        })
    }
}

#[async_trait::async_trait]
impl RuntimeHooks for SystemdHooks {
    async fn before_lifecycle(&mut self, command: LifecycleCommand) {
        match command {
            LifecycleCommand::Stop => notify(NotifyState::Stopping),
            LifecycleCommand::Reload => notify(NotifyState::Reloading),
            _ => {}
        }
    }

    async fn after_lifecycle(
        &mut self,
        command: LifecycleCommand,
        result: &Result<Value, CommandError>,
    ) {
        match command {
            LifecycleCommand::Start if result.is_ok() => notify(NotifyState::Ready),
            LifecycleCommand::Reload => {
                notify(NotifyState::Ready);
                ControlInterface::service_reloaded(&self.emitter, result.is_ok())
                    .await
                    .tap_err(|e| warn!("Error emitting serviceReloaded: {e:?}"))
                    .ok();
            }
            LifecycleCommand::Pause if result.is_ok() => crate::platform::suspend_process(),
            _ => {}
        }
    }

    async fn on_stopped(&mut self, exit_code: i32) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.stop();
        }
        ControlInterface::service_stopped(&self.emitter, exit_code)
            .await
            .tap_err(|e| warn!("Error emitting serviceStopped: {e:?}"))
            .ok();
    }
}
