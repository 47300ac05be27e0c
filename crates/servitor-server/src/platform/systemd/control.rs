use servitor_core::{
    BusScope, CONTROL_PATH, CommandOutcome, Label, LifecycleCommand,
    runtime::{CommandSender, Enqueued},
};
use tracing::{debug, error, info};
use zbus::{connection, object_server::SignalEmitter};

/// D-Bus object a controller uses to stop or reload the running instance.
pub struct ControlInterface {
    sender: CommandSender,
}

impl ControlInterface {
    pub fn new(sender: CommandSender) -> Self {
        Self { sender }
    }

    async fn request(&self, command: LifecycleCommand) -> bool {
        info!("{command} requested over the control channel");
        match self.sender.enqueue(command) {
            Enqueued::Queued(pending) => match pending.await {
                Ok(CommandOutcome::Completed(_)) => true,
                Ok(CommandOutcome::NoOp) => {
                    debug!("{command} did not apply in the current state");
                    true
                }
                Err(e) => {
                    error!("{command} failed: {e}");
                    false
                }
            },
            // Already stopped, which is what a stop request asks for
            Enqueued::Unreachable => command == LifecycleCommand::Stop,
        }
    }
}

#[zbus::interface(name = "io.servitor.ControlChannel1")]
impl ControlInterface {
    #[zbus(name = "quitService")]
    async fn quit_service(&self) -> bool {
        self.request(LifecycleCommand::Stop).await
    }

    #[zbus(name = "reloadService")]
    async fn reload_service(&self) -> bool {
        self.request(LifecycleCommand::Reload).await
    }

    #[zbus(signal, name = "serviceStopped")]
    pub async fn service_stopped(emitter: &SignalEmitter<'_>, exit_code: i32) -> zbus::Result<()>;

    #[zbus(signal, name = "serviceReloaded")]
    pub async fn service_reloaded(emitter: &SignalEmitter<'_>, success: bool) -> zbus::Result<()>;
}

/// Claims the well-known name of `label` on the bus and serves [`ControlInterface`].
pub async fn serve_control_channel(
    label: &Label,
    bus_scope: BusScope,
    sender: CommandSender,
) -> zbus::Result<zbus::Connection> {
    let builder = match bus_scope {
        BusScope::User => connection::Builder::session()?,
        BusScope::System => connection::Builder::system()?,
    };
    let name = label.dbus_name();
    let connection = builder
        .name(name.clone())?
        .serve_at(CONTROL_PATH, ControlInterface::new(sender))?
        .build()
        .await?;
    info!("Serving control channel as {name} on the {bus_scope} bus");
    Ok(connection)
}
