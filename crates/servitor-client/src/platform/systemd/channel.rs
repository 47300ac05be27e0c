use std::time::Duration;

use futures::{Stream, StreamExt};
use servitor_core::{
    BusScope, CommandError, Label,
    remote_call::{PendingRemoteCall, RemoteOutcome},
};
use tracing::{debug, info};
use zbus::{
    Connection,
    fdo::{DBusProxy, NameOwnerChanged},
    names::BusName,
};

use super::proxies::{ServiceControlChannelProxy, serviceStopped as ServiceStopped};

/// Client for the control channel a running instance serves on the bus.
pub struct ControlChannel {
    name: String,
    bus_scope: BusScope,
    proxy: ServiceControlChannelProxy<'static>,
    dbus: DBusProxy<'static>,
}

impl ControlChannel {
    pub async fn connect(label: &Label, bus_scope: BusScope) -> Result<Self, CommandError> {
        let connection = match bus_scope {
            BusScope::User => Connection::session().await,
            BusScope::System => Connection::system().await,
        }
        .map_err(CommandError::channel_error)?;
        let name = label.dbus_name();
        let proxy = ServiceControlChannelProxy::builder(&connection)
            .destination(name.clone())
            .map_err(CommandError::channel_error)?
            .build()
            .await
            .map_err(CommandError::channel_error)?;
        let dbus = DBusProxy::new(&connection)
            .await
            .map_err(CommandError::channel_error)?;
        Ok(Self {
            name,
            bus_scope,
            proxy,
            dbus,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn is_running(&self) -> Result<bool, CommandError> {
        let name = BusName::try_from(self.name.as_str()).map_err(CommandError::channel_error)?;
        self.dbus
            .name_has_owner(name)
            .await
            .map_err(CommandError::channel_error)
    }

    /// Asks the running instance to stop and waits until it did or left the bus.
    pub async fn quit(&self, bound: Option<Duration>) -> Result<RemoteOutcome, CommandError> {
        let vanished = self.vanished().await?;
        let mut stopped = self
            .proxy
            .receive_service_stopped()
            .await
            .map_err(CommandError::channel_error)?;
        self.ensure_running().await?;

        info!("Requesting {} to stop", self.name);
        let reply = async {
            let call = self.proxy.quit_service();
            tokio::pin!(call);
            tokio::select! {
                biased;
                Some(signal) = stopped.next() => return stopped_outcome(&signal),
                result = &mut call => match result {
                    Ok(true) => debug!("{} accepted the stop request", self.name),
                    Ok(false) => return Ok(RemoteOutcome::from_success(false)),
                    Err(e) => return Err(CommandError::channel_error(e)),
                },
            }
            // The exit code only arrives with the stop signal
            match stopped.next().await {
                Some(signal) => stopped_outcome(&signal),
                None => Err(CommandError::ChannelError(
                    "stop signal stream closed".to_owned(),
                )),
            }
        };
        PendingRemoteCall::new("quitService", reply, vanished)
            .resolve(bound)
            .await
    }

    /// Asks the running instance to reload and waits for the result.
    pub async fn reload(&self, bound: Option<Duration>) -> Result<RemoteOutcome, CommandError> {
        let vanished = self.vanished().await?;
        let mut reloaded = self
            .proxy
            .receive_service_reloaded()
            .await
            .map_err(CommandError::channel_error)?;
        self.ensure_running().await?;

        info!("Requesting {} to reload", self.name);
        let reply = async {
            let call = self.proxy.reload_service();
            tokio::pin!(call);
            tokio::select! {
                biased;
                result = &mut call => result
                    .map(RemoteOutcome::from_success)
                    .map_err(CommandError::channel_error),
                Some(signal) = reloaded.next() => signal
                    .args()
                    .map(|args| RemoteOutcome::from_success(*args.success()))
                    .map_err(CommandError::channel_error),
            }
        };
        PendingRemoteCall::new("reloadService", reply, vanished)
            .resolve(bound)
            .await
    }

    async fn ensure_running(&self) -> Result<(), CommandError> {
        if self.is_running().await? {
            Ok(())
        } else {
            Err(CommandError::BackendUnavailable(format!(
                "{} is not running on the {} bus",
                self.name, self.bus_scope
            )))
        }
    }

    /// Resolves once the name loses its owner. Subscribed before the ownership check.
    async fn vanished(&self) -> Result<impl Future<Output = ()>, CommandError> {
        let changes = self
            .dbus
            .receive_name_owner_changed_with_args(&[(0, self.name.as_str())])
            .await
            .map_err(CommandError::channel_error)?;
        Ok(wait_for_release(changes))
    }
}

fn stopped_outcome(signal: &ServiceStopped) -> Result<RemoteOutcome, CommandError> {
    signal
        .args()
        .map(|args| RemoteOutcome::Completed {
            exit_code: *args.exit_code(),
        })
        .map_err(CommandError::channel_error)
}

async fn wait_for_release(changes: impl Stream<Item = NameOwnerChanged>) {
    tokio::pin!(changes);
    while let Some(change) = changes.next().await {
        match change.args() {
            Ok(args) if args.new_owner().is_none() => {
                debug!("{} released its bus name", args.name());
                return;
            }
            _ => {}
        }
    }
    // The connection closed, so no further notification can arrive
    futures::future::pending::<()>().await
}
