use std::os::fd::{AsRawFd, OwnedFd};

use servitor_core::socket_activation::SocketActivationTable;
use tracing::{debug, error};

use super::ActivatedSockets;

pub(super) fn load() -> ActivatedSockets {
    let fds: Vec<(Option<String>, OwnedFd)> = match sd_listen_fds::get() {
        Ok(fds) => fds
            .into_iter()
            .map(|(name, fd)| (name, fd.into_std()))
            .collect(),
        Err(e) => {
            error!("Error loading activation sockets: {e}");
            return ActivatedSockets::default();
        }
    };
    let table = SocketActivationTable::from_descriptors(
        fds.iter().map(|(name, fd)| (name.clone(), fd.as_raw_fd())),
    );
    debug!("Loaded {} activation socket(s)", fds.len());
    ActivatedSockets {
        table,
        fds: fds.into_iter().map(|(_, fd)| fd).collect(),
    }
}
