#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux::load;

use std::sync::OnceLock;

pub use servitor_core::socket_activation::SocketActivationTable;

static SOCKETS: OnceLock<ActivatedSockets> = OnceLock::new();

/// Listening sockets the service manager opened on behalf of the service.
#[derive(Debug, Default)]
pub struct ActivatedSockets {
    table: SocketActivationTable,
    #[cfg(unix)]
    fds: Vec<std::os::fd::OwnedFd>,
}

impl ActivatedSockets {
    /// Sockets passed to this process. Loaded on first use and kept open afterwards.
    pub fn get() -> &'static ActivatedSockets {
        SOCKETS.get_or_init(|| {
            #[cfg(target_os = "linux")]
            return load();
            #[cfg(not(target_os = "linux"))]
            ActivatedSockets::default()
        })
    }

    pub fn table(&self) -> &SocketActivationTable {
        &self.table
    }

    pub fn is_activated(&self) -> bool {
        !self.table.is_empty()
    }

    /// Descriptor numbers registered under `name`, or the first descriptor without a name.
    pub fn lookup(&self, name: Option<&str>) -> Vec<i32> {
        self.table.lookup(name)
    }

    #[cfg(unix)]
    fn owned(&self, name: Option<&str>) -> Option<&std::os::fd::OwnedFd> {
        use std::os::fd::AsRawFd;

        let raw = *self.lookup(name).first()?;
        self.fds.iter().find(|fd| fd.as_raw_fd() == raw)
    }

    /// The first activated socket under `name` as a tokio TCP listener.
    #[cfg(unix)]
    pub fn tcp_listener(&self, name: Option<&str>) -> std::io::Result<Option<tokio::net::TcpListener>> {
        let Some(fd) = self.owned(name) else {
            return Ok(None);
        };
        let std_listener = std::net::TcpListener::from(fd.try_clone()?);
        std_listener.set_nonblocking(true)?;
        tokio::net::TcpListener::from_std(std_listener).map(Some)
    }

    /// The first activated socket under `name` as a tokio Unix listener.
    #[cfg(unix)]
    pub fn unix_listener(
        &self,
        name: Option<&str>,
    ) -> std::io::Result<Option<tokio::net::UnixListener>> {
        let Some(fd) = self.owned(name) else {
            return Ok(None);
        };
        let std_listener = std::os::unix::net::UnixListener::from(fd.try_clone()?);
        std_listener.set_nonblocking(true)?;
        tokio::net::UnixListener::from_std(std_listener).map(Some)
    }
}

#[cfg(all(test, unix))]
#[path = "./socket_activation_test.rs"]
mod socket_activation_test;
