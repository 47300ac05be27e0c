use std::os::fd::OwnedFd;

use servitor_core::socket_activation::SocketActivationTable;

use super::ActivatedSockets;

#[tokio::test]
async fn test_named_socket_becomes_listener() {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    let fd = OwnedFd::from(std_listener);
    let raw = std::os::fd::AsRawFd::as_raw_fd(&fd);

    let sockets = ActivatedSockets {
        table: SocketActivationTable::from_descriptors([(Some("http"), raw)]),
        fds: vec![fd],
    };
    assert!(sockets.is_activated());
    assert_eq!(vec![raw], sockets.lookup(None));

    let listener = sockets.tcp_listener(Some("http")).unwrap().unwrap();
    assert_eq!(addr, listener.local_addr().unwrap());
    assert!(sockets.tcp_listener(Some("metrics")).unwrap().is_none());
}

#[test]
fn test_without_activation() {
    let sockets = ActivatedSockets::default();
    assert!(!sockets.is_activated());
    assert!(sockets.lookup(None).is_empty());
    assert!(sockets.lookup(Some("http")).is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn test_load_without_passed_fds() {
    // Only sockets passed with a matching LISTEN_PID are picked up
    if std::env::var_os("LISTEN_FDS").is_some() {
        return;
    }
    let sockets = super::load();
    assert!(!sockets.is_activated());
    assert!(sockets.fds.is_empty());
}
