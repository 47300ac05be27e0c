use std::time::Duration;

use futures::future;
use tokio::sync::oneshot;

use crate::{
    CommandError,
    remote_call::{PendingRemoteCall, RemoteOutcome},
};

#[tokio::test]
async fn test_reply_wins() {
    let call = PendingRemoteCall::new(
        "quitService",
        future::ready(Ok(RemoteOutcome::Completed { exit_code: 4 })),
        future::pending(),
    );
    let outcome = call.resolve(None).await.unwrap();
    assert_eq!(4, outcome.exit_code());
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_vanished_before_reply_is_success() {
    let (vanished_tx, vanished_rx) = oneshot::channel::<()>();
    let call = PendingRemoteCall::new(
        "quitService",
        future::pending(),
        async move {
            vanished_rx.await.ok();
        },
    );
    // The service exits before it gets to answer
    vanished_tx.send(()).unwrap();
    let outcome = call.resolve(None).await.unwrap();
    assert_eq!(RemoteOutcome::PeerVanished, outcome);
    assert_eq!(0, outcome.exit_code());
}

#[tokio::test]
async fn test_error_racing_exit_is_success() {
    let call = PendingRemoteCall::new(
        "quitService",
        future::ready(Err(CommandError::ChannelError("NoReply".to_owned()))),
        future::ready(()),
    );
    assert_eq!(
        RemoteOutcome::PeerVanished,
        call.resolve(None).await.unwrap()
    );
}

#[tokio::test]
async fn test_error_while_service_alive() {
    let call = PendingRemoteCall::new(
        "reloadService",
        future::ready(Err(CommandError::ChannelError("AccessDenied".to_owned()))),
        future::pending(),
    );
    assert_eq!(
        Err(CommandError::ChannelError("AccessDenied".to_owned())),
        call.resolve(None).await
    );
}

#[tokio::test(start_paused = true)]
async fn test_caller_bound() {
    let call = PendingRemoteCall::new("reloadService", future::pending(), future::pending());
    assert!(call.is_awaiting());
    assert_eq!(
        Err(CommandError::Timeout(Duration::from_secs(5))),
        call.resolve(Some(Duration::from_secs(5))).await
    );
}

#[test]
fn test_success_mapping() {
    assert_eq!(0, RemoteOutcome::from_success(true).exit_code());
    assert_eq!(1, RemoteOutcome::from_success(false).exit_code());
}
