use std::time::Duration;

use futures::StreamExt;
use servitor_core::{
    BackendKind, Dispatcher, Label, LifecycleCommand, PidFile, Value,
    runtime::ServiceEvent,
    server::EventStore,
};

use crate::Service;

#[tokio::test]
async fn test_runs_until_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = PidFile::new(dir.path().join("standard.pid"));

    let mut dispatcher = Dispatcher::new();
    dispatcher.register_sync("onStop", |_| Ok(Value::Int(4))).unwrap();
    let service = Service::new(Label::new("com", "servitor", "standard"), dispatcher)
        .with_pid_file(pid_file.clone());
    let sender = service.sender();
    let mut events = service.event_store().subscribe_events();

    let handle = tokio::spawn(service.run(BackendKind::Standard));

    assert_eq!(ServiceEvent::Started, events.next().await.unwrap().unwrap());
    assert_eq!(Some(std::process::id() as i32), pid_file.read().unwrap());

    sender.enqueue(LifecycleCommand::Stop).completion().await.unwrap();
    let exit_code = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(4, exit_code);
    assert_eq!(None, pid_file.read().unwrap());
}
