use std::time::Duration;

use futures::StreamExt;
use servitor_core::{
    CancellationToken, Dispatcher, LifecycleCommand, Value,
    runtime::ServiceRuntime,
    server::{EventStore, ServiceManager},
};
use signal_hook::consts::signal::SIGUSR2;

use super::SignalListener;
use crate::Signal;

#[tokio::test]
async fn test_signal_becomes_command() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_sync("SIGUSR2", |_| Ok(Value::from("handled")))
        .unwrap();
    let mut runtime = ServiceRuntime::new(dispatcher);
    let sender = runtime.sender();
    sender.post(LifecycleCommand::Start);
    runtime.process_next().await.unwrap();

    let manager = ServiceManager::new(CancellationToken::new());
    let listener = SignalListener::with_signals(sender, [SIGUSR2]).unwrap();
    let mut signals = listener.get_event_store().subscribe_events();
    manager.get_context().add_service(listener).await.unwrap();

    signal_hook::low_level::raise(SIGUSR2).unwrap();

    let processed = tokio::time::timeout(Duration::from_secs(5), runtime.process_next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!("SIGUSR2", processed.command.name());
    assert_eq!(
        Some(&Value::from("handled")),
        processed.result.unwrap().value()
    );
    assert_eq!(Signal::SIGUSR2, signals.next().await.unwrap().unwrap());

    manager.stop().await.unwrap();
}
