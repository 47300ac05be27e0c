use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use futures::StreamExt;

use crate::{
    Arguments, Command, CommandError, CommandOutcome, Dispatcher, LifecycleCommand, ServiceState,
    Value, arguments,
    runtime::{Enqueued, NoHooks, PendingCommand, RuntimeError, ServiceEvent, ServiceRuntime},
    server::EventStore,
};

type CallLog = Arc<Mutex<Vec<String>>>;

fn logging_dispatcher(log: &CallLog) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    for name in ["onStart", "onStop", "onPause", "onResume", "onReload"] {
        let log = log.clone();
        dispatcher
            .register_sync(name, move |_| {
                log.lock().unwrap().push(name.to_owned());
                Ok(Value::Unit)
            })
            .unwrap();
    }
    dispatcher
}

fn expect_queued(enqueued: Enqueued) -> PendingCommand {
    match enqueued {
        Enqueued::Queued(pending) => pending,
        Enqueued::Unreachable => panic!("command should have been queued"),
    }
}

#[tokio::test]
async fn test_start_then_stop() {
    let log = CallLog::default();
    let mut runtime = ServiceRuntime::new(logging_dispatcher(&log));
    let sender = runtime.sender();
    assert_eq!(ServiceState::Idle, runtime.state());

    let start = expect_queued(sender.enqueue(LifecycleCommand::Start));
    let processed = runtime.process_next().await.unwrap();
    assert_eq!(ServiceState::Running, processed.state);
    assert_eq!(Ok(CommandOutcome::Completed(Value::Unit)), start.await);

    let stop = expect_queued(sender.enqueue(LifecycleCommand::Stop));
    let processed = runtime.process_next().await.unwrap();
    assert_eq!(ServiceState::Stopped, processed.state);
    assert!(stop.await.is_ok());

    assert!(matches!(
        sender.enqueue(LifecycleCommand::Pause),
        Enqueued::Unreachable
    ));
    assert!(!sender.post(LifecycleCommand::Start));
    assert!(runtime.process_next().await.is_none());
    assert_eq!(vec!["onStart", "onStop"], *log.lock().unwrap());
}

#[tokio::test]
async fn test_pause_while_stopped_is_noop() {
    let mut runtime = ServiceRuntime::new(Dispatcher::new());
    let sender = runtime.sender();
    sender.post(LifecycleCommand::Stop);
    runtime.process_next().await.unwrap();
    assert_eq!(ServiceState::Stopped, runtime.state());

    assert_eq!(
        Ok(CommandOutcome::NoOp),
        sender.enqueue(LifecycleCommand::Pause).completion().await
    );
}

#[tokio::test]
async fn test_redundant_pause_is_noop() {
    let log = CallLog::default();
    let mut runtime = ServiceRuntime::new(logging_dispatcher(&log));
    let sender = runtime.sender();
    sender.post(LifecycleCommand::Start);
    sender.post(LifecycleCommand::Pause);
    let second_pause = expect_queued(sender.enqueue(LifecycleCommand::Pause));
    for _ in 0..3 {
        runtime.process_next().await.unwrap();
    }
    assert_eq!(ServiceState::Paused, runtime.state());
    assert_eq!(Ok(CommandOutcome::NoOp), second_pause.await);
    assert_eq!(vec!["onStart", "onPause"], *log.lock().unwrap());
}

#[tokio::test]
async fn test_commands_before_start_are_skipped() {
    let log = CallLog::default();
    let mut runtime = ServiceRuntime::new(logging_dispatcher(&log));
    let sender = runtime.sender();
    for command in [
        LifecycleCommand::Reload,
        LifecycleCommand::Pause,
        LifecycleCommand::Resume,
        LifecycleCommand::Stop,
        LifecycleCommand::Start,
    ] {
        sender.post(command);
    }

    let mut order = vec![];
    while let Some(processed) = runtime.process_next().await {
        order.push((processed.command.name().to_owned(), processed.result));
    }

    assert_eq!(
        vec![
            ("onReload".to_owned(), Ok(CommandOutcome::NoOp)),
            ("onPause".to_owned(), Ok(CommandOutcome::NoOp)),
            ("onResume".to_owned(), Ok(CommandOutcome::NoOp)),
            ("onStop".to_owned(), Ok(CommandOutcome::Completed(Value::Unit))),
        ],
        order
    );
    // Stop before Start ends the service without calling any handler
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_full_lifecycle_sequence() {
    let log = CallLog::default();
    let runtime = ServiceRuntime::new(logging_dispatcher(&log));
    let sender = runtime.sender();
    for command in [
        LifecycleCommand::Start,
        LifecycleCommand::Reload,
        LifecycleCommand::Pause,
        LifecycleCommand::Resume,
        LifecycleCommand::Reload,
        LifecycleCommand::Stop,
    ] {
        sender.post(command);
    }

    let handle = tokio::spawn(async move { runtime.run(&mut NoHooks).await });
    assert_eq!(Ok(0), handle.await.unwrap());
    assert_eq!(
        vec![
            "onStart", "onReload", "onPause", "onResume", "onReload", "onStop"
        ],
        *log.lock().unwrap()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_never_interleave() {
    const PRODUCERS: i64 = 4;
    const PER_PRODUCER: i64 = 50;

    let in_flight = Arc::new(AtomicBool::new(false));
    let overlapped = Arc::new(AtomicBool::new(false));
    let records = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher = Dispatcher::new();
    {
        let in_flight = in_flight.clone();
        let overlapped = overlapped.clone();
        let records = records.clone();
        dispatcher
            .register("record", move |args: Arguments| {
                let in_flight = in_flight.clone();
                let overlapped = overlapped.clone();
                let records = records.clone();
                async move {
                    if in_flight.swap(true, Ordering::SeqCst) {
                        overlapped.store(true, Ordering::SeqCst);
                    }
                    tokio::task::yield_now().await;
                    let producer: i64 = args.get("record", 0)?;
                    let seq: i64 = args.get("record", 1)?;
                    records.lock().unwrap().push((producer, seq));
                    in_flight.store(false, Ordering::SeqCst);
                    Ok::<_, CommandError>(Value::Unit)
                }
            })
            .unwrap();
    }

    let runtime = ServiceRuntime::new(dispatcher);
    let sender = runtime.sender();
    let handle = tokio::spawn(async move { runtime.run(&mut NoHooks).await });

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let sender = sender.clone();
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    assert!(sender.post(Command::generic("record", arguments![producer, seq])));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    sender
        .enqueue(LifecycleCommand::Stop)
        .completion()
        .await
        .unwrap();
    assert_eq!(Ok(0), handle.await.unwrap());

    assert!(!overlapped.load(Ordering::SeqCst));
    let records = records.lock().unwrap();
    assert_eq!((PRODUCERS * PER_PRODUCER) as usize, records.len());
    for producer in 0..PRODUCERS {
        let seqs: Vec<_> = records
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, seq)| *seq)
            .collect();
        assert_eq!((0..PER_PRODUCER).collect::<Vec<_>>(), seqs);
    }
}

#[tokio::test]
async fn test_start_failure_is_fatal() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_sync("onStart", |_| {
            Err(CommandError::handler_failure("onStart", "no database"))
        })
        .unwrap();
    let runtime = ServiceRuntime::new(dispatcher);
    let sender = runtime.sender();
    let events = runtime.event_store().subscribe_events();

    let result = runtime.run(&mut NoHooks).await;
    let err = result.unwrap_err();
    assert!(matches!(
        &err,
        RuntimeError::StartFailed(CommandError::HandlerFailure { .. })
    ));
    assert_eq!(1, err.exit_code());
    assert_eq!(ServiceState::Stopped, sender.state());

    let events: Vec<_> = events.map(|e| e.unwrap()).take(2).collect().await;
    assert!(matches!(
        events[0],
        ServiceEvent::LifecycleFailed {
            command: LifecycleCommand::Start,
            ..
        }
    ));
    assert_eq!(ServiceEvent::Stopped { exit_code: 1 }, events[1]);
}

#[tokio::test]
async fn test_stop_handler_sets_exit_code() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_sync("onStop", |_| Ok(Value::Int(3)))
        .unwrap();
    let runtime = ServiceRuntime::new(dispatcher);
    runtime.sender().post(LifecycleCommand::Start);
    runtime.sender().post(LifecycleCommand::Stop);
    assert_eq!(Ok(3), runtime.run(&mut NoHooks).await);
}

#[tokio::test]
async fn test_failures_after_start_do_not_block_the_queue() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_sync("onReload", |_| {
            Err(CommandError::handler_failure("onReload", "bad config"))
        })
        .unwrap();
    let mut runtime = ServiceRuntime::new(dispatcher);
    let sender = runtime.sender();
    sender.post(LifecycleCommand::Start);
    let reload = expect_queued(sender.enqueue(LifecycleCommand::Reload));
    let unknown = expect_queued(sender.enqueue(Command::generic("missing", Arguments::default())));
    let stop = expect_queued(sender.enqueue(LifecycleCommand::Stop));

    while runtime.process_next().await.is_some() {}

    assert!(matches!(
        reload.await,
        Err(CommandError::HandlerFailure { .. })
    ));
    assert_eq!(
        Err(CommandError::UnknownCommand("missing".to_owned())),
        unknown.await
    );
    assert!(stop.await.is_ok());
    assert_eq!(0, runtime.exit_code());
}

#[tokio::test]
async fn test_work_behind_stop_fails_fast() {
    let mut runtime = ServiceRuntime::new(Dispatcher::new());
    let sender = runtime.sender();
    sender.post(LifecycleCommand::Start);
    sender.post(LifecycleCommand::Stop);
    let late = expect_queued(sender.enqueue(Command::generic("SIGUSR1", Arguments::default())));

    while runtime.process_next().await.is_some() {}

    assert_eq!(
        Err(CommandError::ServiceStopping("SIGUSR1".to_owned())),
        late.await
    );
}

#[tokio::test]
async fn test_events_follow_transitions() {
    let mut runtime = ServiceRuntime::new(Dispatcher::new());
    let sender = runtime.sender();
    let events = runtime.event_store().subscribe_events();
    for command in [
        LifecycleCommand::Start,
        LifecycleCommand::Pause,
        LifecycleCommand::Resume,
        LifecycleCommand::Reload,
        LifecycleCommand::Stop,
    ] {
        sender.post(command);
    }
    while runtime.process_next().await.is_some() {}

    let events: Vec<_> = events.map(|e| e.unwrap()).take(5).collect().await;
    assert_eq!(
        vec![
            ServiceEvent::Started,
            ServiceEvent::Paused,
            ServiceEvent::Resumed,
            ServiceEvent::Reloaded { success: true },
            ServiceEvent::Stopped { exit_code: 0 },
        ],
        events
    );
}
