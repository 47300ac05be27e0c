use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use servitor_core::{
    CommandError, Dispatcher, LifecycleCommand, ServiceState, Value,
    runtime::ServiceRuntime,
};

use super::{CallInBridge, CallInHooks, NativeHost};

#[derive(Default)]
struct RecordingHost {
    calls: Mutex<Vec<String>>,
}

impl NativeHost for RecordingHost {
    fn stop_self(&self) {
        self.calls.lock().unwrap().push("stopSelf".to_owned());
    }

    fn native_exited(&self, exit_code: i32) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("nativeExited({exit_code})"));
    }
}

fn start_command_dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_sync("onStartCommand", |arguments| {
            arguments.expect_len("onStartCommand", 3..=3)?;
            let start_id: i64 = arguments.get("onStartCommand", 2)?;
            Ok(Value::Int(start_id * 10))
        })
        .unwrap();
    dispatcher
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_command_result_comes_from_handler() {
    let mut runtime = ServiceRuntime::new(start_command_dispatcher());
    let bridge = CallInBridge::new(runtime.sender(), Arc::default());
    runtime.sender().post(LifecycleCommand::Start);
    runtime.process_next().await.unwrap();

    let native = std::thread::spawn(move || {
        bridge.call_start_command(Value::from("intent"), 0, 7, -1)
    });
    runtime.process_next().await.unwrap();
    assert_eq!(70, native.join().unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_command_falls_back_without_handler() {
    let mut runtime = ServiceRuntime::new(Dispatcher::new());
    let bridge = CallInBridge::new(runtime.sender(), Arc::default());
    runtime.sender().post(LifecycleCommand::Start);
    runtime.process_next().await.unwrap();

    let native = std::thread::spawn(move || {
        let start = bridge.call_start_command(Value::Unit, 0, 1, 2);
        let binder = bridge.call_bind(Value::Unit);
        (start, binder)
    });
    runtime.process_next().await.unwrap();
    runtime.process_next().await.unwrap();
    assert_eq!((2, None), native.join().unwrap());
}

#[tokio::test]
async fn test_exit_service_stops() {
    let host = Arc::new(RecordingHost::default());
    let startup_failed = Arc::new(AtomicBool::new(false));
    let runtime = ServiceRuntime::new(Dispatcher::new());
    let bridge = CallInBridge::new(runtime.sender(), startup_failed.clone());
    let mut hooks = CallInHooks::new(host.clone(), startup_failed);

    let handle = tokio::spawn(async move { runtime.run(&mut hooks).await });
    let mut state = bridge.sender.state_changes();
    state
        .wait_for(|state| *state == ServiceState::Running)
        .await
        .unwrap();

    assert!(bridge.exit_service());
    assert_eq!(Ok(0), handle.await.unwrap());
    assert_eq!(vec!["nativeExited(0)"], *host.calls.lock().unwrap());
}

#[tokio::test]
async fn test_failed_start_asks_host_to_stop() {
    let host = Arc::new(RecordingHost::default());
    let startup_failed = Arc::new(AtomicBool::new(false));
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_sync("onStart", |_| {
            Err(CommandError::handler_failure("onStart", "no storage"))
        })
        .unwrap();
    let runtime = ServiceRuntime::new(dispatcher);
    let bridge = CallInBridge::new(runtime.sender(), startup_failed.clone());
    let mut hooks = CallInHooks::new(host.clone(), startup_failed.clone());

    assert!(runtime.run(&mut hooks).await.is_err());
    assert!(startup_failed.load(Ordering::SeqCst));
    assert!(bridge.exit_service());
    assert_eq!(
        vec!["stopSelf", "nativeExited(1)"],
        *host.calls.lock().unwrap()
    );
}
