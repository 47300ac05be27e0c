use servitor::cli::Cli;
use servitor::config::SettingsStore;
use servitor::core::{Arguments, CommandError, Dispatcher, Value};
use servitor::error_handler::{ErrorHandler, ErrorSink};
use servitor::logging::LoggerBuilder;
use servitor::logging::tracing_subscriber::util::SubscriberInitExt;
use servitor::server::Service;
use tracing::info;

// Handlers report on stdout so the tests can check the order of events
fn report(
    event: &'static str,
) -> impl Fn(Arguments) -> Result<Value, CommandError> + Send + Sync + 'static {
    move |_| {
        println!("{event}");
        Ok(Value::Unit)
    }
}

#[tokio::main]
pub async fn main() -> Result<(), ErrorSink> {
    let label = integration_tests::label();
    ErrorHandler::new(label.clone()).install()?;

    let settings = SettingsStore::for_label(&label)?;
    let cli = Cli::builder(label.clone())
        .with_settings_store(settings.clone())
        .build();

    let (logger, guard) = LoggerBuilder::new(label)
        .with_role(cli.logging_role())
        .with_log_level(settings.current().log_level)
        .with_log_to_stderr(true)
        .with_log_to_journal(false)
        .build()?;
    logger.init();

    let stop_code: i64 = std::env::var(integration_tests::EXIT_CODE_VAR)
        .ok()
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let fail_start = std::env::var_os(integration_tests::FAIL_START_VAR).is_some();

    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_sync("onStart", move |_| {
            if fail_start {
                return Err(CommandError::handler_failure("onStart", "asked to fail"));
            }
            println!("start");
            Ok(Value::Unit)
        })?
        .register_sync("onStop", move |_| {
            println!("stop");
            Ok(Value::Int(stop_code))
        })?
        .register_sync("onReload", report("reload"))?
        .register_sync("onPause", report("pause"))?
        .register_sync("onResume", report("resume"))?
        .register_sync("SIGUSR1", report("usr1"))?;

    let exit_code = cli
        .handle_input(move |label| Service::new(label.clone(), dispatcher))
        .await;
    info!("Exiting with {exit_code}");
    drop(guard);
    std::process::exit(exit_code)
}
