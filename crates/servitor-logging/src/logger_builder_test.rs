use servitor_core::Label;
use tracing::{Level, info};

use crate::{LogLevel, LoggerBuilder, LoggingRole};

fn label() -> Label {
    Label::new("io", "servitor", "logging-test")
}

#[test]
fn test_role_policy() {
    assert!(LoggingRole::Controller.writes_to_stderr(false));
    assert!(LoggingRole::Controller.writes_to_stderr(true));
    assert!(!LoggingRole::Service.writes_to_stderr(false));
    assert!(LoggingRole::Service.writes_to_stderr(true));

    assert!(LoggingRole::Service.writes_to_journal());
    assert!(!LoggingRole::Controller.writes_to_journal());
}

#[test]
fn test_overrides() {
    let builder = LoggerBuilder::new(label())
        .with_role(LoggingRole::Controller)
        .with_log_to_journal(true)
        .with_log_to_stderr(false);
    assert!(builder.journal_enabled());
    assert!(!builder.stderr_enabled());
    assert_eq!(LoggingRole::Controller, builder.role());
}

#[test]
fn test_controller_logger() {
    let (subscriber, guard) = LoggerBuilder::new(label())
        .with_role(LoggingRole::Controller)
        .with_log_level(LogLevel(Level::DEBUG))
        .build()
        .unwrap();
    assert_eq!(1, guard.len());
    tracing::subscriber::with_default(subscriber, || {
        info!("controller logger ready");
    });
}

#[cfg(feature = "file")]
#[test]
fn test_file_logger() {
    let dir = tempfile::tempdir().unwrap();
    let (subscriber, guard) = LoggerBuilder::new(label())
        .with_role(LoggingRole::Controller)
        .with_log_to_stderr(false)
        .with_file_rotation_period(tracing_appender::rolling::Rotation::NEVER)
        .with_log_dir(dir.path())
        .build()
        .unwrap();
    tracing::subscriber::with_default(subscriber, || {
        info!("written to file");
    });
    drop(guard);

    let contents = std::fs::read_to_string(dir.path().join("logging-test.log")).unwrap();
    assert!(contents.contains("written to file"));
}
