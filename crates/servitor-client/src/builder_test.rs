use servitor_core::{BackendKind, CommandError, PidFile, ServiceDescriptor};

use crate::{BlockMode, ServiceControlBuilder, SupportFlag};

#[tokio::test]
async fn test_call_in_requires_host() {
    let result = ServiceControlBuilder::new(ServiceDescriptor::new(
        "io.servitor.Example",
        BackendKind::CallIn,
    ))
    .build()
    .await;
    assert!(matches!(result, Err(CommandError::BackendUnavailable(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn test_standard_control() {
    let dir = tempfile::tempdir().unwrap();
    let control = ServiceControlBuilder::new(ServiceDescriptor::new(
        "servitor-test",
        BackendKind::Standard,
    ))
    .with_pid_file(PidFile::new(dir.path().join("servitor-test.pid")))
    .with_blocking(false)
    .build()
    .await
    .unwrap();

    assert_eq!(BackendKind::Standard, control.backend());
    assert_eq!(BlockMode::NonBlocking, control.block_mode());
    assert!(control.supports(SupportFlag::Reload));
    assert!(!control.service_exists().await.unwrap());
}

#[cfg(not(windows))]
#[tokio::test]
async fn test_windows_unavailable() {
    let result = ServiceControlBuilder::new(ServiceDescriptor::new(
        "servitor-test",
        BackendKind::Windows,
    ))
    .build()
    .await;
    assert!(matches!(result, Err(CommandError::BackendUnavailable(_))));
}
