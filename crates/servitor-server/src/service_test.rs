use servitor_core::{BackendKind, Dispatcher, Label, ServiceState};

use crate::{Service, ServiceError};

fn service() -> Service {
    Service::new(Label::new("com", "servitor", "test"), Dispatcher::new())
}

#[cfg(not(windows))]
#[tokio::test]
async fn test_windows_backend_unavailable() {
    let result = service().run(BackendKind::Windows).await;
    assert!(matches!(
        result,
        Err(ServiceError::UnsupportedBackend(BackendKind::Windows))
    ));
}

#[tokio::test]
async fn test_call_in_requires_host() {
    let result = service().run(BackendKind::CallIn).await;
    assert!(matches!(
        result,
        Err(ServiceError::InitializationFailure(_, _))
    ));
}

#[test]
fn test_new_service_is_idle() {
    let service = service();
    assert_eq!(ServiceState::Idle, service.state());
    assert_eq!("com.servitor.test", service.label().qualified_name());
}
