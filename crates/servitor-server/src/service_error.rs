use servitor_core::{
    BackendKind, BoxedError,
    runtime::{EXIT_FAILURE, RuntimeError},
    server::{BackgroundServiceError, BackgroundServiceErrors},
};

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("Error executing service: {0}. Background service failures: {1:?}")]
    ExecutionFailure(RuntimeError, Option<BackgroundServiceErrors>),
    #[error("{0:?}")]
    BackgroundServiceFailure(BackgroundServiceErrors),
    #[error("Service manager failed during initialization: {0}: {1:?}")]
    InitializationFailure(String, #[source] BoxedError),
    #[error("The {0} backend is not available on this platform")]
    UnsupportedBackend(BackendKind),
}

impl ServiceError {
    pub(crate) fn initialization(
        message: impl Into<String>,
        source: impl Into<BoxedError>,
    ) -> Self {
        ServiceError::InitializationFailure(message.into(), source.into())
    }

    pub(crate) fn from_service_result(
        service_result: Result<i32, RuntimeError>,
        background_service_errors: Result<(), BackgroundServiceErrors>,
    ) -> Result<i32, Self> {
        match (service_result, background_service_errors) {
            (Ok(exit_code), Ok(())) => Ok(exit_code),
            (Ok(_), Err(service_errors)) => {
                Err(ServiceError::BackgroundServiceFailure(service_errors))
            }
            (Err(e), Ok(())) => Err(ServiceError::ExecutionFailure(e, None)),
            (Err(e), Err(service_errors)) => {
                Err(ServiceError::ExecutionFailure(e, Some(service_errors)))
            }
        }
    }

    /// Process exit status to report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::ExecutionFailure(e, _) => e.exit_code(),
            _ => EXIT_FAILURE,
        }
    }
}

impl From<BackgroundServiceError> for ServiceError {
    fn from(e: BackgroundServiceError) -> Self {
        ServiceError::initialization("Error adding background service", e)
    }
}

#[cfg(test)]
#[path = "./service_error_test.rs"]
mod service_error_test;
