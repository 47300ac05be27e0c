use std::{sync::Arc, time::Duration};

use tokio::{
    sync::RwLock,
    task::{JoinError, JoinHandle},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::BackgroundService;
use crate::BoxedError;

struct ServiceInfo {
    name: String,
    timeout: Duration,
    handle: JoinHandle<Result<(), BoxedError>>,
}

#[derive(thiserror::Error, Debug)]
pub enum BackgroundServiceError {
    #[error("Service {0} failed to shut down within the timeout")]
    TimedOut(String),
    #[error("Service {0} encountered an error: {1:?}")]
    ExecutionFailure(String, BoxedError),
    #[error("Service {0} panicked: {1}")]
    ExecutionPanic(String, JoinError),
    #[error("Service {0} was added after the manager stopped")]
    ManagerStopped(String),
}

#[derive(thiserror::Error, Debug)]
#[error("Background services failed: {0:?}")]
pub struct BackgroundServiceErrors(pub Vec<BackgroundServiceError>);

/// Owns the background tasks of one service process and joins them on shutdown.
pub struct ServiceManager {
    cancellation_token: CancellationToken,
    services: Arc<RwLock<Option<Vec<ServiceInfo>>>>,
}

impl ServiceManager {
    pub fn new(cancellation_token: CancellationToken) -> Self {
        Self {
            cancellation_token,
            services: Arc::new(RwLock::new(Some(vec![]))),
        }
    }

    pub fn get_context(&self) -> ServiceContext {
        ServiceContext {
            cancellation_token: self.cancellation_token.clone(),
            services: self.services.clone(),
        }
    }

    pub async fn stop(self) -> Result<(), BackgroundServiceErrors> {
        self.cancellation_token.cancel();
        let mut errors = vec![];
        if let Some(services) = self.services.write().await.take() {
            for service in services {
                match tokio::time::timeout(service.timeout, service.handle).await {
                    Ok(Ok(Ok(_))) => info!("Worker {} shutdown successfully", service.name),
                    Ok(Ok(Err(e))) => {
                        errors.push(BackgroundServiceError::ExecutionFailure(service.name, e))
                    }
                    Ok(Err(e)) => {
                        errors.push(BackgroundServiceError::ExecutionPanic(service.name, e))
                    }
                    Err(_) => errors.push(BackgroundServiceError::TimedOut(service.name)),
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            for e in &errors {
                error!("{e}");
            }
            Err(BackgroundServiceErrors(errors))
        }
    }
}

#[derive(Clone)]
pub struct ServiceContext {
    cancellation_token: CancellationToken,
    services: Arc<RwLock<Option<Vec<ServiceInfo>>>>,
}

impl ServiceContext {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub async fn add_service<S: BackgroundService + 'static>(
        &self,
        mut service: S,
    ) -> Result<S::Client, BackgroundServiceError> {
        let mut services = self.services.write().await;
        let Some(services) = services.as_mut() else {
            return Err(BackgroundServiceError::ManagerStopped(S::name().to_owned()));
        };
        let client = service.get_client().await;
        let context = self.clone();
        let handle = tokio::spawn(async move { service.run(context).await });
        services.push(ServiceInfo {
            handle,
            name: S::name().to_owned(),
            timeout: S::shutdown_timeout(),
        });
        Ok(client)
    }
}

#[cfg(test)]
#[path = "./service_manager_test.rs"]
mod service_manager_test;
