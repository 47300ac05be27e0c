use std::{collections::HashMap, future::Future, sync::Arc};

use async_trait::async_trait;
use derivative::Derivative;
use tracing::{debug, warn};

use crate::{Arguments, CommandError, Value};

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, arguments: Arguments) -> Result<Value, CommandError>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, CommandError>> + Send,
{
    async fn handle(&self, arguments: Arguments) -> Result<Value, CommandError> {
        (self)(arguments).await
    }
}

/// Built-in handling a backend offers for names nobody registered.
#[async_trait]
pub trait FallbackHandler: Send + Sync {
    /// Returns `None` when the backend does not know the name either.
    async fn handle(&self, name: &str, arguments: Arguments)
    -> Option<Result<Value, CommandError>>;
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("A handler for {0} is already registered")]
    Duplicate(String),
}

#[derive(Clone, Default, Derivative)]
#[derivative(Debug)]
pub struct Dispatcher {
    #[derivative(Debug = "ignore")]
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    #[derivative(Debug = "ignore")]
    fallback: Option<Arc<dyn FallbackHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. A name can only be registered once.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl CommandHandler + 'static,
    ) -> Result<&mut Self, RegistrationError> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            warn!("Rejecting second registration for {name}");
            return Err(RegistrationError::Duplicate(name));
        }
        debug!("Registering handler {name}");
        self.handlers.insert(name, Arc::new(handler));
        Ok(self)
    }

    /// Registers a handler that does not need to await anything.
    pub fn register_sync<F>(
        &mut self,
        name: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(Arguments) -> Result<Value, CommandError> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        self.register(name, move |arguments| {
            let handler = handler.clone();
            async move { handler(arguments) }
        })
    }

    pub fn with_fallback(mut self, fallback: impl FallbackHandler + 'static) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    pub fn set_fallback(&mut self, fallback: impl FallbackHandler + 'static) {
        self.fallback = Some(Arc::new(fallback));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub async fn dispatch(&self, name: &str, arguments: Arguments) -> Result<Value, CommandError> {
        if let Some(handler) = self.handlers.get(name) {
            return handler.handle(arguments).await;
        }
        if let Some(fallback) = &self.fallback {
            if let Some(result) = fallback.handle(name, arguments).await {
                return result;
            }
        }
        Err(CommandError::UnknownCommand(name.to_owned()))
    }
}

#[cfg(test)]
#[path = "./dispatcher_test.rs"]
mod dispatcher_test;
