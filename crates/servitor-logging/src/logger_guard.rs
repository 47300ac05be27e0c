use std::sync::Arc;

/// Keeps the non-blocking writers flushing. Logs written after it drops may be lost.
#[must_use]
#[derive(Clone, Default)]
pub struct LoggerGuard {
    guards: Vec<Arc<dyn Send + Sync>>,
}

impl LoggerGuard {
    pub(crate) fn add_guard(&mut self, guard: impl Send + Sync + 'static) {
        self.guards.push(Arc::new(guard));
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl std::fmt::Debug for LoggerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerGuard")
            .field("writers", &self.guards.len())
            .finish()
    }
}
