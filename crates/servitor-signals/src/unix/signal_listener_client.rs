use signal_hook_tokio::Handle;

#[derive(Clone, Debug)]
pub struct SignalListenerClient {
    handle: Handle,
}

impl SignalListenerClient {
    pub(crate) fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Unregisters the handlers. The listener finishes after draining pending signals.
    pub fn close(&self) {
        self.handle.close();
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}
