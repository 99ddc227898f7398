use crate::call::CallHandle;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Handle to the call orchestrator
    pub call: CallHandle,
}

impl AppState {
    pub fn new(call: CallHandle) -> Self {
        Self { call }
    }
}
