//! Shared application state for the HTTP server.

use std::sync::Arc;

use lifecast_core::Directory;
use lifecast_core::config::ListenerSettings;

/// Shared state for the Axum application, injected via the `State`
/// extractor as `Arc<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Every instance known to this process.
    pub directory: Arc<Directory>,
    /// Queue size and deadlines applied to each `WebSocket` listener.
    pub listener: ListenerSettings,
}

impl AppState {
    /// Wrap an existing directory.
    pub const fn new(directory: Arc<Directory>, listener: ListenerSettings) -> Self {
        Self {
            directory,
            listener,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(Directory::default()), ListenerSettings::default())
    }
}
