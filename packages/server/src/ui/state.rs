//! Server state shared by the handlers.

use std::sync::Arc;

use crate::domain::SharedLobbyStore;

/// Shared application state
pub struct AppState {
    /// SharedLobbyStore（共有文書ストアの抽象化）
    pub store: Arc<dyn SharedLobbyStore>,
}
