use std::sync::Arc;

use super::tokens::SessionTokens;
use crate::AppCore;

/// Shared handler state: the app core plus the HTTP session table.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<AppCore>,
    pub tokens: Arc<SessionTokens>,
}

impl AppState {
    pub fn new(core: Arc<AppCore>) -> Self {
        Self {
            core,
            tokens: Arc::new(SessionTokens::new()),
        }
    }
}
