//! Shared state for the API layer.

use std::sync::Arc;

use crate::core_state::CoreState;

/// Shared context for all API routes.
///
/// Holds `CoreState` plus the HTTP client reused for signature/stamp
/// fetches. There is no per-user cache; handlers open their own database
/// connection per request.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub http: reqwest::Client,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            http: reqwest::Client::new(),
        }
    }
}
