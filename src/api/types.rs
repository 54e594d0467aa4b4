//! Shared types for the API layer.

use std::str::FromStr;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::ChatFlow;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Parse the `:flow` path segment.
pub fn parse_flow(raw: &str) -> Result<ChatFlow, ApiError> {
    ChatFlow::from_str(raw).map_err(|_| ApiError::NotFound(format!("Unknown chat '{raw}'")))
}
