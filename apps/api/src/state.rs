use std::sync::Arc;

use promptloom_application::{QuotaService, RateLimitService, WorkflowService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub workflow_service: WorkflowService,
    pub rate_limit_service: RateLimitService,
    pub quota_service: QuotaService,
    pub gateway_shared_secret: Arc<str>,
    pub storage_backend: &'static str,
}
