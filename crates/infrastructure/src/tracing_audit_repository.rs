//! Audit sink for development. Logs events to tracing output.

use async_trait::async_trait;
use promptloom_application::{AuditEvent, AuditRepository};
use promptloom_core::AppResult;
use tracing::info;

/// Development audit repository that logs events instead of storing them.
#[derive(Clone, Default)]
pub struct TracingAuditRepository;

impl TracingAuditRepository {
    /// Creates a new tracing audit repository.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditRepository for TracingAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        info!(
            actor = %event.actor,
            action = event.action.as_str(),
            resource_type = %event.resource_type,
            resource_id = %event.resource_id,
            detail = event.detail.as_deref().unwrap_or_default(),
            "audit event"
        );

        Ok(())
    }
}
