use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use promptloom_core::{AppError, AppResult, UserIdentity};
use promptloom_domain::{
    AuditAction, RateLimitFeature, UsageResource, WorkflowDefinition, WorkflowDefinitionInput,
    WorkflowExecutionResult, WorkflowExecutionStatus, WorkflowStep, WorkflowVariables,
};

use crate::workflow_ports::{
    CompleteWorkflowExecutionInput, CreateWorkflowExecutionInput, SaveWorkflowInput,
    WorkflowExecutionListQuery, WorkflowExecutionRecord, WorkflowRepository,
};
use crate::{AuditEvent, AuditRepository, QuotaService, RateLimitService, WorkflowEngine};

mod definitions;
mod runs;

/// Workflow definitions, guarded execution and execution history.
#[derive(Clone)]
pub struct WorkflowService {
    repository: Arc<dyn WorkflowRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    engine: WorkflowEngine,
    rate_limit_service: RateLimitService,
    quota_service: QuotaService,
}

impl WorkflowService {
    /// Creates a workflow service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        engine: WorkflowEngine,
        rate_limit_service: RateLimitService,
        quota_service: QuotaService,
    ) -> Self {
        Self {
            repository,
            audit_repository,
            engine,
            rate_limit_service,
            quota_service,
        }
    }
}

#[cfg(test)]
mod tests;
