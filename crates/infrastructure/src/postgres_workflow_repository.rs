use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promptloom_application::{
    CompleteWorkflowExecutionInput, CreateWorkflowExecutionInput, WorkflowExecutionListQuery,
    WorkflowExecutionRecord, WorkflowExecutionRecordStatus, WorkflowRepository,
};
use promptloom_core::{AppError, AppResult, UserId};
use promptloom_domain::{StepResult, WorkflowDefinition, WorkflowDefinitionInput, WorkflowStep};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

mod definitions;
mod executions;

/// PostgreSQL-backed workflow repository.
#[derive(Clone)]
pub struct PostgresWorkflowRepository {
    pool: PgPool,
}

impl PostgresWorkflowRepository {
    /// Creates a workflow repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct WorkflowDefinitionRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: Option<String>,
    steps: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct WorkflowExecutionRow {
    id: Uuid,
    workflow_id: Uuid,
    user_id: Uuid,
    status: String,
    input: String,
    output: String,
    step_results: Value,
    total_duration_ms: i64,
    error: Option<String>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl WorkflowRepository for PostgresWorkflowRepository {
    async fn save_workflow(&self, workflow: WorkflowDefinition) -> AppResult<()> {
        self.save_workflow_impl(workflow).await
    }

    async fn list_workflows(&self, owner: UserId) -> AppResult<Vec<WorkflowDefinition>> {
        self.list_workflows_impl(owner).await
    }

    async fn find_workflow(
        &self,
        owner: UserId,
        workflow_id: Uuid,
    ) -> AppResult<Option<WorkflowDefinition>> {
        self.find_workflow_impl(owner, workflow_id).await
    }

    async fn create_execution(
        &self,
        input: CreateWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord> {
        self.create_execution_impl(input).await
    }

    async fn complete_execution(
        &self,
        input: CompleteWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord> {
        self.complete_execution_impl(input).await
    }

    async fn list_executions(
        &self,
        owner: UserId,
        query: WorkflowExecutionListQuery,
    ) -> AppResult<Vec<WorkflowExecutionRecord>> {
        self.list_executions_impl(owner, query).await
    }
}

fn workflow_from_row(row: WorkflowDefinitionRow) -> AppResult<WorkflowDefinition> {
    let steps: Vec<WorkflowStep> = serde_json::from_value(row.steps).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode steps of workflow '{}': {error}",
            row.id
        ))
    })?;

    let workflow = WorkflowDefinition::new(WorkflowDefinitionInput {
        id: Some(row.id),
        owner: UserId::from_uuid(row.owner_id),
        name: row.name,
        description: row.description,
        steps,
    })?;

    Ok(workflow.with_timestamps(row.created_at, row.updated_at))
}

fn execution_from_row(row: WorkflowExecutionRow) -> AppResult<WorkflowExecutionRecord> {
    let step_results: Vec<StepResult> =
        serde_json::from_value(row.step_results).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode step results of execution '{}': {error}",
                row.id
            ))
        })?;

    Ok(WorkflowExecutionRecord {
        execution_id: row.id,
        workflow_id: row.workflow_id,
        user_id: UserId::from_uuid(row.user_id),
        status: WorkflowExecutionRecordStatus::parse(row.status.as_str())?,
        input: row.input,
        output: row.output,
        step_results,
        total_duration_ms: u64::try_from(row.total_duration_ms).unwrap_or_default(),
        error: row.error,
        started_at: row.started_at,
        finished_at: row.finished_at,
    })
}
