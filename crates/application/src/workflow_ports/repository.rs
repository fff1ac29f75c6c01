use async_trait::async_trait;
use promptloom_core::{AppResult, UserId};
use promptloom_domain::WorkflowDefinition;
use uuid::Uuid;

use super::execution::{
    CompleteWorkflowExecutionInput, CreateWorkflowExecutionInput, WorkflowExecutionListQuery,
    WorkflowExecutionRecord,
};

/// Repository port for workflow definitions and execution history.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Inserts or replaces one workflow definition.
    async fn save_workflow(&self, workflow: WorkflowDefinition) -> AppResult<()>;

    /// Lists workflow definitions owned by a user.
    async fn list_workflows(&self, owner: UserId) -> AppResult<Vec<WorkflowDefinition>>;

    /// Returns one workflow owned by a user.
    async fn find_workflow(
        &self,
        owner: UserId,
        workflow_id: Uuid,
    ) -> AppResult<Option<WorkflowDefinition>>;

    /// Creates a new execution record in running state.
    async fn create_execution(
        &self,
        input: CreateWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord>;

    /// Stores the terminal result of an execution.
    async fn complete_execution(
        &self,
        input: CompleteWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord>;

    /// Lists executions of one workflow for its owner, newest first.
    async fn list_executions(
        &self,
        owner: UserId,
        query: WorkflowExecutionListQuery,
    ) -> AppResult<Vec<WorkflowExecutionRecord>>;
}
