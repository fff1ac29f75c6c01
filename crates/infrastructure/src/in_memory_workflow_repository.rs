use std::collections::HashMap;

use async_trait::async_trait;
use promptloom_application::{
    CompleteWorkflowExecutionInput, CreateWorkflowExecutionInput, WorkflowExecutionListQuery,
    WorkflowExecutionRecord, WorkflowRepository,
};
use promptloom_core::{AppError, AppResult, UserId};
use promptloom_domain::WorkflowDefinition;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory workflow repository used when no database is configured.
#[derive(Default)]
pub struct InMemoryWorkflowRepository {
    workflows: RwLock<HashMap<Uuid, WorkflowDefinition>>,
    executions: RwLock<Vec<WorkflowExecutionRecord>>,
}

impl InMemoryWorkflowRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn save_workflow(&self, workflow: WorkflowDefinition) -> AppResult<()> {
        let mut workflows = self.workflows.write().await;
        if workflows
            .get(&workflow.id())
            .is_some_and(|existing| existing.owner() != workflow.owner())
        {
            return Err(AppError::Conflict(format!(
                "workflow '{}' belongs to another user",
                workflow.id()
            )));
        }

        workflows.insert(workflow.id(), workflow);
        Ok(())
    }

    async fn list_workflows(&self, owner: UserId) -> AppResult<Vec<WorkflowDefinition>> {
        let mut workflows: Vec<WorkflowDefinition> = self
            .workflows
            .read()
            .await
            .values()
            .filter(|workflow| workflow.owner() == owner)
            .cloned()
            .collect();
        workflows.sort_by(|left, right| right.updated_at().cmp(&left.updated_at()));
        Ok(workflows)
    }

    async fn find_workflow(
        &self,
        owner: UserId,
        workflow_id: Uuid,
    ) -> AppResult<Option<WorkflowDefinition>> {
        Ok(self
            .workflows
            .read()
            .await
            .get(&workflow_id)
            .filter(|workflow| workflow.owner() == owner)
            .cloned())
    }

    async fn create_execution(
        &self,
        input: CreateWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord> {
        let record = WorkflowExecutionRecord::running(input);
        self.executions.write().await.push(record.clone());
        Ok(record)
    }

    async fn complete_execution(
        &self,
        input: CompleteWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord> {
        let mut executions = self.executions.write().await;
        let record = executions
            .iter_mut()
            .find(|record| record.execution_id == input.execution_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "workflow execution '{}' does not exist",
                    input.execution_id
                ))
            })?;

        record.complete(input.result);
        Ok(record.clone())
    }

    async fn list_executions(
        &self,
        owner: UserId,
        query: WorkflowExecutionListQuery,
    ) -> AppResult<Vec<WorkflowExecutionRecord>> {
        Ok(self
            .executions
            .read()
            .await
            .iter()
            .rev()
            .filter(|record| record.user_id == owner && record.workflow_id == query.workflow_id)
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use promptloom_application::{
        CompleteWorkflowExecutionInput, CreateWorkflowExecutionInput, WorkflowExecutionListQuery,
        WorkflowExecutionRecordStatus, WorkflowRepository,
    };
    use promptloom_core::UserId;
    use promptloom_domain::{
        WorkflowDefinition, WorkflowDefinitionInput, WorkflowExecutionResult, WorkflowStep,
    };

    use super::InMemoryWorkflowRepository;

    fn workflow(owner: UserId) -> WorkflowDefinition {
        WorkflowDefinition::new(WorkflowDefinitionInput {
            id: None,
            owner,
            name: "Quiz builder".to_owned(),
            description: None,
            steps: vec![WorkflowStep::new("1", "Ask", "prompt", "Quiz on {{input}}")],
        })
        .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn workflows_are_scoped_to_their_owner() {
        let repository = InMemoryWorkflowRepository::new();
        let owner = UserId::new();
        let saved = workflow(owner);
        assert!(repository.save_workflow(saved.clone()).await.is_ok());

        let found = repository.find_workflow(owner, saved.id()).await;
        assert!(found.is_ok_and(|found| found == Some(saved.clone())));

        let hidden = repository.find_workflow(UserId::new(), saved.id()).await;
        assert!(hidden.is_ok_and(|found| found.is_none()));
    }

    #[tokio::test]
    async fn saving_another_users_workflow_id_conflicts() {
        let repository = InMemoryWorkflowRepository::new();
        let saved = workflow(UserId::new());
        assert!(repository.save_workflow(saved.clone()).await.is_ok());

        let hijack = WorkflowDefinition::new(WorkflowDefinitionInput {
            id: Some(saved.id()),
            owner: UserId::new(),
            name: "Mine now".to_owned(),
            description: None,
            steps: Vec::new(),
        })
        .unwrap_or_else(|_| unreachable!());

        assert!(repository.save_workflow(hijack).await.is_err());
    }

    #[tokio::test]
    async fn executions_move_from_running_to_terminal_state() {
        let repository = InMemoryWorkflowRepository::new();
        let owner = UserId::new();
        let saved = workflow(owner);

        let running = repository
            .create_execution(CreateWorkflowExecutionInput {
                workflow_id: saved.id(),
                user_id: owner,
                input: "fractions".to_owned(),
            })
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(running.status, WorkflowExecutionRecordStatus::Running);

        let completed = repository
            .complete_execution(CompleteWorkflowExecutionInput {
                execution_id: running.execution_id,
                result: WorkflowExecutionResult::failed(
                    "Step 'Ask' failed: LLM service is not configured",
                    Vec::new(),
                    Duration::from_millis(12),
                ),
            })
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(completed.status, WorkflowExecutionRecordStatus::Failed);
        assert_eq!(completed.total_duration_ms, 12);

        let listed = repository
            .list_executions(
                owner,
                WorkflowExecutionListQuery {
                    workflow_id: saved.id(),
                    limit: 10,
                    offset: 0,
                },
            )
            .await
            .unwrap_or_default();
        assert_eq!(listed, vec![completed]);
    }
}
