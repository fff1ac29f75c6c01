use super::*;

impl WorkflowService {
    /// Creates or updates one workflow owned by the caller.
    pub async fn save_workflow(
        &self,
        actor: &UserIdentity,
        input: SaveWorkflowInput,
    ) -> AppResult<WorkflowDefinition> {
        let existing = match input.workflow_id {
            Some(workflow_id) => Some(self.get_workflow(actor, workflow_id).await?),
            None => None,
        };

        let mut workflow = WorkflowDefinition::new(WorkflowDefinitionInput {
            id: input.workflow_id,
            owner: actor.user_id(),
            name: input.name,
            description: input.description,
            steps: input.steps,
        })?;

        if let Some(existing) = existing {
            let updated_at = workflow.updated_at();
            workflow = workflow.with_timestamps(existing.created_at(), updated_at);
        }

        self.repository.save_workflow(workflow.clone()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::WorkflowSaved,
                resource_type: "workflow_definition".to_owned(),
                resource_id: workflow.id().to_string(),
                detail: Some(format!(
                    "saved workflow '{}' with {} step(s)",
                    workflow.name().as_str(),
                    workflow.steps().len()
                )),
            })
            .await?;

        Ok(workflow)
    }

    /// Lists workflows owned by the caller.
    pub async fn list_workflows(&self, actor: &UserIdentity) -> AppResult<Vec<WorkflowDefinition>> {
        self.repository.list_workflows(actor.user_id()).await
    }

    /// Returns one workflow owned by the caller.
    pub async fn get_workflow(
        &self,
        actor: &UserIdentity,
        workflow_id: Uuid,
    ) -> AppResult<WorkflowDefinition> {
        self.repository
            .find_workflow(actor.user_id(), workflow_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("workflow '{workflow_id}' does not exist")))
    }

    /// Lists executions of one of the caller's workflows.
    pub async fn list_executions(
        &self,
        actor: &UserIdentity,
        query: WorkflowExecutionListQuery,
    ) -> AppResult<Vec<WorkflowExecutionRecord>> {
        self.get_workflow(actor, query.workflow_id).await?;
        self.repository
            .list_executions(actor.user_id(), query)
            .await
    }
}
