use super::*;

impl WorkflowService {
    /// Runs a saved workflow behind the rate gate and usage quota and
    /// persists the execution.
    ///
    /// Once the engine has run, bookkeeping failures are logged and the
    /// result is still returned.
    pub async fn execute_saved_workflow(
        &self,
        actor: &UserIdentity,
        workflow_id: Uuid,
        input: String,
        variables: WorkflowVariables,
    ) -> AppResult<WorkflowExecutionRecord> {
        let workflow = self.get_workflow(actor, workflow_id).await?;
        self.require_execution_allowed(actor).await?;

        let execution = self
            .repository
            .create_execution(CreateWorkflowExecutionInput {
                workflow_id,
                user_id: actor.user_id(),
                input: input.clone(),
            })
            .await?;

        let result = self
            .engine
            .execute_workflow_with_variables(workflow.steps(), &input, variables)
            .await;

        let completed = match self
            .repository
            .complete_execution(CompleteWorkflowExecutionInput {
                execution_id: execution.execution_id,
                result: result.clone(),
            })
            .await
        {
            Ok(completed) => completed,
            Err(error) => {
                warn!(
                    execution_id = %execution.execution_id,
                    %error,
                    "failed to persist workflow execution result"
                );
                let mut record = execution;
                record.complete(result.clone());
                record
            }
        };

        self.finish_run(actor, &workflow_id.to_string(), &result).await;

        Ok(completed)
    }

    /// Runs an ad-hoc step list behind the same guards. Nothing is persisted
    /// apart from usage and audit.
    pub async fn execute_steps(
        &self,
        actor: &UserIdentity,
        steps: Vec<WorkflowStep>,
        input: String,
        variables: WorkflowVariables,
    ) -> AppResult<WorkflowExecutionResult> {
        WorkflowDefinition::new(WorkflowDefinitionInput {
            id: None,
            owner: actor.user_id(),
            name: "ad-hoc".to_owned(),
            description: None,
            steps: steps.clone(),
        })?;
        self.require_execution_allowed(actor).await?;

        let result = self
            .engine
            .execute_workflow_with_variables(&steps, &input, variables)
            .await;

        self.finish_run(actor, "ad-hoc", &result).await;
        Ok(result)
    }

    async fn require_execution_allowed(&self, actor: &UserIdentity) -> AppResult<()> {
        self.rate_limit_service
            .require_within_limit(RateLimitFeature::WorkflowExecution, actor)
            .await?;
        self.quota_service
            .check_quota(actor, UsageResource::WorkflowExecution)
            .await?;
        Ok(())
    }

    async fn finish_run(
        &self,
        actor: &UserIdentity,
        resource_id: &str,
        result: &WorkflowExecutionResult,
    ) {
        if result.status() == WorkflowExecutionStatus::Completed
            && let Err(error) = self
                .quota_service
                .record_usage(actor, UsageResource::WorkflowExecution)
                .await
        {
            warn!(
                workflow_id = resource_id,
                user_id = %actor.user_id(),
                %error,
                "failed to record workflow execution usage"
            );
        }

        info!(
            workflow_id = resource_id,
            user_id = %actor.user_id(),
            status = result.status().as_str(),
            steps = result.step_results().len(),
            duration_ms = result.total_duration_ms(),
            "workflow executed"
        );

        if let Err(error) = self
            .audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::WorkflowExecuted,
                resource_type: "workflow_execution".to_owned(),
                resource_id: resource_id.to_owned(),
                detail: Some(match result.error() {
                    Some(error) => format!("failed: {error}"),
                    None => format!("completed {} step(s)", result.step_results().len()),
                }),
            })
            .await
        {
            warn!(workflow_id = resource_id, %error, "failed to audit workflow execution");
        }
    }
}
