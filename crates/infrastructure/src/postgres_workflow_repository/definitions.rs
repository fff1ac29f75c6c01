use super::*;

impl PostgresWorkflowRepository {
    pub(super) async fn save_workflow_impl(&self, workflow: WorkflowDefinition) -> AppResult<()> {
        let steps = serde_json::to_value(workflow.steps()).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode steps of workflow '{}': {error}",
                workflow.id()
            ))
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO workflow_definitions (
                id,
                owner_id,
                name,
                description,
                steps,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                steps = EXCLUDED.steps,
                updated_at = EXCLUDED.updated_at
            WHERE workflow_definitions.owner_id = EXCLUDED.owner_id
            "#,
        )
        .bind(workflow.id())
        .bind(workflow.owner().as_uuid())
        .bind(workflow.name().as_str())
        .bind(workflow.description())
        .bind(steps)
        .bind(workflow.created_at())
        .bind(workflow.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to save workflow '{}': {error}",
                workflow.id()
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "workflow '{}' belongs to another user",
                workflow.id()
            )));
        }

        Ok(())
    }

    pub(super) async fn list_workflows_impl(
        &self,
        owner: UserId,
    ) -> AppResult<Vec<WorkflowDefinition>> {
        let rows = sqlx::query_as::<_, WorkflowDefinitionRow>(
            r#"
            SELECT id, owner_id, name, description, steps, created_at, updated_at
            FROM workflow_definitions
            WHERE owner_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list workflows for user '{owner}': {error}"
            ))
        })?;

        rows.into_iter().map(workflow_from_row).collect()
    }

    pub(super) async fn find_workflow_impl(
        &self,
        owner: UserId,
        workflow_id: Uuid,
    ) -> AppResult<Option<WorkflowDefinition>> {
        let row = sqlx::query_as::<_, WorkflowDefinitionRow>(
            r#"
            SELECT id, owner_id, name, description, steps, created_at, updated_at
            FROM workflow_definitions
            WHERE owner_id = $1 AND id = $2
            "#,
        )
        .bind(owner.as_uuid())
        .bind(workflow_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find workflow '{workflow_id}': {error}"))
        })?;

        row.map(workflow_from_row).transpose()
    }
}
