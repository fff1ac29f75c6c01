use super::*;

const EXECUTION_COLUMNS: &str = "id, workflow_id, user_id, status, input, output, step_results, \
     total_duration_ms, error, started_at, finished_at";

impl PostgresWorkflowRepository {
    pub(super) async fn create_execution_impl(
        &self,
        input: CreateWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord> {
        let record = WorkflowExecutionRecord::running(input);

        sqlx::query(
            r#"
            INSERT INTO workflow_executions (
                id,
                workflow_id,
                user_id,
                status,
                input,
                started_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.execution_id)
        .bind(record.workflow_id)
        .bind(record.user_id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.input.as_str())
        .bind(record.started_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to create execution for workflow '{}': {error}",
                record.workflow_id
            ))
        })?;

        Ok(record)
    }

    pub(super) async fn complete_execution_impl(
        &self,
        input: CompleteWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord> {
        let result = input.result;
        let step_results = serde_json::to_value(result.step_results()).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode step results of execution '{}': {error}",
                input.execution_id
            ))
        })?;
        let status = WorkflowExecutionRecordStatus::from(result.status());

        let row = sqlx::query_as::<_, WorkflowExecutionRow>(&format!(
            r#"
            UPDATE workflow_executions
            SET
                status = $2,
                output = $3,
                step_results = $4,
                total_duration_ms = $5,
                error = $6,
                finished_at = now()
            WHERE id = $1
            RETURNING {EXECUTION_COLUMNS}
            "#
        ))
        .bind(input.execution_id)
        .bind(status.as_str())
        .bind(result.output())
        .bind(step_results)
        .bind(i64::try_from(result.total_duration_ms()).unwrap_or(i64::MAX))
        .bind(result.error())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to complete execution '{}': {error}",
                input.execution_id
            ))
        })?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "workflow execution '{}' does not exist",
                input.execution_id
            ))
        })?;

        execution_from_row(row)
    }

    pub(super) async fn list_executions_impl(
        &self,
        owner: UserId,
        query: WorkflowExecutionListQuery,
    ) -> AppResult<Vec<WorkflowExecutionRecord>> {
        let rows = sqlx::query_as::<_, WorkflowExecutionRow>(&format!(
            r#"
            SELECT {EXECUTION_COLUMNS}
            FROM workflow_executions
            WHERE user_id = $1 AND workflow_id = $2
            ORDER BY started_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(owner.as_uuid())
        .bind(query.workflow_id)
        .bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(query.offset).unwrap_or_default())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list executions of workflow '{}': {error}",
                query.workflow_id
            ))
        })?;

        rows.into_iter().map(execution_from_row).collect()
    }
}
