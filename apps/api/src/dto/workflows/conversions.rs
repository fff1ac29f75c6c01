use promptloom_application::{SaveWorkflowInput, WorkflowExecutionRecord};
use promptloom_core::AppError;
use promptloom_domain::{StepResult, WorkflowDefinition, WorkflowExecutionResult, WorkflowStep};
use serde_json::Value;
use uuid::Uuid;

use super::types::{
    SaveWorkflowRequest, StepResultResponse, WorkflowExecutionResponse, WorkflowResponse,
    WorkflowRunResultResponse, WorkflowStepDto,
};

impl From<WorkflowStepDto> for WorkflowStep {
    fn from(value: WorkflowStepDto) -> Self {
        Self::new(
            value_text(value.id),
            value.name,
            value.step_type,
            value_text(value.config),
        )
    }
}

impl From<&WorkflowStep> for WorkflowStepDto {
    fn from(value: &WorkflowStep) -> Self {
        Self {
            id: Value::String(value.id.clone()),
            name: value.name.clone(),
            step_type: value.step_type.clone(),
            config: Value::String(value.config.clone()),
        }
    }
}

impl TryFrom<SaveWorkflowRequest> for SaveWorkflowInput {
    type Error = AppError;

    fn try_from(value: SaveWorkflowRequest) -> Result<Self, Self::Error> {
        let workflow_id = value
            .workflow_id
            .filter(|workflow_id| !workflow_id.trim().is_empty())
            .map(|workflow_id| parse_workflow_id(workflow_id.as_str()))
            .transpose()?;

        Ok(Self {
            workflow_id,
            name: value.name,
            description: value.description,
            steps: value.steps.into_iter().map(WorkflowStep::from).collect(),
        })
    }
}

impl From<WorkflowDefinition> for WorkflowResponse {
    fn from(workflow: WorkflowDefinition) -> Self {
        Self {
            workflow_id: workflow.id().to_string(),
            name: workflow.name().as_str().to_owned(),
            description: workflow.description().map(ToOwned::to_owned),
            steps: workflow.steps().iter().map(WorkflowStepDto::from).collect(),
            created_at: workflow.created_at().to_rfc3339(),
            updated_at: workflow.updated_at().to_rfc3339(),
        }
    }
}

impl From<&StepResult> for StepResultResponse {
    fn from(value: &StepResult) -> Self {
        Self {
            step_id: value.step_id().to_owned(),
            step_name: value.step_name().to_owned(),
            status: value.status().as_str().to_owned(),
            output: value.output().to_owned(),
            error: value.error().map(ToOwned::to_owned),
            duration_ms: value.duration_ms(),
        }
    }
}

impl From<WorkflowExecutionResult> for WorkflowRunResultResponse {
    fn from(value: WorkflowExecutionResult) -> Self {
        Self {
            status: value.status().as_str().to_owned(),
            output: value.output().to_owned(),
            error: value.error().map(ToOwned::to_owned),
            step_results: value
                .step_results()
                .iter()
                .map(StepResultResponse::from)
                .collect(),
            total_duration_ms: value.total_duration_ms(),
        }
    }
}

impl From<WorkflowExecutionRecord> for WorkflowExecutionResponse {
    fn from(value: WorkflowExecutionRecord) -> Self {
        Self {
            execution_id: value.execution_id.to_string(),
            workflow_id: value.workflow_id.to_string(),
            status: value.status.as_str().to_owned(),
            input: value.input,
            output: value.output,
            error: value.error,
            step_results: value
                .step_results
                .iter()
                .map(StepResultResponse::from)
                .collect(),
            total_duration_ms: value.total_duration_ms,
            started_at: value.started_at.to_rfc3339(),
            finished_at: value.finished_at.map(|finished_at| finished_at.to_rfc3339()),
        }
    }
}

pub(crate) fn parse_workflow_id(value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|error| AppError::Validation(format!("invalid workflow id '{value}': {error}")))
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
