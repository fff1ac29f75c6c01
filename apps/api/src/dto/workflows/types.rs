use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// One workflow step as exchanged with clients.
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/workflow-step-dto.ts"
)]
pub struct WorkflowStepDto {
    #[ts(type = "string | number")]
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    #[ts(type = "string | Record<string, unknown>")]
    pub config: Value,
}

/// Incoming payload for workflow create/update.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-workflow-request.ts"
)]
pub struct SaveWorkflowRequest {
    pub workflow_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<WorkflowStepDto>,
}

/// Incoming payload for running a saved workflow.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/execute-workflow-request.ts"
)]
pub struct ExecuteWorkflowRequest {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// Incoming payload for running an unsaved step list.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/run-workflow-request.ts"
)]
pub struct RunWorkflowRequest {
    pub steps: Vec<WorkflowStepDto>,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// API representation of a workflow definition.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/workflow-response.ts"
)]
pub struct WorkflowResponse {
    pub workflow_id: String,
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<WorkflowStepDto>,
    pub created_at: String,
    pub updated_at: String,
}

/// API representation of one step outcome.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/step-result-response.ts"
)]
pub struct StepResultResponse {
    pub step_id: String,
    pub step_name: String,
    pub status: String,
    pub output: String,
    pub error: Option<String>,
    #[ts(type = "number")]
    pub duration_ms: u64,
}

/// API representation of an ad-hoc run.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/workflow-run-result-response.ts"
)]
pub struct WorkflowRunResultResponse {
    pub status: String,
    pub output: String,
    pub error: Option<String>,
    pub step_results: Vec<StepResultResponse>,
    #[ts(type = "number")]
    pub total_duration_ms: u64,
}

/// API representation of a persisted execution.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/workflow-execution-response.ts"
)]
pub struct WorkflowExecutionResponse {
    pub execution_id: String,
    pub workflow_id: String,
    pub status: String,
    pub input: String,
    pub output: String,
    pub error: Option<String>,
    pub step_results: Vec<StepResultResponse>,
    #[ts(type = "number")]
    pub total_duration_ms: u64,
    pub started_at: String,
    pub finished_at: Option<String>,
}
