mod conversions;
mod types;

pub use types::{
    ExecuteWorkflowRequest, RunWorkflowRequest, SaveWorkflowRequest, StepResultResponse,
    WorkflowExecutionResponse, WorkflowResponse, WorkflowRunResultResponse, WorkflowStepDto,
};
pub(crate) use conversions::parse_workflow_id;
