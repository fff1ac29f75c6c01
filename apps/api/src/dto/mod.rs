mod common;
mod limits;
mod workflows;

pub use common::HealthResponse;
pub use limits::{
    FeatureRateLimitDto, QuotaStatusResponse, RateLimitRuleDto, RateLimitSettingsDto,
    TierRateLimitsDto,
};
pub(crate) use workflows::parse_workflow_id;
pub use workflows::{
    ExecuteWorkflowRequest, RunWorkflowRequest, SaveWorkflowRequest, StepResultResponse,
    WorkflowExecutionResponse, WorkflowResponse, WorkflowRunResultResponse, WorkflowStepDto,
};
