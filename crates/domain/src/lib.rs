//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod execution;
mod limits;
mod security;
mod template;
mod transform;
mod workflow;

pub use execution::{StepResult, StepStatus, WorkflowExecutionResult, WorkflowExecutionStatus};
pub use limits::{RateLimitFeature, UsageResource};
pub use security::AuditAction;
pub use template::{WorkflowVariables, substitute_variables};
pub use transform::{TransformError, apply_transform};
pub use workflow::{
    ApiCallStepConfig, HttpMethod, ParsedConfig, PromptStepConfig, ResolvedStep, StepConfigError,
    StepKind, TransformOperation, TransformStepConfig, WorkflowDefinition,
    WorkflowDefinitionInput, WorkflowStep,
};
