//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod http_ports;
mod llm_ports;
mod quota_service;
mod rate_limit_service;
mod usage_ports;
mod workflow_engine;
mod workflow_ports;
mod workflow_service;

pub use audit_ports::{AuditEvent, AuditRepository};
pub use http_ports::{HttpFetchError, HttpFetchRequest, HttpFetchResponse, HttpFetcher};
pub use llm_ports::{
    ChatChoice, ChatCompletion, ChatCompletionRequest, ChatContent, ChatContentPart,
    ChatImageUrl, ChatMessage, ChatRole, LlmError, LlmService,
};
pub use quota_service::{QuotaLimits, QuotaService, QuotaStatus, period_start};
pub use rate_limit_service::{
    FeatureRateLimitSettings, RateLimitDecision, RateLimitRule, RateLimitService,
    RateLimitSettings, RateLimitStore, TierRateLimits,
};
pub use usage_ports::UsageRepository;
pub use workflow_engine::{StepError, WorkflowEngine};
pub use workflow_ports::{
    CompleteWorkflowExecutionInput, CreateWorkflowExecutionInput, SaveWorkflowInput,
    WorkflowExecutionListQuery, WorkflowExecutionRecord, WorkflowExecutionRecordStatus,
    WorkflowRepository,
};
pub use workflow_service::WorkflowService;
