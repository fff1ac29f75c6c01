//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_rate_limit_store;
mod in_memory_usage_repository;
mod in_memory_workflow_repository;
mod openai_chat_completion_service;
mod postgres_audit_repository;
mod postgres_usage_repository;
mod postgres_workflow_repository;
mod reqwest_http_fetcher;
mod tracing_audit_repository;

pub use in_memory_rate_limit_store::InMemoryRateLimitStore;
pub use in_memory_usage_repository::InMemoryUsageRepository;
pub use in_memory_workflow_repository::InMemoryWorkflowRepository;
pub use openai_chat_completion_service::{OpenAiChatCompletionConfig, OpenAiChatCompletionService};
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_usage_repository::PostgresUsageRepository;
pub use postgres_workflow_repository::PostgresWorkflowRepository;
pub use reqwest_http_fetcher::ReqwestHttpFetcher;
pub use tracing_audit_repository::TracingAuditRepository;
