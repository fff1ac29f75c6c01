mod database;

use std::sync::Arc;
use std::time::Duration;

use promptloom_application::{
    AuditRepository, QuotaService, RateLimitService, RateLimitSettings, UsageRepository,
    WorkflowEngine, WorkflowRepository, WorkflowService,
};
use promptloom_core::AppError;
use promptloom_infrastructure::{
    InMemoryRateLimitStore, InMemoryUsageRepository, InMemoryWorkflowRepository,
    OpenAiChatCompletionConfig, OpenAiChatCompletionService, PostgresAuditRepository,
    PostgresUsageRepository, PostgresWorkflowRepository, ReqwestHttpFetcher,
    TracingAuditRepository,
};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub use database::connect_and_migrate;

/// Persistence adapters chosen at startup.
pub struct StorageAdapters {
    pub backend: &'static str,
    pub workflow_repository: Arc<dyn WorkflowRepository>,
    pub usage_repository: Arc<dyn UsageRepository>,
    pub audit_repository: Arc<dyn AuditRepository>,
}

impl StorageAdapters {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            backend: "postgres",
            workflow_repository: Arc::new(PostgresWorkflowRepository::new(pool.clone())),
            usage_repository: Arc::new(PostgresUsageRepository::new(pool.clone())),
            audit_repository: Arc::new(PostgresAuditRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: "memory",
            workflow_repository: Arc::new(InMemoryWorkflowRepository::new()),
            usage_repository: Arc::new(InMemoryUsageRepository::new()),
            audit_repository: Arc::new(TracingAuditRepository::new()),
        }
    }
}

pub fn build_app_state(config: &ApiConfig, storage: StorageAdapters) -> Result<AppState, AppError> {
    let llm_service = OpenAiChatCompletionService::new(OpenAiChatCompletionConfig {
        base_url: config.llm.base_url.clone(),
        api_key: config.llm.api_key.clone(),
        model: config.llm.model.clone(),
        timeout: config.llm.timeout,
    })?;
    if !llm_service.is_configured() {
        warn!("LLM_API_KEY is not set; prompt steps will fail until it is configured");
    }

    let http_fetcher = ReqwestHttpFetcher::new(config.api_call_timeout)?;
    let engine = WorkflowEngine::new(Arc::new(llm_service), Arc::new(http_fetcher))
        .with_deadline(config.workflow_deadline);

    let settings = RateLimitSettings::default().with_overrides(
        config.rate_limits.enabled,
        &config.rate_limits.disabled_features,
    );

    Ok(compose_app_state(
        storage,
        engine,
        settings,
        config.gateway_shared_secret.as_str(),
    ))
}

pub fn compose_app_state(
    storage: StorageAdapters,
    engine: WorkflowEngine,
    rate_limit_settings: RateLimitSettings,
    gateway_shared_secret: &str,
) -> AppState {
    let rate_limit_service = RateLimitService::new(
        Arc::new(InMemoryRateLimitStore::new()),
        storage.audit_repository.clone(),
        rate_limit_settings,
    );
    let quota_service = QuotaService::new(storage.usage_repository);
    let workflow_service = WorkflowService::new(
        storage.workflow_repository,
        storage.audit_repository,
        engine,
        rate_limit_service.clone(),
        quota_service.clone(),
    );

    AppState {
        workflow_service,
        rate_limit_service,
        quota_service,
        gateway_shared_secret: Arc::from(gateway_shared_secret),
        storage_backend: storage.backend,
    }
}

/// Periodically drops expired rate-limit windows until the task is aborted.
pub fn spawn_rate_limit_sweeper(service: RateLimitService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;

        loop {
            interval.tick().await;
            match service.sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "swept expired rate limit windows"),
                Err(error) => warn!(%error, "rate limit sweep failed"),
            }
        }
    })
}
