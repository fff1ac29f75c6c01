use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use uuid::Uuid;

use promptloom_core::{AppError, AppResult, SubscriptionTier, UserId, UserIdentity};
use promptloom_domain::{
    AuditAction, RateLimitFeature, UsageResource, WorkflowDefinition, WorkflowExecutionStatus,
    WorkflowStep, WorkflowVariables,
};

use crate::http_ports::{HttpFetchError, HttpFetchRequest, HttpFetchResponse, HttpFetcher};
use crate::llm_ports::{ChatCompletion, ChatCompletionRequest, LlmError, LlmService};
use crate::rate_limit_service::{
    FeatureRateLimitSettings, RateLimitDecision, RateLimitRule, RateLimitSettings,
    RateLimitStore, TierRateLimits,
};
use crate::workflow_ports::{
    CompleteWorkflowExecutionInput, CreateWorkflowExecutionInput, SaveWorkflowInput,
    WorkflowExecutionListQuery, WorkflowExecutionRecord, WorkflowExecutionRecordStatus,
    WorkflowRepository,
};
use crate::{
    AuditEvent, AuditRepository, QuotaService, RateLimitService, UsageRepository, WorkflowEngine,
};

use super::WorkflowService;

#[derive(Default)]
struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
    unavailable: AtomicBool,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("audit store unavailable".to_owned()));
        }
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
struct FakeWorkflowRepository {
    workflows: Mutex<HashMap<Uuid, WorkflowDefinition>>,
    executions: Mutex<Vec<WorkflowExecutionRecord>>,
    completion_unavailable: AtomicBool,
}

#[async_trait]
impl WorkflowRepository for FakeWorkflowRepository {
    async fn save_workflow(&self, workflow: WorkflowDefinition) -> AppResult<()> {
        self.workflows.lock().await.insert(workflow.id(), workflow);
        Ok(())
    }

    async fn list_workflows(&self, owner: UserId) -> AppResult<Vec<WorkflowDefinition>> {
        Ok(self
            .workflows
            .lock()
            .await
            .values()
            .filter(|workflow| workflow.owner() == owner)
            .cloned()
            .collect())
    }

    async fn find_workflow(
        &self,
        owner: UserId,
        workflow_id: Uuid,
    ) -> AppResult<Option<WorkflowDefinition>> {
        Ok(self
            .workflows
            .lock()
            .await
            .get(&workflow_id)
            .filter(|workflow| workflow.owner() == owner)
            .cloned())
    }

    async fn create_execution(
        &self,
        input: CreateWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord> {
        let record = WorkflowExecutionRecord::running(input);
        self.executions.lock().await.push(record.clone());
        Ok(record)
    }

    async fn complete_execution(
        &self,
        input: CompleteWorkflowExecutionInput,
    ) -> AppResult<WorkflowExecutionRecord> {
        if self.completion_unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("execution store unavailable".to_owned()));
        }
        let mut executions = self.executions.lock().await;
        let record = executions
            .iter_mut()
            .find(|record| record.execution_id == input.execution_id)
            .ok_or_else(|| AppError::NotFound("execution".to_owned()))?;
        record.complete(input.result);
        Ok(record.clone())
    }

    async fn list_executions(
        &self,
        owner: UserId,
        query: WorkflowExecutionListQuery,
    ) -> AppResult<Vec<WorkflowExecutionRecord>> {
        Ok(self
            .executions
            .lock()
            .await
            .iter()
            .filter(|record| record.user_id == owner && record.workflow_id == query.workflow_id)
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct FakeUsageRepository {
    counters: Mutex<HashMap<(UserId, UsageResource, NaiveDate), i64>>,
}

#[async_trait]
impl UsageRepository for FakeUsageRepository {
    async fn get_usage_count(
        &self,
        user_id: UserId,
        resource: UsageResource,
        period_start: NaiveDate,
    ) -> AppResult<i64> {
        Ok(self
            .counters
            .lock()
            .await
            .get(&(user_id, resource, period_start))
            .copied()
            .unwrap_or_default())
    }

    async fn increment_usage_count(
        &self,
        user_id: UserId,
        resource: UsageResource,
        period_start: NaiveDate,
    ) -> AppResult<i64> {
        let mut counters = self.counters.lock().await;
        let counter = counters.entry((user_id, resource, period_start)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[derive(Default)]
struct CountingRateLimitStore {
    counts: Mutex<HashMap<String, u32>>,
}

#[async_trait]
impl RateLimitStore for CountingRateLimitStore {
    async fn record_request(
        &self,
        identifier: &str,
        rule: RateLimitRule,
        now_ms: i64,
    ) -> AppResult<RateLimitDecision> {
        let mut counts = self.counts.lock().await;
        let count = counts.entry(identifier.to_owned()).or_insert(0);
        let allowed = *count < rule.max_requests;
        if allowed {
            *count += 1;
        }

        Ok(RateLimitDecision {
            allowed,
            remaining: rule.max_requests - *count,
            reset_time_ms: now_ms + rule.window_ms,
            disabled: false,
        })
    }

    async fn sweep_expired(&self, _now_ms: i64) -> AppResult<u64> {
        Ok(0)
    }
}

struct UnusedLlmService;

#[async_trait]
impl LlmService for UnusedLlmService {
    async fn chat_completion(
        &self,
        _request: ChatCompletionRequest,
    ) -> Result<ChatCompletion, LlmError> {
        Err(LlmError::NotConfigured)
    }
}

struct UnusedHttpFetcher;

#[async_trait]
impl HttpFetcher for UnusedHttpFetcher {
    async fn fetch(&self, _request: HttpFetchRequest) -> Result<HttpFetchResponse, HttpFetchError> {
        Err(HttpFetchError::Transport("offline".to_owned()))
    }
}

struct Harness {
    service: WorkflowService,
    repository: Arc<FakeWorkflowRepository>,
    audit: Arc<FakeAuditRepository>,
    usage: Arc<FakeUsageRepository>,
}

fn harness(settings: RateLimitSettings) -> Harness {
    let repository = Arc::new(FakeWorkflowRepository::default());
    let audit = Arc::new(FakeAuditRepository::default());
    let usage = Arc::new(FakeUsageRepository::default());
    let engine = WorkflowEngine::new(Arc::new(UnusedLlmService), Arc::new(UnusedHttpFetcher));
    let rate_limit_service = RateLimitService::new(
        Arc::new(CountingRateLimitStore::default()),
        audit.clone(),
        settings,
    );
    let quota_service = QuotaService::new(usage.clone());

    Harness {
        service: WorkflowService::new(
            repository.clone(),
            audit.clone(),
            engine,
            rate_limit_service,
            quota_service,
        ),
        repository,
        audit,
        usage,
    }
}

fn format_step(id: &str) -> WorkflowStep {
    WorkflowStep::new(id, "Tidy", "transform", r#"{"operation":"format"}"#)
}

fn save_input(steps: Vec<WorkflowStep>) -> SaveWorkflowInput {
    SaveWorkflowInput {
        workflow_id: None,
        name: "Worksheet cleaner".to_owned(),
        description: Some("Normalizes whitespace".to_owned()),
        steps,
    }
}

fn educator() -> UserIdentity {
    UserIdentity::new(UserId::new(), SubscriptionTier::Free)
}

#[tokio::test]
async fn saved_workflow_executes_and_is_persisted() {
    let harness = harness(RateLimitSettings::default());
    let actor = educator();

    let workflow = harness
        .service
        .save_workflow(&actor, save_input(vec![format_step("1")]))
        .await;
    assert!(workflow.is_ok());
    let workflow = workflow.unwrap_or_else(|_| unreachable!());

    let record = harness
        .service
        .execute_saved_workflow(
            &actor,
            workflow.id(),
            "  two   words ".to_owned(),
            WorkflowVariables::new(),
        )
        .await;
    assert!(record.is_ok());
    let record = record.unwrap_or_else(|_| unreachable!());
    assert_eq!(record.status, WorkflowExecutionRecordStatus::Completed);
    assert_eq!(record.output, "two words");
    assert_eq!(record.step_results.len(), 1);
    assert!(record.finished_at.is_some());

    let history = harness
        .service
        .list_executions(
            &actor,
            WorkflowExecutionListQuery {
                workflow_id: workflow.id(),
                limit: 10,
                offset: 0,
            },
        )
        .await
        .unwrap_or_default();
    assert_eq!(history.len(), 1);

    let counters = harness.usage.counters.lock().await;
    assert_eq!(counters.values().sum::<i64>(), 1);

    let actions: Vec<AuditAction> = harness
        .audit
        .events
        .lock()
        .await
        .iter()
        .map(|event| event.action)
        .collect();
    assert_eq!(
        actions,
        vec![AuditAction::WorkflowSaved, AuditAction::WorkflowExecuted]
    );
}

#[tokio::test]
async fn failed_run_is_persisted_without_usage() {
    let harness = harness(RateLimitSettings::default());
    let actor = educator();
    let steps = vec![WorkflowStep::new("1", "Mystery", "email", "{}")];

    let workflow = harness
        .service
        .save_workflow(&actor, save_input(steps))
        .await
        .unwrap_or_else(|_| unreachable!());

    let record = harness
        .service
        .execute_saved_workflow(&actor, workflow.id(), String::new(), WorkflowVariables::new())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(record.status, WorkflowExecutionRecordStatus::Failed);
    assert_eq!(
        record.error.as_deref(),
        Some("Step 'Mystery' failed: Unknown step type: email")
    );
    assert!(harness.usage.counters.lock().await.is_empty());
}

#[tokio::test]
async fn other_users_cannot_see_or_run_workflows() {
    let harness = harness(RateLimitSettings::default());
    let owner = educator();
    let stranger = educator();

    let workflow = harness
        .service
        .save_workflow(&owner, save_input(vec![format_step("1")]))
        .await
        .unwrap_or_else(|_| unreachable!());

    let result = harness
        .service
        .execute_saved_workflow(&stranger, workflow.id(), String::new(), WorkflowVariables::new())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(harness.repository.executions.lock().await.is_empty());

    let listed = harness.service.list_workflows(&stranger).await;
    assert!(listed.is_ok_and(|workflows| workflows.is_empty()));
}

#[tokio::test]
async fn rate_gate_blocks_before_execution() {
    let mut settings = RateLimitSettings::default();
    settings.features.insert(
        RateLimitFeature::WorkflowExecution,
        FeatureRateLimitSettings {
            enabled: true,
            tiers: TierRateLimits::uniform(RateLimitRule::new(1, 60_000)),
        },
    );
    let harness = harness(settings);
    let actor = educator();

    let first = harness
        .service
        .execute_steps(&actor, vec![format_step("1")], "a".to_owned(), WorkflowVariables::new())
        .await;
    assert!(first.is_ok_and(|result| result.status() == WorkflowExecutionStatus::Completed));

    let second = harness
        .service
        .execute_steps(&actor, vec![format_step("1")], "a".to_owned(), WorkflowVariables::new())
        .await;
    assert!(matches!(second, Err(AppError::RateLimited { .. })));
}

#[tokio::test]
async fn exhausted_quota_blocks_execution() {
    let harness = harness(RateLimitSettings::default().with_overrides(false, &Default::default()));
    let actor = educator();

    for _ in 0..20 {
        let run = harness
            .service
            .execute_steps(&actor, Vec::new(), "x".to_owned(), WorkflowVariables::new())
            .await;
        assert!(run.is_ok());
    }

    let blocked = harness
        .service
        .execute_steps(&actor, Vec::new(), "x".to_owned(), WorkflowVariables::new())
        .await;
    assert!(matches!(blocked, Err(AppError::QuotaExceeded(_))));
}

#[tokio::test]
async fn ad_hoc_steps_with_duplicate_ids_are_rejected() {
    let harness = harness(RateLimitSettings::default());
    let result = harness
        .service
        .execute_steps(
            &educator(),
            vec![format_step("1"), format_step("1")],
            String::new(),
            WorkflowVariables::new(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn updating_keeps_creation_timestamp() {
    let harness = harness(RateLimitSettings::default());
    let actor = educator();

    let created = harness
        .service
        .save_workflow(&actor, save_input(vec![format_step("1")]))
        .await
        .unwrap_or_else(|_| unreachable!());

    let mut update = save_input(vec![format_step("1"), format_step("2")]);
    update.workflow_id = Some(created.id());
    let updated = harness
        .service
        .save_workflow(&actor, update)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.created_at(), created.created_at());
    assert_eq!(updated.steps().len(), 2);
}

#[tokio::test]
async fn bookkeeping_failures_after_the_run_still_return_the_result() {
    let harness = harness(RateLimitSettings::default());
    let actor = educator();
    let workflow = harness
        .service
        .save_workflow(&actor, save_input(vec![format_step("1")]))
        .await
        .unwrap_or_else(|_| unreachable!());

    harness
        .repository
        .completion_unavailable
        .store(true, Ordering::SeqCst);
    harness.audit.unavailable.store(true, Ordering::SeqCst);

    let execution = harness
        .service
        .execute_saved_workflow(
            &actor,
            workflow.id(),
            "  spaced   out  ".to_owned(),
            WorkflowVariables::new(),
        )
        .await;

    assert!(execution.is_ok());
    let execution = execution.unwrap_or_else(|_| unreachable!());
    assert_eq!(execution.status, WorkflowExecutionRecordStatus::Completed);
    assert_eq!(execution.output, "spaced out");
    assert!(execution.finished_at.is_some());

    let usage = harness
        .service
        .execute_steps(
            &actor,
            vec![format_step("1")],
            "x".to_owned(),
            WorkflowVariables::new(),
        )
        .await;
    assert!(usage.is_ok_and(|result| result.status() == WorkflowExecutionStatus::Completed));
    assert_eq!(
        harness.usage.counters.lock().await.values().sum::<i64>(),
        2
    );
}
