use chrono::{DateTime, Utc};
use promptloom_core::{AppError, AppResult, UserId};
use promptloom_domain::{StepResult, WorkflowExecutionResult, WorkflowExecutionStatus, WorkflowStep};
use uuid::Uuid;

/// Workflow creation/update payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveWorkflowInput {
    /// Existing workflow to update, `None` to create.
    pub workflow_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Ordered steps.
    pub steps: Vec<WorkflowStep>,
}

/// Execution history listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowExecutionListQuery {
    /// Workflow whose executions are listed.
    pub workflow_id: Uuid,
    /// Page size.
    pub limit: usize,
    /// Row offset.
    pub offset: usize,
}

/// Lifecycle status of a persisted execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowExecutionRecordStatus {
    /// Execution started and is still running.
    Running,
    /// Every step succeeded.
    Completed,
    /// A step failed or the deadline elapsed.
    Failed,
}

impl WorkflowExecutionRecordStatus {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown workflow execution status '{value}'"
            ))),
        }
    }
}

impl From<WorkflowExecutionStatus> for WorkflowExecutionRecordStatus {
    fn from(value: WorkflowExecutionStatus) -> Self {
        match value {
            WorkflowExecutionStatus::Completed => Self::Completed,
            WorkflowExecutionStatus::Failed => Self::Failed,
        }
    }
}

/// Input for creating an execution in running state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWorkflowExecutionInput {
    /// Workflow being executed.
    pub workflow_id: Uuid,
    /// User that started the execution.
    pub user_id: UserId,
    /// Initial input text.
    pub input: String,
}

/// Input for recording the terminal state of an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteWorkflowExecutionInput {
    /// Execution being completed.
    pub execution_id: Uuid,
    /// Result returned by the executor.
    pub result: WorkflowExecutionResult,
}

/// Persisted workflow execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowExecutionRecord {
    /// Stable execution identifier.
    pub execution_id: Uuid,
    /// Executed workflow.
    pub workflow_id: Uuid,
    /// User that started the execution.
    pub user_id: UserId,
    /// Lifecycle status.
    pub status: WorkflowExecutionRecordStatus,
    /// Initial input text.
    pub input: String,
    /// Final output, empty until completed.
    pub output: String,
    /// Per-step results.
    pub step_results: Vec<StepResult>,
    /// Total duration in milliseconds.
    pub total_duration_ms: u64,
    /// Failure message.
    pub error: Option<String>,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Completion timestamp.
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowExecutionRecord {
    /// Creates a record in running state.
    #[must_use]
    pub fn running(input: CreateWorkflowExecutionInput) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            workflow_id: input.workflow_id,
            user_id: input.user_id,
            status: WorkflowExecutionRecordStatus::Running,
            input: input.input,
            output: String::new(),
            step_results: Vec::new(),
            total_duration_ms: 0,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Applies a terminal result to this record.
    pub fn complete(&mut self, result: WorkflowExecutionResult) {
        self.status = result.status().into();
        self.output = result.output().to_owned();
        self.error = result.error().map(ToOwned::to_owned);
        self.total_duration_ms = result.total_duration_ms();
        self.step_results = result.step_results().to_vec();
        self.finished_at = Some(Utc::now());
    }
}
