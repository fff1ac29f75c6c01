use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Handler produced an output.
    Success,
    /// Handler or config parsing failed.
    Failed,
    /// Reserved for conditional execution; never produced today.
    Skipped,
}

impl StepStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Per-step record produced by the step executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    step_id: String,
    step_name: String,
    status: StepStatus,
    output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    duration: u64,
}

impl StepResult {
    /// Builds a successful step result.
    #[must_use]
    pub fn success(
        step_id: impl Into<String>,
        step_name: impl Into<String>,
        output: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            step_name: step_name.into(),
            status: StepStatus::Success,
            output,
            error: None,
            duration: millis(elapsed),
        }
    }

    /// Builds a failed step result with an empty output.
    #[must_use]
    pub fn failed(
        step_id: impl Into<String>,
        step_name: impl Into<String>,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            step_name: step_name.into(),
            status: StepStatus::Failed,
            output: String::new(),
            error: Some(error.into()),
            duration: millis(elapsed),
        }
    }

    /// Returns the step identifier.
    #[must_use]
    pub fn step_id(&self) -> &str {
        self.step_id.as_str()
    }

    /// Returns the step label.
    #[must_use]
    pub fn step_name(&self) -> &str {
        self.step_name.as_str()
    }

    /// Returns the step status.
    #[must_use]
    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Returns the produced output, empty on failure.
    #[must_use]
    pub fn output(&self) -> &str {
        self.output.as_str()
    }

    /// Returns the failure message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the wall-clock duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration
    }

    /// Returns whether the step succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Terminal status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowExecutionStatus {
    /// Every step succeeded.
    Completed,
    /// A step failed or the deadline elapsed.
    Failed,
}

impl WorkflowExecutionStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Aggregate result of running a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecutionResult {
    status: WorkflowExecutionStatus,
    output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    step_results: Vec<StepResult>,
    total_duration: u64,
}

impl WorkflowExecutionResult {
    /// Builds a completed result carrying the final output.
    #[must_use]
    pub fn completed(output: String, step_results: Vec<StepResult>, elapsed: Duration) -> Self {
        Self {
            status: WorkflowExecutionStatus::Completed,
            output,
            error: None,
            step_results,
            total_duration: millis(elapsed),
        }
    }

    /// Builds a failed result with an empty output.
    #[must_use]
    pub fn failed(error: impl Into<String>, step_results: Vec<StepResult>, elapsed: Duration) -> Self {
        Self {
            status: WorkflowExecutionStatus::Failed,
            output: String::new(),
            error: Some(error.into()),
            step_results,
            total_duration: millis(elapsed),
        }
    }

    /// Returns the terminal status.
    #[must_use]
    pub fn status(&self) -> WorkflowExecutionStatus {
        self.status
    }

    /// Returns the final output, empty on failure.
    #[must_use]
    pub fn output(&self) -> &str {
        self.output.as_str()
    }

    /// Returns the failure message naming the failing step.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the per-step results in execution order.
    #[must_use]
    pub fn step_results(&self) -> &[StepResult] {
        self.step_results.as_slice()
    }

    /// Returns the total wall-clock duration in milliseconds.
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::{StepResult, WorkflowExecutionResult};

    #[test]
    fn failed_step_has_empty_output() {
        let result = StepResult::failed("2", "Fetch", "boom", Duration::from_millis(5));
        assert_eq!(result.output(), "");
        assert_eq!(result.error(), Some("boom"));
        assert!(!result.is_success());
    }

    #[test]
    fn execution_result_serializes_camel_case() {
        let step = StepResult::success("1", "Format", "a b".to_owned(), Duration::from_millis(3));
        let result =
            WorkflowExecutionResult::completed("a b".to_owned(), vec![step], Duration::from_millis(4));

        let value = serde_json::to_value(&result).unwrap_or_default();
        assert_eq!(
            value,
            json!({
                "status": "completed",
                "output": "a b",
                "stepResults": [{
                    "stepId": "1",
                    "stepName": "Format",
                    "status": "success",
                    "output": "a b",
                    "duration": 3
                }],
                "totalDuration": 4
            })
        );
    }
}
