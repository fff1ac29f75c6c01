//! Sequential workflow execution engine.
//!
//! Steps run in array order. Each successful output becomes the next step's
//! input and is published as `step_<id>_output`. The first failure stops the
//! run. Neither entry point returns `Err`; failures are reported in results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use promptloom_domain::{
    StepResult, WorkflowExecutionResult, WorkflowStep, WorkflowVariables,
};

use crate::{HttpFetcher, LlmService};

mod handlers;
mod steps;

pub use steps::StepError;

/// Executes workflow steps against the LLM and HTTP ports.
#[derive(Clone)]
pub struct WorkflowEngine {
    llm_service: Arc<dyn LlmService>,
    http_fetcher: Arc<dyn HttpFetcher>,
    deadline: Option<Duration>,
}

impl WorkflowEngine {
    /// Creates an engine without an overall deadline.
    #[must_use]
    pub fn new(llm_service: Arc<dyn LlmService>, http_fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            llm_service,
            http_fetcher,
            deadline: None,
        }
    }

    /// Sets an overall deadline checked before each step starts.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Runs steps in order starting from `input`.
    pub async fn execute_workflow(
        &self,
        steps: &[WorkflowStep],
        input: &str,
    ) -> WorkflowExecutionResult {
        self.execute_workflow_with_variables(steps, input, WorkflowVariables::new())
            .await
    }

    /// Runs steps in order with externally seeded variables.
    ///
    /// Step outputs overwrite seeded variables with the same name.
    pub async fn execute_workflow_with_variables(
        &self,
        steps: &[WorkflowStep],
        input: &str,
        mut variables: WorkflowVariables,
    ) -> WorkflowExecutionResult {
        let started_at = Instant::now();
        let mut current_input = input.to_owned();
        let mut step_results = Vec::with_capacity(steps.len());

        for step in steps {
            if let Some(deadline) = self.deadline
                && started_at.elapsed() >= deadline
            {
                let message = format!(
                    "Workflow deadline of {} ms exceeded before step '{}'",
                    deadline.as_millis(),
                    step.name
                );
                warn!(step_id = %step.id, "{message}");
                return WorkflowExecutionResult::failed(message, step_results, started_at.elapsed());
            }

            let result = self.execute_step(step, &current_input, &variables).await;

            if !result.is_success() {
                let message = format!(
                    "Step '{}' failed: {}",
                    step.name,
                    result.error().unwrap_or_default()
                );
                step_results.push(result);
                return WorkflowExecutionResult::failed(message, step_results, started_at.elapsed());
            }

            current_input = result.output().to_owned();
            variables.insert(step.output_variable(), current_input.clone());
            step_results.push(result);
        }

        info!(
            steps = step_results.len(),
            duration_ms = started_at.elapsed().as_millis(),
            "workflow completed"
        );
        WorkflowExecutionResult::completed(current_input, step_results, started_at.elapsed())
    }

    /// Runs one step and captures its outcome. Never fails.
    pub async fn execute_step(
        &self,
        step: &WorkflowStep,
        input: &str,
        variables: &WorkflowVariables,
    ) -> StepResult {
        let started_at = Instant::now();

        match self.run_step(step, input, variables).await {
            Ok(output) => StepResult::success(
                step.id.as_str(),
                step.name.as_str(),
                output,
                started_at.elapsed(),
            ),
            Err(error) => {
                warn!(
                    step_id = %step.id,
                    step_type = %step.step_type,
                    error = %error,
                    "workflow step failed"
                );
                StepResult::failed(
                    step.id.as_str(),
                    step.name.as_str(),
                    error.to_string(),
                    started_at.elapsed(),
                )
            }
        }
    }
}
