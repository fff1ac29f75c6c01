use thiserror::Error;

use promptloom_domain::{
    ResolvedStep, StepConfigError, TransformError, WorkflowStep, WorkflowVariables,
};

use crate::http_ports::HttpFetchError;
use crate::llm_ports::LlmError;

use super::WorkflowEngine;

/// Failure of one step, converted to `StepResult::error` by the executor.
#[derive(Debug, Error)]
pub enum StepError {
    /// Unknown step type or unusable config.
    #[error(transparent)]
    Config(#[from] StepConfigError),
    /// LLM port failure.
    #[error(transparent)]
    Llm(#[from] LlmError),
    /// HTTP request never produced a response.
    #[error("HTTP request failed: {0}")]
    HttpTransport(#[from] HttpFetchError),
    /// HTTP response outside the 2xx range.
    #[error("HTTP {status}: {status_text}")]
    HttpStatus {
        /// Numeric status code.
        status: u16,
        /// Reason phrase.
        status_text: String,
    },
    /// Transform operation failure.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl WorkflowEngine {
    pub(super) async fn run_step(
        &self,
        step: &WorkflowStep,
        input: &str,
        variables: &WorkflowVariables,
    ) -> Result<String, StepError> {
        let resolved = step.resolve()?;

        let mut scoped = variables.clone();
        scoped.insert("input".to_owned(), input.to_owned());

        match resolved {
            ResolvedStep::Prompt(config) => self.execute_prompt(&config, &scoped).await,
            ResolvedStep::ApiCall(config) => self.execute_api_call(&config, &scoped).await,
            ResolvedStep::Transform(config) => Self::execute_transform(&config, input),
        }
    }
}
