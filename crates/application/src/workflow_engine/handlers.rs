use promptloom_domain::{
    ApiCallStepConfig, PromptStepConfig, TransformStepConfig, WorkflowVariables, apply_transform,
    substitute_variables,
};

use crate::http_ports::HttpFetchRequest;
use crate::llm_ports::{ChatCompletionRequest, ChatMessage};

use super::WorkflowEngine;
use super::steps::StepError;

impl WorkflowEngine {
    pub(super) async fn execute_prompt(
        &self,
        config: &PromptStepConfig,
        variables: &WorkflowVariables,
    ) -> Result<String, StepError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = &config.system_prompt {
            messages.push(ChatMessage::system(substitute_variables(
                system_prompt,
                variables,
            )));
        }
        messages.push(ChatMessage::user(substitute_variables(
            &config.prompt,
            variables,
        )));

        let completion = self
            .llm_service
            .chat_completion(ChatCompletionRequest {
                messages,
                temperature: config.temperature,
                tools: None,
            })
            .await?;

        Ok(completion.first_text())
    }

    pub(super) async fn execute_api_call(
        &self,
        config: &ApiCallStepConfig,
        variables: &WorkflowVariables,
    ) -> Result<String, StepError> {
        let headers = config
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), substitute_variables(value, variables)))
            .collect();

        let body = config
            .body
            .as_deref()
            .filter(|_| config.method.sends_body())
            .map(|body| substitute_variables(body, variables));

        let response = self
            .http_fetcher
            .fetch(HttpFetchRequest {
                method: config.method,
                url: substitute_variables(&config.url, variables),
                headers,
                body,
            })
            .await?;

        if !response.is_success() {
            return Err(StepError::HttpStatus {
                status: response.status,
                status_text: response.status_text,
            });
        }

        Ok(response.body)
    }

    pub(super) fn execute_transform(
        config: &TransformStepConfig,
        input: &str,
    ) -> Result<String, StepError> {
        Ok(apply_transform(&config.operation, input)?)
    }
}
