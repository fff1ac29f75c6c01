use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use promptloom_core::{AppError, AppResult, NonEmptyString, UserId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// One unit of work in a workflow definition.
///
/// `step_type` and `config` are kept as authored. Both are interpreted only
/// when the step runs, so an unknown type or malformed config fails that step
/// instead of the whole definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Identifier unique within the workflow; keys `step_<id>_output`.
    #[serde(deserialize_with = "deserialize_text")]
    pub id: String,
    /// Human-readable label used for reporting.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    /// Step kind tag: `prompt`, `api_call` or `transform`.
    #[serde(rename = "type")]
    pub step_type: String,
    /// Kind-specific configuration, JSON object text or plain prompt text.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub config: String,
}

impl WorkflowStep {
    /// Creates a step from its raw parts.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        step_type: impl Into<String>,
        config: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            step_type: step_type.into(),
            config: config.into(),
        }
    }

    /// Returns the variable name under which this step's output is published.
    #[must_use]
    pub fn output_variable(&self) -> String {
        format!("step_{}_output", self.id)
    }

    /// Parses the step type and configuration into a typed step.
    pub fn resolve(&self) -> Result<ResolvedStep, StepConfigError> {
        let kind = StepKind::parse(self.step_type.as_str())
            .ok_or_else(|| StepConfigError::UnknownStepType(self.step_type.clone()))?;

        match kind {
            StepKind::Prompt => {
                let config = match ParsedConfig::<PromptStepConfig>::parse(kind, &self.config)? {
                    ParsedConfig::Structured(config) => config,
                    ParsedConfig::RawText(text) => PromptStepConfig::from_raw_text(text),
                };
                Ok(ResolvedStep::Prompt(config))
            }
            StepKind::ApiCall => match ParsedConfig::<ApiCallStepConfig>::parse(kind, &self.config)? {
                ParsedConfig::Structured(config) => {
                    if config.url.trim().is_empty() {
                        return Err(StepConfigError::Invalid {
                            kind,
                            message: "'url' must not be empty".to_owned(),
                        });
                    }
                    Ok(ResolvedStep::ApiCall(config))
                }
                ParsedConfig::RawText(_) => Err(StepConfigError::Invalid {
                    kind,
                    message: "config must be a JSON object with a 'url' field".to_owned(),
                }),
            },
            StepKind::Transform => {
                let config = match ParsedConfig::<RawTransformConfig>::parse(kind, &self.config)? {
                    ParsedConfig::Structured(raw) => TransformStepConfig::from(raw),
                    ParsedConfig::RawText(_) => TransformStepConfig {
                        operation: TransformOperation::Passthrough { operation: None },
                    },
                };
                Ok(ResolvedStep::Transform(config))
            }
        }
    }
}

/// Closed set of executable step kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// LLM prompt invocation.
    Prompt,
    /// Outbound HTTP request.
    ApiCall,
    /// Local text transformation.
    Transform,
}

impl StepKind {
    /// Returns the stable tag value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::ApiCall => "api_call",
            Self::Transform => "transform",
        }
    }

    /// Parses a tag value, returning `None` for unknown kinds.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "prompt" => Some(Self::Prompt),
            "api_call" => Some(Self::ApiCall),
            "transform" => Some(Self::Transform),
            _ => None,
        }
    }
}

/// Step configuration after the parse-or-fallback decision.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedConfig<T> {
    /// Config text was a JSON object matching the kind's schema.
    Structured(T),
    /// Config text was not a JSON object.
    RawText(String),
}

impl<T: DeserializeOwned> ParsedConfig<T> {
    /// Parses config text. Anything that is not a JSON object is raw text;
    /// a JSON object that does not fit the schema is an error.
    pub fn parse(kind: StepKind, raw: &str) -> Result<Self, StepConfigError> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value)
                .map(Self::Structured)
                .map_err(|error| StepConfigError::Invalid {
                    kind,
                    message: error.to_string(),
                }),
            _ => Ok(Self::RawText(raw.to_owned())),
        }
    }
}

/// Typed step, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedStep {
    /// Prompt step configuration.
    Prompt(PromptStepConfig),
    /// API call step configuration.
    ApiCall(ApiCallStepConfig),
    /// Transform step configuration.
    Transform(TransformStepConfig),
}

impl ResolvedStep {
    /// Returns the kind of this step.
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Prompt(_) => StepKind::Prompt,
            Self::ApiCall(_) => StepKind::ApiCall,
            Self::Transform(_) => StepKind::Transform,
        }
    }
}

/// Errors raised while interpreting a step definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepConfigError {
    /// Step type tag is not one of the known kinds.
    #[error("Unknown step type: {0}")]
    UnknownStepType(String),
    /// Config object does not fit the kind's schema.
    #[error("invalid {} step config: {message}", kind.as_str())]
    Invalid {
        /// Step kind being configured.
        kind: StepKind,
        /// Parser detail.
        message: String,
    },
}

/// Configuration of a `prompt` step.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptStepConfig {
    /// User message template.
    #[serde(default)]
    pub prompt: String,
    /// Optional system message template.
    pub system_prompt: Option<String>,
    /// Requested model; accepted but not used for routing yet.
    pub model: Option<String>,
    /// Optional sampling temperature override.
    pub temperature: Option<f32>,
}

impl PromptStepConfig {
    /// Treats the whole config text as the prompt template.
    #[must_use]
    pub fn from_raw_text(text: String) -> Self {
        Self {
            prompt: text,
            ..Self::default()
        }
    }
}

/// HTTP methods accepted by `api_call` steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request; never carries a body.
    #[default]
    #[serde(alias = "get")]
    Get,
    /// POST request.
    #[serde(alias = "post")]
    Post,
    /// PUT request.
    #[serde(alias = "put")]
    Put,
    /// DELETE request; never carries a body.
    #[serde(alias = "delete")]
    Delete,
}

impl HttpMethod {
    /// Returns the method token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns whether a configured body is sent with this method.
    #[must_use]
    pub fn sends_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

/// Configuration of an `api_call` step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiCallStepConfig {
    /// Request URL template.
    pub url: String,
    /// Request method.
    #[serde(default)]
    pub method: HttpMethod,
    /// Header value templates.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Body template, sent for POST and PUT only.
    pub body: Option<String>,
}

/// Configuration of a `transform` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformStepConfig {
    /// Selected operation with its parameters.
    pub operation: TransformOperation,
}

/// Transform operations. Missing parameters degrade to a passthrough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOperation {
    /// Returns every regex match joined by newlines.
    Extract {
        /// Regular expression applied globally.
        pattern: Option<String>,
    },
    /// Replaces every regex match.
    Replace {
        /// Regular expression applied globally.
        pattern: Option<String>,
        /// Replacement text; `$1`, `$&` and `$$` are honored.
        replacement: Option<String>,
    },
    /// Trims and collapses whitespace runs.
    Format,
    /// Selects a value from JSON input by dot path.
    JsonPath {
        /// Dot-separated path such as `a.b.c`.
        json_path: Option<String>,
    },
    /// Unknown or missing operation; input is returned unchanged.
    Passthrough {
        /// Operation name as authored, if any.
        operation: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransformConfig {
    operation: Option<String>,
    pattern: Option<String>,
    replacement: Option<String>,
    json_path: Option<String>,
}

impl From<RawTransformConfig> for TransformStepConfig {
    fn from(raw: RawTransformConfig) -> Self {
        let pattern = raw.pattern.filter(|pattern| !pattern.is_empty());
        let operation = match raw.operation.as_deref() {
            Some("extract") => TransformOperation::Extract { pattern },
            Some("replace") => TransformOperation::Replace {
                pattern,
                replacement: raw.replacement,
            },
            Some("format") => TransformOperation::Format,
            Some("json_path") => TransformOperation::JsonPath {
                json_path: raw.json_path.filter(|path| !path.is_empty()),
            },
            _ => TransformOperation::Passthrough {
                operation: raw.operation,
            },
        };

        Self { operation }
    }
}

/// User-owned workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    id: Uuid,
    owner: UserId,
    name: NonEmptyString,
    description: Option<String>,
    steps: Vec<WorkflowStep>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input payload used to construct a validated workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinitionInput {
    /// Existing identifier when updating, `None` when creating.
    pub id: Option<Uuid>,
    /// Owning user.
    pub owner: UserId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Ordered steps.
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    /// Creates a validated workflow definition.
    pub fn new(input: WorkflowDefinitionInput) -> AppResult<Self> {
        let WorkflowDefinitionInput {
            id,
            owner,
            name,
            description,
            steps,
        } = input;

        validate_steps(&steps)?;

        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        let now = Utc::now();
        Ok(Self {
            id: id.unwrap_or_else(Uuid::new_v4),
            owner,
            name: NonEmptyString::new(name)?,
            description,
            steps,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the audit timestamps, used when loading persisted rows.
    #[must_use]
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Returns the workflow identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the ordered steps.
    #[must_use]
    pub fn steps(&self) -> &[WorkflowStep] {
        self.steps.as_slice()
    }

    /// Returns when the workflow was first saved.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the workflow was last saved.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn validate_steps(steps: &[WorkflowStep]) -> AppResult<()> {
    let mut seen_ids = HashSet::with_capacity(steps.len());

    for step in steps {
        if step.id.trim().is_empty() {
            return Err(AppError::Validation(
                "workflow step id must not be empty".to_owned(),
            ));
        }

        if !seen_ids.insert(step.id.as_str()) {
            return Err(AppError::Validation(format!(
                "workflow step id '{}' is used more than once",
                step.id
            )));
        }
    }

    Ok(())
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use promptloom_core::UserId;
    use serde_json::json;

    use super::{
        HttpMethod, ResolvedStep, StepConfigError, TransformOperation, WorkflowDefinition,
        WorkflowDefinitionInput, WorkflowStep,
    };

    #[test]
    fn plain_text_prompt_config_becomes_the_prompt() {
        let step = WorkflowStep::new("1", "Summarize", "prompt", "Summarize: {{input}}");
        let resolved = step.resolve();

        let Ok(ResolvedStep::Prompt(config)) = resolved else {
            panic!("expected prompt step, got {resolved:?}");
        };
        assert_eq!(config.prompt, "Summarize: {{input}}");
        assert_eq!(config.system_prompt, None);
    }

    #[test]
    fn json_prompt_config_reads_camel_case_fields() {
        let step = WorkflowStep::new(
            "1",
            "Ask",
            "prompt",
            r#"{"prompt":"Q: {{input}}","systemPrompt":"Be brief","temperature":0.2}"#,
        );

        let Ok(ResolvedStep::Prompt(config)) = step.resolve() else {
            panic!("expected prompt step");
        };
        assert_eq!(config.system_prompt.as_deref(), Some("Be brief"));
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn unknown_step_type_is_reported() {
        let step = WorkflowStep::new("1", "Mystery", "email", "{}");
        assert_eq!(
            step.resolve(),
            Err(StepConfigError::UnknownStepType("email".to_owned()))
        );
        assert_eq!(
            StepConfigError::UnknownStepType("email".to_owned()).to_string(),
            "Unknown step type: email"
        );
    }

    #[test]
    fn api_call_defaults_to_get_and_requires_url() {
        let step = WorkflowStep::new("1", "Fetch", "api_call", r#"{"url":"https://x.test"}"#);
        let Ok(ResolvedStep::ApiCall(config)) = step.resolve() else {
            panic!("expected api call step");
        };
        assert_eq!(config.method, HttpMethod::Get);

        let missing_url = WorkflowStep::new("2", "Fetch", "api_call", r#"{"method":"POST"}"#);
        assert!(matches!(
            missing_url.resolve(),
            Err(StepConfigError::Invalid { .. })
        ));

        let raw_text = WorkflowStep::new("3", "Fetch", "api_call", "https://x.test");
        assert!(raw_text.resolve().is_err());
    }

    #[test]
    fn transform_unknown_operation_is_passthrough() {
        let step = WorkflowStep::new("1", "T", "transform", r#"{"operation":"shout"}"#);
        let Ok(ResolvedStep::Transform(config)) = step.resolve() else {
            panic!("expected transform step");
        };
        assert_eq!(
            config.operation,
            TransformOperation::Passthrough {
                operation: Some("shout".to_owned())
            }
        );
    }

    #[test]
    fn step_accepts_object_config_and_numeric_id() {
        let step: Result<WorkflowStep, _> = serde_json::from_value(json!({
            "id": 7,
            "name": "Format",
            "type": "transform",
            "config": {"operation": "format"}
        }));

        assert!(step.is_ok());
        let step = step.unwrap_or_else(|_| unreachable!());
        assert_eq!(step.id, "7");
        assert_eq!(step.output_variable(), "step_7_output");
        assert!(matches!(
            step.resolve(),
            Ok(ResolvedStep::Transform(config)) if config.operation == TransformOperation::Format
        ));
    }

    #[test]
    fn workflow_rejects_duplicate_step_ids() {
        let workflow = WorkflowDefinition::new(WorkflowDefinitionInput {
            id: None,
            owner: UserId::new(),
            name: "Lesson planner".to_owned(),
            description: None,
            steps: vec![
                WorkflowStep::new("1", "A", "prompt", "a"),
                WorkflowStep::new("1", "B", "prompt", "b"),
            ],
        });

        assert!(workflow.is_err());
    }

    #[test]
    fn workflow_allows_empty_step_list() {
        let workflow = WorkflowDefinition::new(WorkflowDefinitionInput {
            id: None,
            owner: UserId::new(),
            name: "Identity".to_owned(),
            description: Some("   ".to_owned()),
            steps: Vec::new(),
        });

        assert!(workflow.is_ok());
        let workflow = workflow.unwrap_or_else(|_| unreachable!());
        assert_eq!(workflow.description(), None);
    }
}
