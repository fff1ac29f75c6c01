use std::fmt::{Display, Formatter};
use std::str::FromStr;

use promptloom_core::AppError;
use serde::{Deserialize, Serialize};

/// Feature buckets guarded by the request rate gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateLimitFeature {
    /// Prompt optimization requests.
    Optimize,
    /// Bulk prompt imports.
    Import,
    /// Share link creation.
    CreateShare,
    /// Every other authenticated request.
    General,
    /// Image generation requests.
    ImageGeneration,
    /// Workflow runs.
    WorkflowExecution,
}

impl RateLimitFeature {
    /// Returns the key used as the identifier prefix and in settings payloads.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimize => "optimize",
            Self::Import => "import",
            Self::CreateShare => "createShare",
            Self::General => "general",
            Self::ImageGeneration => "imageGeneration",
            Self::WorkflowExecution => "workflowExecution",
        }
    }

    /// Returns every feature.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RateLimitFeature] = &[
            RateLimitFeature::Optimize,
            RateLimitFeature::Import,
            RateLimitFeature::CreateShare,
            RateLimitFeature::General,
            RateLimitFeature::ImageGeneration,
            RateLimitFeature::WorkflowExecution,
        ];

        ALL
    }

    /// Builds the rate-limit record identifier for a subject.
    #[must_use]
    pub fn identifier(&self, subject: impl Display) -> String {
        format!("{}:{subject}", self.as_str())
    }
}

impl Display for RateLimitFeature {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RateLimitFeature {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|feature| {
                feature.as_str() == trimmed || feature.snake_case_alias() == trimmed
            })
            .ok_or_else(|| AppError::Validation(format!("unknown rate limit feature '{value}'")))
    }
}

impl RateLimitFeature {
    fn snake_case_alias(&self) -> &'static str {
        match self {
            Self::CreateShare => "create_share",
            Self::ImageGeneration => "image_generation",
            Self::WorkflowExecution => "workflow_execution",
            other => other.as_str(),
        }
    }
}

/// Resources metered by monthly usage quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageResource {
    /// Workflow runs.
    WorkflowExecution,
    /// Prompt optimizations.
    Optimization,
    /// Generated images.
    ImageGeneration,
}

impl UsageResource {
    /// Returns a stable storage value for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowExecution => "workflow_execution",
            Self::Optimization => "optimization",
            Self::ImageGeneration => "image_generation",
        }
    }

    /// Returns every metered resource.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[UsageResource] = &[
            UsageResource::WorkflowExecution,
            UsageResource::Optimization,
            UsageResource::ImageGeneration,
        ];

        ALL
    }
}

impl FromStr for UsageResource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "workflow_execution" => Ok(Self::WorkflowExecution),
            "optimization" => Ok(Self::Optimization),
            "image_generation" => Ok(Self::ImageGeneration),
            _ => Err(AppError::Validation(format!(
                "unknown usage resource '{value}'"
            ))),
        }
    }
}
