use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a workflow definition is created or updated.
    WorkflowSaved,
    /// Emitted when a workflow run finishes, successfully or not.
    WorkflowExecuted,
    /// Emitted when an administrator replaces the rate-limit settings.
    RateLimitSettingsUpdated,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowSaved => "workflow.saved",
            Self::WorkflowExecuted => "workflow.executed",
            Self::RateLimitSettingsUpdated => "rate_limit.settings.updated",
        }
    }
}
