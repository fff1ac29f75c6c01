use async_trait::async_trait;

use promptloom_core::AppResult;

use super::config::RateLimitRule;

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Window end in milliseconds since the Unix epoch.
    pub reset_time_ms: i64,
    /// Set when the gate was bypassed because the feature is not gated.
    pub disabled: bool,
}

impl RateLimitDecision {
    /// Decision returned when gating is off; nothing is recorded.
    #[must_use]
    pub fn bypassed(now_ms: i64) -> Self {
        Self {
            allowed: true,
            remaining: u32::MAX,
            reset_time_ms: now_ms,
            disabled: true,
        }
    }
}

/// Store port for fixed-window request counters.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Counts one request against the identifier's window.
    ///
    /// Starts a new window when none exists or `now_ms` is past its reset
    /// time. A request over the limit is denied without mutating the record.
    /// The read-modify-write must be atomic per identifier.
    async fn record_request(
        &self,
        identifier: &str,
        rule: RateLimitRule,
        now_ms: i64,
    ) -> AppResult<RateLimitDecision>;

    /// Removes records whose window ended before `now_ms`.
    async fn sweep_expired(&self, now_ms: i64) -> AppResult<u64>;
}
