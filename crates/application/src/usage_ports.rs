use async_trait::async_trait;
use chrono::NaiveDate;
use promptloom_core::{AppResult, UserId};
use promptloom_domain::UsageResource;

/// Repository port for monthly usage counters.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Returns the counter for one user, resource and period, zero when absent.
    async fn get_usage_count(
        &self,
        user_id: UserId,
        resource: UsageResource,
        period_start: NaiveDate,
    ) -> AppResult<i64>;

    /// Increments the counter and returns the updated value.
    async fn increment_usage_count(
        &self,
        user_id: UserId,
        resource: UsageResource,
        period_start: NaiveDate,
    ) -> AppResult<i64>;
}
