use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use promptloom_application::UsageRepository;
use promptloom_core::{AppResult, UserId};
use promptloom_domain::UsageResource;
use tokio::sync::Mutex;

type UsageKey = (UserId, UsageResource, NaiveDate);

/// In-memory usage counters used when no database is configured.
#[derive(Default)]
pub struct InMemoryUsageRepository {
    counters: Mutex<HashMap<UsageKey, i64>>,
}

impl InMemoryUsageRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn get_usage_count(
        &self,
        user_id: UserId,
        resource: UsageResource,
        period_start: NaiveDate,
    ) -> AppResult<i64> {
        Ok(self
            .counters
            .lock()
            .await
            .get(&(user_id, resource, period_start))
            .copied()
            .unwrap_or_default())
    }

    async fn increment_usage_count(
        &self,
        user_id: UserId,
        resource: UsageResource,
        period_start: NaiveDate,
    ) -> AppResult<i64> {
        let mut counters = self.counters.lock().await;
        let counter = counters
            .entry((user_id, resource, period_start))
            .or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use promptloom_application::UsageRepository;
    use promptloom_core::UserId;
    use promptloom_domain::UsageResource;

    use super::InMemoryUsageRepository;

    #[tokio::test]
    async fn counters_are_separated_by_period() {
        let repository = InMemoryUsageRepository::new();
        let user_id = UserId::new();
        let march = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap_or_default();
        let april = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap_or_default();

        for _ in 0..3 {
            let _ = repository
                .increment_usage_count(user_id, UsageResource::Optimization, march)
                .await;
        }

        let march_count = repository
            .get_usage_count(user_id, UsageResource::Optimization, march)
            .await;
        let april_count = repository
            .get_usage_count(user_id, UsageResource::Optimization, april)
            .await;

        assert!(march_count.is_ok_and(|count| count == 3));
        assert!(april_count.is_ok_and(|count| count == 0));
    }
}
