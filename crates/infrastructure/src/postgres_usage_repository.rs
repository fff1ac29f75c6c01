use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use promptloom_application::UsageRepository;
use promptloom_core::{AppError, AppResult, UserId};
use promptloom_domain::UsageResource;

/// PostgreSQL-backed monthly usage counters.
#[derive(Clone)]
pub struct PostgresUsageRepository {
    pool: PgPool,
}

impl PostgresUsageRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRepository for PostgresUsageRepository {
    async fn get_usage_count(
        &self,
        user_id: UserId,
        resource: UsageResource,
        period_start: NaiveDate,
    ) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT count
            FROM usage_counters
            WHERE user_id = $1 AND resource = $2 AND period_start = $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(resource.as_str())
        .bind(period_start)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to read {} usage for user '{user_id}': {error}",
                resource.as_str()
            ))
        })?;

        Ok(count.unwrap_or_default())
    }

    async fn increment_usage_count(
        &self,
        user_id: UserId,
        resource: UsageResource,
        period_start: NaiveDate,
    ) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO usage_counters (user_id, resource, period_start, count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (user_id, resource, period_start) DO UPDATE
            SET
                count = usage_counters.count + 1,
                updated_at = now()
            RETURNING count
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(resource.as_str())
        .bind(period_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to increment {} usage for user '{user_id}': {error}",
                resource.as_str()
            ))
        })
    }
}
