//! Monthly usage quotas layered on top of the request rate gate.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::warn;

use promptloom_core::{AppError, AppResult, SubscriptionTier, UserIdentity};
use promptloom_domain::UsageResource;

use crate::UsageRepository;

/// Monthly limits per tier and resource. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    workflow_execution: [Option<i64>; 4],
    optimization: [Option<i64>; 4],
    image_generation: [Option<i64>; 4],
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            workflow_execution: [Some(20), Some(200), Some(1000), None],
            optimization: [Some(30), Some(300), Some(3000), None],
            image_generation: [Some(10), Some(100), Some(500), None],
        }
    }
}

impl QuotaLimits {
    /// Returns the monthly limit of one resource for one tier.
    #[must_use]
    pub fn limit(&self, resource: UsageResource, tier: SubscriptionTier) -> Option<i64> {
        let row = match resource {
            UsageResource::WorkflowExecution => &self.workflow_execution,
            UsageResource::Optimization => &self.optimization,
            UsageResource::ImageGeneration => &self.image_generation,
        };

        let index = match tier {
            SubscriptionTier::Free => 0,
            SubscriptionTier::Basic => 1,
            SubscriptionTier::Pro => 2,
            SubscriptionTier::Admin => 3,
        };

        row[index]
    }
}

/// Usage snapshot of one resource for the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    /// Metered resource.
    pub resource: UsageResource,
    /// Uses counted this period.
    pub used: i64,
    /// Monthly limit, `None` when unlimited.
    pub limit: Option<i64>,
    /// Uses left this period, `None` when unlimited.
    pub remaining: Option<i64>,
    /// First day of the current period.
    pub period_start: NaiveDate,
}

impl QuotaStatus {
    /// Returns whether another use would exceed the limit.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.used >= limit)
    }
}

/// Application service for monthly usage quotas.
#[derive(Clone)]
pub struct QuotaService {
    repository: Arc<dyn UsageRepository>,
    limits: QuotaLimits,
}

impl QuotaService {
    /// Creates a quota service with the default limits.
    #[must_use]
    pub fn new(repository: Arc<dyn UsageRepository>) -> Self {
        Self {
            repository,
            limits: QuotaLimits::default(),
        }
    }

    /// Overrides the limits table.
    #[must_use]
    pub fn with_limits(mut self, limits: QuotaLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns usage of one resource without enforcing the limit.
    pub async fn quota_status(
        &self,
        actor: &UserIdentity,
        resource: UsageResource,
    ) -> AppResult<QuotaStatus> {
        self.quota_status_at(actor, resource, Utc::now()).await
    }

    /// Returns usage of every metered resource.
    pub async fn list_quota_status(&self, actor: &UserIdentity) -> AppResult<Vec<QuotaStatus>> {
        let now = Utc::now();
        let mut statuses = Vec::with_capacity(UsageResource::all().len());
        for resource in UsageResource::all() {
            statuses.push(self.quota_status_at(actor, *resource, now).await?);
        }

        Ok(statuses)
    }

    /// Fails with `AppError::QuotaExceeded` when the period's limit is used up.
    pub async fn check_quota(
        &self,
        actor: &UserIdentity,
        resource: UsageResource,
    ) -> AppResult<QuotaStatus> {
        let status = self.quota_status(actor, resource).await?;
        if status.is_exhausted() {
            warn!(
                user_id = %actor.user_id(),
                tier = %actor.tier(),
                resource = resource.as_str(),
                used = status.used,
                "usage quota exhausted"
            );
            return Err(AppError::QuotaExceeded(format!(
                "monthly {} quota of {} reached for the {} tier",
                resource.as_str(),
                status.limit.unwrap_or_default(),
                actor.tier()
            )));
        }

        Ok(status)
    }

    /// Counts one use of a resource in the current period.
    pub async fn record_usage(
        &self,
        actor: &UserIdentity,
        resource: UsageResource,
    ) -> AppResult<i64> {
        self.repository
            .increment_usage_count(actor.user_id(), resource, period_start(Utc::now())?)
            .await
    }

    async fn quota_status_at(
        &self,
        actor: &UserIdentity,
        resource: UsageResource,
        now: DateTime<Utc>,
    ) -> AppResult<QuotaStatus> {
        let period_start = period_start(now)?;
        let used = self
            .repository
            .get_usage_count(actor.user_id(), resource, period_start)
            .await?;
        let limit = self.limits.limit(resource, actor.tier());

        Ok(QuotaStatus {
            resource,
            used,
            limit,
            remaining: limit.map(|limit| (limit - used).max(0)),
            period_start,
        })
    }
}

/// Returns the first day of the calendar month containing `now`.
pub fn period_start(now: DateTime<Utc>) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1).ok_or_else(|| {
        AppError::Internal(format!("failed to derive usage period for '{now}'"))
    })
}
