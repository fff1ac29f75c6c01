use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use tracing::warn;

use promptloom_core::{AppError, AppResult, UserIdentity};
use promptloom_domain::{AuditAction, RateLimitFeature};

use crate::{AuditEvent, AuditRepository};

use super::config::RateLimitSettings;
use super::ports::{RateLimitDecision, RateLimitStore};

/// Application service for request rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    store: Arc<dyn RateLimitStore>,
    audit_repository: Arc<dyn AuditRepository>,
    settings: Arc<RwLock<RateLimitSettings>>,
}

impl RateLimitService {
    /// Creates a new rate limit service over an explicit counter store.
    #[must_use]
    pub fn new(
        store: Arc<dyn RateLimitStore>,
        audit_repository: Arc<dyn AuditRepository>,
        settings: RateLimitSettings,
    ) -> Self {
        Self {
            store,
            audit_repository,
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Returns a snapshot of the current settings.
    #[must_use]
    pub fn settings(&self) -> RateLimitSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the settings. Only administrators may do this.
    pub async fn replace_settings(
        &self,
        actor: &UserIdentity,
        settings: RateLimitSettings,
    ) -> AppResult<RateLimitSettings> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "only administrators may change rate limits".to_owned(),
            ));
        }

        settings.validate()?;
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings.clone();

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::RateLimitSettingsUpdated,
                resource_type: "rate_limit_settings".to_owned(),
                resource_id: "global".to_owned(),
                detail: Some(format!(
                    "rate limiting {} with {} feature(s) configured",
                    if settings.enabled { "enabled" } else { "disabled" },
                    settings.features.len()
                )),
            })
            .await?;

        Ok(settings)
    }

    /// Counts one request of `actor` against `feature`.
    pub async fn check_rate_limit(
        &self,
        feature: RateLimitFeature,
        actor: &UserIdentity,
    ) -> AppResult<RateLimitDecision> {
        self.check_rate_limit_at(feature, actor, Utc::now().timestamp_millis())
            .await
    }

    /// Counts one request at an explicit clock value.
    pub async fn check_rate_limit_at(
        &self,
        feature: RateLimitFeature,
        actor: &UserIdentity,
        now_ms: i64,
    ) -> AppResult<RateLimitDecision> {
        let Some(rule) = self.settings().active_rule(feature, actor.tier()) else {
            return Ok(RateLimitDecision::bypassed(now_ms));
        };

        let identifier = feature.identifier(actor.user_id());
        let decision = self.store.record_request(&identifier, rule, now_ms).await?;

        if !decision.allowed {
            warn!(
                identifier = %identifier,
                tier = %actor.tier(),
                max_requests = rule.max_requests,
                reset_time_ms = decision.reset_time_ms,
                "rate limit exceeded"
            );
        }

        Ok(decision)
    }

    /// Counts one request and fails with `AppError::RateLimited` when denied.
    pub async fn require_within_limit(
        &self,
        feature: RateLimitFeature,
        actor: &UserIdentity,
    ) -> AppResult<RateLimitDecision> {
        let decision = self.check_rate_limit(feature, actor).await?;
        if !decision.allowed {
            return Err(AppError::RateLimited {
                message: format!("too many {feature} requests, please try again later"),
                reset_time_ms: decision.reset_time_ms,
            });
        }

        Ok(decision)
    }

    /// Removes expired counters. Intended for the periodic sweep task.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        self.store
            .sweep_expired(Utc::now().timestamp_millis())
            .await
    }
}
