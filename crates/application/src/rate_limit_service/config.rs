use std::collections::{BTreeMap, BTreeSet};

use promptloom_core::{AppError, AppResult, SubscriptionTier};
use promptloom_domain::RateLimitFeature;
use serde::{Deserialize, Serialize};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Window length and request budget for one tier of one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRule {
    /// Window duration in milliseconds.
    pub window_ms: i64,
    /// Maximum number of requests allowed in the window.
    pub max_requests: u32,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(max_requests: u32, window_ms: i64) -> Self {
        Self {
            window_ms,
            max_requests,
        }
    }

    /// Creates a rule with a one-minute window.
    #[must_use]
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, MINUTE_MS)
    }

    /// Creates a rule with a one-hour window.
    #[must_use]
    pub fn per_hour(max_requests: u32) -> Self {
        Self::new(max_requests, HOUR_MS)
    }
}

/// Per-tier rules of one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRateLimits {
    /// Free tier rule.
    pub free: RateLimitRule,
    /// Basic tier rule.
    pub basic: RateLimitRule,
    /// Pro tier rule.
    pub pro: RateLimitRule,
    /// Admin tier rule.
    pub admin: RateLimitRule,
}

impl TierRateLimits {
    /// Uses the same rule for every tier.
    #[must_use]
    pub fn uniform(rule: RateLimitRule) -> Self {
        Self {
            free: rule,
            basic: rule,
            pro: rule,
            admin: rule,
        }
    }

    /// Returns the rule of one tier.
    #[must_use]
    pub fn for_tier(&self, tier: SubscriptionTier) -> RateLimitRule {
        match tier {
            SubscriptionTier::Free => self.free,
            SubscriptionTier::Basic => self.basic,
            SubscriptionTier::Pro => self.pro,
            SubscriptionTier::Admin => self.admin,
        }
    }
}

/// Settings of one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRateLimitSettings {
    /// Whether the feature is gated at all.
    pub enabled: bool,
    /// Per-tier rules.
    pub tiers: TierRateLimits,
}

impl FeatureRateLimitSettings {
    fn enabled(tiers: TierRateLimits) -> Self {
        Self {
            enabled: true,
            tiers,
        }
    }
}

/// Complete rate-limit configuration, replaceable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Global switch; when off every check bypasses the store.
    pub enabled: bool,
    /// Per-feature settings.
    pub features: BTreeMap<RateLimitFeature, FeatureRateLimitSettings>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let features = RateLimitFeature::all()
            .iter()
            .map(|feature| {
                (
                    *feature,
                    FeatureRateLimitSettings::enabled(default_tier_limits(*feature)),
                )
            })
            .collect();

        Self {
            enabled: true,
            features,
        }
    }
}

impl RateLimitSettings {
    /// Applies the global switch and disables the listed features.
    #[must_use]
    pub fn with_overrides(
        mut self,
        enabled: bool,
        disabled_features: &BTreeSet<RateLimitFeature>,
    ) -> Self {
        self.enabled = enabled;
        for feature in disabled_features {
            self.features
                .entry(*feature)
                .or_insert_with(|| {
                    FeatureRateLimitSettings::enabled(default_tier_limits(*feature))
                })
                .enabled = false;
        }
        self
    }

    /// Returns the active rule for a feature and tier, or `None` when the
    /// feature is not gated.
    #[must_use]
    pub fn active_rule(
        &self,
        feature: RateLimitFeature,
        tier: SubscriptionTier,
    ) -> Option<RateLimitRule> {
        if !self.enabled {
            return None;
        }

        match self.features.get(&feature) {
            Some(settings) if settings.enabled => Some(settings.tiers.for_tier(tier)),
            Some(_) => None,
            None => Some(default_tier_limits(feature).for_tier(tier)),
        }
    }

    /// Validates every configured rule.
    pub fn validate(&self) -> AppResult<()> {
        for (feature, settings) in &self.features {
            for tier in SubscriptionTier::all() {
                let rule = settings.tiers.for_tier(*tier);
                if rule.window_ms <= 0 {
                    return Err(AppError::Validation(format!(
                        "rate limit window for '{feature}' tier '{tier}' must be positive"
                    )));
                }
                if rule.max_requests == 0 {
                    return Err(AppError::Validation(format!(
                        "rate limit for '{feature}' tier '{tier}' must allow at least one request"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn default_tier_limits(feature: RateLimitFeature) -> TierRateLimits {
    let tiered = |free, basic, pro, admin, rule: fn(u32) -> RateLimitRule| TierRateLimits {
        free: rule(free),
        basic: rule(basic),
        pro: rule(pro),
        admin: rule(admin),
    };

    match feature {
        RateLimitFeature::General => tiered(60, 120, 300, 1000, RateLimitRule::per_minute),
        RateLimitFeature::Optimize => tiered(10, 50, 200, 1000, RateLimitRule::per_hour),
        RateLimitFeature::Import => TierRateLimits::uniform(RateLimitRule::per_hour(5)),
        RateLimitFeature::CreateShare => TierRateLimits::uniform(RateLimitRule::per_hour(20)),
        RateLimitFeature::ImageGeneration => tiered(3, 10, 30, 100, RateLimitRule::per_hour),
        RateLimitFeature::WorkflowExecution => {
            tiered(10, 30, 100, 1000, RateLimitRule::per_hour)
        }
    }
}
