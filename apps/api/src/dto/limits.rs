use std::collections::BTreeMap;
use std::str::FromStr;

use promptloom_application::{
    FeatureRateLimitSettings, QuotaStatus, RateLimitRule, RateLimitSettings, TierRateLimits,
};
use promptloom_core::AppError;
use promptloom_domain::RateLimitFeature;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Current-period usage of one metered resource.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/quota-status-response.ts"
)]
pub struct QuotaStatusResponse {
    pub resource: String,
    #[ts(type = "number")]
    pub used: i64,
    #[ts(type = "number | null")]
    pub limit: Option<i64>,
    #[ts(type = "number | null")]
    pub remaining: Option<i64>,
    pub period_start: String,
}

/// One sliding-window rule.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/rate-limit-rule-dto.ts"
)]
pub struct RateLimitRuleDto {
    #[ts(type = "number")]
    pub window_ms: i64,
    pub max_requests: u32,
}

/// Rules per subscription tier.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/tier-rate-limits-dto.ts"
)]
pub struct TierRateLimitsDto {
    pub free: RateLimitRuleDto,
    pub basic: RateLimitRuleDto,
    pub pro: RateLimitRuleDto,
    pub admin: RateLimitRuleDto,
}

/// Settings of one gated feature.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/feature-rate-limit-dto.ts"
)]
pub struct FeatureRateLimitDto {
    pub enabled: bool,
    pub tiers: TierRateLimitsDto,
}

/// Full rate-limit configuration keyed by feature name.
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/rate-limit-settings-dto.ts"
)]
pub struct RateLimitSettingsDto {
    pub enabled: bool,
    pub features: BTreeMap<String, FeatureRateLimitDto>,
}

impl From<QuotaStatus> for QuotaStatusResponse {
    fn from(value: QuotaStatus) -> Self {
        Self {
            resource: value.resource.as_str().to_owned(),
            used: value.used,
            limit: value.limit,
            remaining: value.remaining,
            period_start: value.period_start.to_string(),
        }
    }
}

impl From<RateLimitRule> for RateLimitRuleDto {
    fn from(value: RateLimitRule) -> Self {
        Self {
            window_ms: value.window_ms,
            max_requests: value.max_requests,
        }
    }
}

impl From<RateLimitRuleDto> for RateLimitRule {
    fn from(value: RateLimitRuleDto) -> Self {
        Self::new(value.max_requests, value.window_ms)
    }
}

impl From<TierRateLimits> for TierRateLimitsDto {
    fn from(value: TierRateLimits) -> Self {
        Self {
            free: value.free.into(),
            basic: value.basic.into(),
            pro: value.pro.into(),
            admin: value.admin.into(),
        }
    }
}

impl From<TierRateLimitsDto> for TierRateLimits {
    fn from(value: TierRateLimitsDto) -> Self {
        Self {
            free: value.free.into(),
            basic: value.basic.into(),
            pro: value.pro.into(),
            admin: value.admin.into(),
        }
    }
}

impl From<RateLimitSettings> for RateLimitSettingsDto {
    fn from(value: RateLimitSettings) -> Self {
        Self {
            enabled: value.enabled,
            features: value
                .features
                .into_iter()
                .map(|(feature, settings)| {
                    (
                        feature.as_str().to_owned(),
                        FeatureRateLimitDto {
                            enabled: settings.enabled,
                            tiers: settings.tiers.into(),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl TryFrom<RateLimitSettingsDto> for RateLimitSettings {
    type Error = AppError;

    fn try_from(value: RateLimitSettingsDto) -> Result<Self, Self::Error> {
        let features = value
            .features
            .into_iter()
            .map(|(feature, settings)| {
                let feature = RateLimitFeature::from_str(feature.as_str()).map_err(|_| {
                    AppError::Validation(format!("unknown rate limit feature '{feature}'"))
                })?;

                Ok((
                    feature,
                    FeatureRateLimitSettings {
                        enabled: settings.enabled,
                        tiers: settings.tiers.into(),
                    },
                ))
            })
            .collect::<Result<BTreeMap<_, _>, AppError>>()?;

        Ok(Self {
            enabled: value.enabled,
            features,
        })
    }
}
