use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, UserId};

/// Subscription level used to select rate-limit and quota parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    /// Default tier for new accounts.
    Free,
    /// Entry paid tier.
    Basic,
    /// Full paid tier.
    Pro,
    /// Operators; effectively unlimited.
    Admin,
}

impl SubscriptionTier {
    /// Returns a stable storage value for this tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Admin => "admin",
        }
    }

    /// Returns all tiers ordered from least to most privileged.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SubscriptionTier] = &[
            SubscriptionTier::Free,
            SubscriptionTier::Basic,
            SubscriptionTier::Pro,
            SubscriptionTier::Admin,
        ];

        ALL
    }
}

impl Display for SubscriptionTier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!(
                "unknown subscription tier '{value}'"
            ))),
        }
    }
}

/// Caller identity resolved by the upstream gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: UserId,
    tier: SubscriptionTier,
}

impl UserIdentity {
    /// Creates a user identity from a user id and subscription tier.
    #[must_use]
    pub fn new(user_id: UserId, tier: SubscriptionTier) -> Self {
        Self { user_id, tier }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the subscription tier of the caller.
    #[must_use]
    pub fn tier(&self) -> SubscriptionTier {
        self.tier
    }

    /// Returns whether the caller may use administrative endpoints.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.tier == SubscriptionTier::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::SubscriptionTier;

    #[test]
    fn tier_parsing_is_case_insensitive() {
        assert!(matches!("PRO".parse::<SubscriptionTier>(), Ok(SubscriptionTier::Pro)));
        assert!("platinum".parse::<SubscriptionTier>().is_err());
    }
}
