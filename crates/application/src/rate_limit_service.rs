//! Request rate gate.
//!
//! Fixed-window counters keyed by `"<feature>:<userId>"`, with windows and
//! limits resolved per subscription tier from mutable settings.

mod config;
mod ports;
mod service;

pub use config::{FeatureRateLimitSettings, RateLimitRule, RateLimitSettings, TierRateLimits};
pub use ports::{RateLimitDecision, RateLimitStore};
pub use service::RateLimitService;
