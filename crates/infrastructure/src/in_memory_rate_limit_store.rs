//! Process-local rate limit counters.
//!
//! Entries live in a sharded concurrent map; each check holds the shard
//! write lock of its key for the whole read-modify-write, so checks for the
//! same identifier are serialized while different identifiers proceed in
//! parallel.

use async_trait::async_trait;
use dashmap::DashMap;
use promptloom_application::{RateLimitDecision, RateLimitRule, RateLimitStore};
use promptloom_core::AppResult;

#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    reset_time_ms: i64,
}

/// In-memory fixed-window counter store.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    records: DashMap<String, RateLimitRecord>,
}

impl InMemoryRateLimitStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tracked identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether no identifier is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn record_request(
        &self,
        identifier: &str,
        rule: RateLimitRule,
        now_ms: i64,
    ) -> AppResult<RateLimitDecision> {
        let fresh = RateLimitRecord {
            count: 0,
            reset_time_ms: now_ms.saturating_add(rule.window_ms),
        };

        let mut record = self
            .records
            .entry(identifier.to_owned())
            .or_insert(fresh);

        if now_ms > record.reset_time_ms {
            *record = fresh;
        }

        if record.count >= rule.max_requests {
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_time_ms: record.reset_time_ms,
                disabled: false,
            });
        }

        record.count += 1;
        Ok(RateLimitDecision {
            allowed: true,
            remaining: rule.max_requests - record.count,
            reset_time_ms: record.reset_time_ms,
            disabled: false,
        })
    }

    async fn sweep_expired(&self, now_ms: i64) -> AppResult<u64> {
        let mut removed = 0_u64;
        self.records.retain(|_, record| {
            let keep = record.reset_time_ms >= now_ms;
            if !keep {
                removed += 1;
            }
            keep
        });

        Ok(removed)
    }
}
