//! Throttling of failed `/verify` attempts
//!
//! Transaction IDs are short enough to guess, so a user that keeps sending
//! invalid IDs is locked out. The window slides: every failure refreshes the
//! entry's TTL, so a user is unblocked only after a full window without
//! failed attempts.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of users tracked at once
const MAX_TRACKED_USERS: u64 = 10_000;

/// Per-user counter of failed verification attempts
#[derive(Clone)]
pub struct AttemptLimiter {
    /// user_id -> failures inside the current window
    failures: Cache<i64, u32>,
    max_attempts: u32,
    /// Attempts rejected because the user was over the limit
    blocked_count: Arc<AtomicU64>,
}

impl AttemptLimiter {
    /// Creates a limiter allowing `max_attempts` failures per `window`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use txn_gate_bot::bot::AttemptLimiter;
    ///
    /// let limiter = AttemptLimiter::new(5, Duration::from_secs(600));
    /// ```
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        let failures = Cache::builder()
            .max_capacity(MAX_TRACKED_USERS)
            .time_to_live(window)
            .build();

        Self {
            failures,
            max_attempts,
            blocked_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// `true` if the user used up all attempts in the current window.
    pub async fn is_blocked(&self, user_id: i64) -> bool {
        let failures = self.failures.get(&user_id).await.unwrap_or(0);
        if failures < self.max_attempts {
            return false;
        }

        let count = self.blocked_count.fetch_add(1, Ordering::Relaxed) + 1;
        // Only every 100th rejection is logged
        if count.is_multiple_of(100) {
            debug!("⛔️ Rejected {} throttled verify attempts (recent: user {})", count, user_id);
        }
        true
    }

    /// Counts one failed attempt for `user_id` and restarts its window.
    pub async fn record_failure(&self, user_id: i64) {
        let failures = self
            .failures
            .entry(user_id)
            .and_upsert_with(|existing| {
                let failures = existing.map_or(1, |e| e.into_value().saturating_add(1));
                std::future::ready(failures)
            })
            .await
            .into_value();

        if failures == self.max_attempts {
            warn!("User {} reached the verify attempt limit", user_id);
        }
    }

    /// Clears the counter after a successful verification.
    pub async fn reset(&self, user_id: i64) {
        self.failures.invalidate(&user_id).await;
    }

    /// Total number of throttled attempts
    #[must_use]
    pub fn blocked_count(&self) -> u64 {
        self.blocked_count.load(Ordering::Relaxed)
    }
}
