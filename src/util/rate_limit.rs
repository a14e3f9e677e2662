//! Rate limiting utilities

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};

/// Per-key limiter; keys are seller IDs
pub type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Limits AI requests per seller
#[derive(Clone)]
pub struct SellerRateLimiter {
    limiter: Arc<KeyedLimiter>,
}

impl SellerRateLimiter {
    /// Allow `per_minute` requests per seller, all of them usable as a burst
    pub fn per_minute(per_minute: u32) -> Self {
        Self::with_quota(Quota::per_minute(
            NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN),
        ))
    }

    fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Check if a request is allowed (returns true if allowed)
    pub fn check(&self, seller_id: &str) -> bool {
        self.limiter.check_key(&seller_id.to_string()).is_ok()
    }

    /// Forget sellers whose quota has fully replenished
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of sellers currently holding limiter state
    pub fn tracked_sellers(&self) -> usize {
        self.limiter.len()
    }
}
