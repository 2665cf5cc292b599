use serde::{Deserialize, Serialize};

use crate::constants::{SECS_PER_DAY, SECS_PER_HOUR};
use crate::error::{AppError, Result};

/// Per-user counters limiting how fast new content can be created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitRecord {
    /// Number of posts made in the current hour window
    pub posts_this_hour: u32,
    /// Number of posts made in the current day window
    pub posts_today: u32,
    /// Unix timestamp of the last post
    pub last_post_at: Option<i64>,
    /// Unix timestamp when the hourly counter resets
    pub hour_reset_at: i64,
    /// Unix timestamp when the daily counter resets
    pub day_reset_at: i64,
}

/// Configured ceilings for [`RateLimitRecord::check_and_increment`]
#[derive(Debug, Clone, Copy)]
pub struct PostLimits {
    pub per_hour: u32,
    pub per_day: u32,
}

impl RateLimitRecord {
    /// Create a new rate limit record with initial reset times
    pub fn new(now: i64) -> Self {
        Self {
            posts_this_hour: 0,
            posts_today: 0,
            last_post_at: None,
            hour_reset_at: now + SECS_PER_HOUR,
            day_reset_at: now + SECS_PER_DAY,
        }
    }

    /// Check if rate limits allow a new post, and update counters if allowed
    /// Returns Ok(()) if allowed, Err(RateLimitExceeded) if not
    pub fn check_and_increment(&mut self, now: i64, limits: PostLimits) -> Result<()> {
        // Reset counters if time windows have expired
        if now >= self.hour_reset_at {
            self.posts_this_hour = 0;
            self.hour_reset_at = now + SECS_PER_HOUR;
        }

        if now >= self.day_reset_at {
            self.posts_today = 0;
            self.day_reset_at = now + SECS_PER_DAY;
        }

        if self.posts_this_hour >= limits.per_hour {
            tracing::warn!(
                "Hourly post limit would be exceeded: {}/{}",
                self.posts_this_hour,
                limits.per_hour
            );
            return Err(AppError::RateLimitExceeded);
        }

        if self.posts_today >= limits.per_day {
            tracing::warn!(
                "Daily post limit would be exceeded: {}/{}",
                self.posts_today,
                limits.per_day
            );
            return Err(AppError::RateLimitExceeded);
        }

        self.posts_this_hour += 1;
        self.posts_today += 1;
        self.last_post_at = Some(now);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: PostLimits = PostLimits {
        per_hour: 5,
        per_day: 20,
    };

    #[test]
    fn test_new_rate_limit_record() {
        let now = 1000000;
        let record = RateLimitRecord::new(now);

        assert_eq!(record.posts_this_hour, 0);
        assert_eq!(record.posts_today, 0);
        assert!(record.last_post_at.is_none());
        assert_eq!(record.hour_reset_at, now + SECS_PER_HOUR);
        assert_eq!(record.day_reset_at, now + SECS_PER_DAY);
    }

    #[test]
    fn test_hourly_limit_then_reset() {
        let now = 1000000;
        let mut record = RateLimitRecord::new(now);

        for _ in 0..LIMITS.per_hour {
            assert!(record.check_and_increment(now, LIMITS).is_ok());
        }
        assert!(matches!(
            record.check_and_increment(now, LIMITS),
            Err(AppError::RateLimitExceeded)
        ));

        assert!(record.check_and_increment(now + 3601, LIMITS).is_ok());
        assert_eq!(record.posts_this_hour, 1);
        assert_eq!(record.last_post_at, Some(now + 3601));
    }

    #[test]
    fn test_daily_limit() {
        let mut now = 1000000;
        let mut record = RateLimitRecord::new(now);

        for i in 0..LIMITS.per_day {
            if i > 0 && i % LIMITS.per_hour == 0 {
                now += 3601;
            }
            assert!(record.check_and_increment(now, LIMITS).is_ok(), "Post {} should succeed", i);
        }

        now += 3601;
        assert!(matches!(
            record.check_and_increment(now, LIMITS),
            Err(AppError::RateLimitExceeded)
        ));
    }
}
