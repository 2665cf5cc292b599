//! Process-wide timestamp source.
//!
//! Every record timestamp comes from [`now`], which never returns the same
//! millisecond twice, so "created after last seen" comparisons cannot tie.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Current time, strictly greater than any previous call in this process
pub fn now() -> DateTime<Utc> {
    let wall = Utc::now().timestamp_millis();
    let mut prev = LAST_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = wall.max(prev + 1);
        match LAST_MILLIS.compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return DateTime::from_timestamp_millis(next).unwrap_or_else(Utc::now),
            Err(actual) => prev = actual,
        }
    }
}
