//! Datastore operations.
//!
//! Every public function here runs exactly one redb transaction and is meant
//! to be called from the blocking pool (see [`crate::AppState::with_db`]).
//! Read-modify-write operations such as toggles and vote upserts rely on
//! redb's single writer for atomicity.

pub mod activity;
pub mod comments;
pub mod dev_support;
pub mod events;
pub mod forum;
pub mod marketplace;
pub mod packages;
pub mod polls;
pub mod profiles;
pub mod sessions;
pub mod stats;

use chrono::{DateTime, Utc};
use redb::{ReadableTable, Table, WriteTransaction};
use serde::Serialize;
use std::collections::HashMap;

use crate::constants::ERR_NOT_OWNER;
use crate::db::codec;
use crate::db::tables;
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, PostLimits, Profile, RateLimitRecord};

/// Value stored under per-user marker keys (likes, useful-votes)
const MARKER: &[u8] = &[];

/// Outcome of a like / useful-vote toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggle {
    /// Whether the caller's vote is now present
    pub active: bool,
    pub count: u32,
}

/// Flip the marker at `key`; returns whether it is now set
pub(crate) fn flip_marker(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
) -> Result<bool> {
    if codec::remove(table, key)? {
        Ok(false)
    } else {
        table.insert(key, MARKER)?;
        Ok(true)
    }
}

/// Adjust a counter after a toggle, never going below zero
pub(crate) fn bump(count: u32, active: bool) -> u32 {
    if active {
        count.saturating_add(1)
    } else {
        count.saturating_sub(1)
    }
}

/// Owners and administrators may delete or edit a record
pub fn ensure_can_moderate(viewer: &Profile, owner_id: &str) -> Result<()> {
    if viewer.is_admin() || viewer.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(ERR_NOT_OWNER))
    }
}

/// Count one content creation against the user's hourly and daily limits.
///
/// Runs inside the caller's write transaction so a rejected creation leaves
/// the counters untouched.
pub(crate) fn charge_post(
    txn: &WriteTransaction,
    user_id: &str,
    now: DateTime<Utc>,
    limits: PostLimits,
) -> Result<()> {
    let mut rate_limits = txn.open_table(tables::RATE_LIMITS)?;
    let now_secs = now.timestamp();
    let mut record: RateLimitRecord =
        codec::load(&rate_limits, user_id)?.unwrap_or_else(|| RateLimitRecord::new(now_secs));

    if let Err(e) = record.check_and_increment(now_secs, limits) {
        tracing::warn!("Rate limit exceeded for user {}", user_id);
        return Err(e);
    }

    codec::store(&mut rate_limits, user_id, &record)
}

/// Resolves author summaries, looking each profile up once per call
pub(crate) struct Authors<'t, Tb> {
    profiles: &'t Tb,
    cache: HashMap<String, AuthorSummary>,
}

impl<'t, Tb> Authors<'t, Tb>
where
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    pub(crate) fn new(profiles: &'t Tb) -> Self {
        Self {
            profiles,
            cache: HashMap::new(),
        }
    }

    /// Public summary for `user_id`, or the "Unknown" placeholder
    pub(crate) fn get(&mut self, user_id: &str) -> Result<AuthorSummary> {
        if let Some(author) = self.cache.get(user_id) {
            return Ok(author.clone());
        }
        let author = codec::load::<Profile, _>(self.profiles, user_id)?
            .map(|p| p.summary())
            .unwrap_or_else(|| AuthorSummary::unknown(user_id));
        self.cache.insert(user_id.to_string(), author.clone());
        Ok(author)
    }
}
