use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable};
use serde::de::DeserializeOwned;

use crate::db::codec::{load, load_all, store};
use crate::db::tables::{self, RecordTable};
use crate::error::Result;
use crate::models::{
    Badges, Event, ForumPost, MarketplaceItem, PackageReport, Poll, Tab, UserActivity,
};

/// Activity row for a user, created with every tab seen `now` when absent
pub fn fetch_activity(db: &Database, user_id: &str, now: DateTime<Utc>) -> Result<UserActivity> {
    {
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(tables::USER_ACTIVITY)?;
        if let Some(activity) = load(&table, user_id)? {
            return Ok(activity);
        }
    }

    let write_txn = db.begin_write()?;
    let activity = {
        let mut table = write_txn.open_table(tables::USER_ACTIVITY)?;
        // Another request may have created it in between
        match load(&table, user_id)? {
            Some(existing) => existing,
            None => {
                let fresh = UserActivity::new(user_id, now);
                store(&mut table, user_id, &fresh)?;
                fresh
            }
        }
    };
    write_txn.commit()?;
    Ok(activity)
}

/// Record that the user opened `tab` at `now`
pub fn mark_seen(
    db: &Database,
    user_id: &str,
    tab: Tab,
    now: DateTime<Utc>,
) -> Result<UserActivity> {
    let write_txn = db.begin_write()?;
    let activity = {
        let mut table = write_txn.open_table(tables::USER_ACTIVITY)?;
        let mut activity =
            load(&table, user_id)?.unwrap_or_else(|| UserActivity::new(user_id, now));
        activity.mark_seen(tab, now);
        store(&mut table, user_id, &activity)?;
        activity
    };
    write_txn.commit()?;
    Ok(activity)
}

/// Unread counts: visible records created strictly after the tab was last seen
pub fn badges(db: &Database, user_id: &str, now: DateTime<Utc>) -> Result<Badges> {
    let activity = fetch_activity(db, user_id, now)?;

    let read_txn = db.begin_read()?;
    let count_since = |table: RecordTable, tab: Tab| -> Result<usize> {
        let table = read_txn.open_table(table)?;
        Ok(match tab {
            Tab::Forum => unread::<ForumPost, _>(&table, |p| {
                !p.is_deleted() && p.created_at > activity.last_seen(tab)
            })?,
            Tab::Events => unread::<Event, _>(&table, |e| {
                !e.is_deleted() && e.created_at > activity.last_seen(tab)
            })?,
            Tab::Packages => unread::<PackageReport, _>(&table, |r| {
                r.is_open() && r.created_at > activity.last_seen(tab)
            })?,
            Tab::Polls => unread::<Poll, _>(&table, |p| {
                !p.is_deleted() && p.created_at > activity.last_seen(tab)
            })?,
            Tab::Marketplace => unread::<MarketplaceItem, _>(&table, |i| {
                i.is_available() && i.created_at > activity.last_seen(tab)
            })?,
        })
    };

    Ok(Badges {
        unread_forum: count_since(tables::FORUM_POSTS, Tab::Forum)?,
        unread_events: count_since(tables::EVENTS, Tab::Events)?,
        unread_packages: count_since(tables::PACKAGE_REPORTS, Tab::Packages)?,
        unread_polls: count_since(tables::POLLS, Tab::Polls)?,
        unread_marketplace: count_since(tables::MARKETPLACE_ITEMS, Tab::Marketplace)?,
    })
}

fn unread<T, Tb>(table: &Tb, is_unread: impl Fn(&T) -> bool) -> Result<usize>
where
    T: DeserializeOwned,
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    Ok(load_all::<T, _>(table)?.iter().filter(|r| is_unread(r)).count())
}
