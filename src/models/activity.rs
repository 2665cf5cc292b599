use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Navigation tabs that carry an unread badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Forum,
    Events,
    Packages,
    Polls,
    Marketplace,
}

/// Last time the user opened each tab
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivity {
    pub user_id: String,
    pub last_seen_forum: DateTime<Utc>,
    pub last_seen_events: DateTime<Utc>,
    pub last_seen_packages: DateTime<Utc>,
    pub last_seen_polls: DateTime<Utc>,
    pub last_seen_marketplace: DateTime<Utc>,
}

impl UserActivity {
    /// Fresh row: everything counts as seen at `now`
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            last_seen_forum: now,
            last_seen_events: now,
            last_seen_packages: now,
            last_seen_polls: now,
            last_seen_marketplace: now,
        }
    }

    pub fn last_seen(&self, tab: Tab) -> DateTime<Utc> {
        match tab {
            Tab::Forum => self.last_seen_forum,
            Tab::Events => self.last_seen_events,
            Tab::Packages => self.last_seen_packages,
            Tab::Polls => self.last_seen_polls,
            Tab::Marketplace => self.last_seen_marketplace,
        }
    }

    pub fn mark_seen(&mut self, tab: Tab, at: DateTime<Utc>) {
        let slot = match tab {
            Tab::Forum => &mut self.last_seen_forum,
            Tab::Events => &mut self.last_seen_events,
            Tab::Packages => &mut self.last_seen_packages,
            Tab::Polls => &mut self.last_seen_polls,
            Tab::Marketplace => &mut self.last_seen_marketplace,
        };
        *slot = at;
    }
}

/// Unread counts shown next to each tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Badges {
    pub unread_forum: usize,
    pub unread_events: usize,
    pub unread_packages: usize,
    pub unread_polls: usize,
    pub unread_marketplace: usize,
}
