use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::AuthorSummary;
use crate::constants::MARKETPLACE_NEW_WINDOW_HOURS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Available,
    Sold,
    GivenAway,
}

/// Marketplace listing, keyed by item id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceItem {
    pub id: String,
    pub user_id: String,
    pub item_name: String,
    pub description: String,
    pub location: String,
    /// None means free
    pub price: Option<f64>,
    pub is_negotiable: bool,
    pub give_away_by: Option<DateTime<Utc>>,
    pub status: ItemStatus,
    pub contact_email: String,
    pub image_url: Option<String>,
    pub view_count: u64,
    pub like_count: u32,
    pub created_at: DateTime<Utc>,
}

impl MarketplaceItem {
    pub fn is_available(&self) -> bool {
        self.status == ItemStatus::Available
    }

    /// Available and listed within the last few hours
    pub fn is_new(&self, now: DateTime<Utc>) -> bool {
        self.is_available()
            && self.created_at > now - Duration::hours(MARKETPLACE_NEW_WINDOW_HOURS)
    }
}

/// Item as listed for the current user
#[derive(Debug, Clone, Serialize)]
pub struct MarketplaceItemView {
    #[serde(flatten)]
    pub item: MarketplaceItem,
    pub seller: AuthorSummary,
    pub is_liked_by_me: bool,
}

/// The two marketplace sections
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketplaceBoard {
    pub new_items: Vec<MarketplaceItemView>,
    pub expiring_items: Vec<MarketplaceItemView>,
}

impl MarketplaceBoard {
    /// Split into fresh listings (newest first) and the rest.
    ///
    /// The rest puts available items before sold or given-away ones, then
    /// orders by deadline, soonest first, with undated items last.
    pub fn partition(items: Vec<MarketplaceItemView>, now: DateTime<Utc>) -> Self {
        let (mut new_items, mut expiring_items): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|view| view.item.is_new(now));

        new_items.sort_by(|a, b| b.item.created_at.cmp(&a.item.created_at));
        expiring_items.sort_by(|a, b| compare_deadlines(&a.item, &b.item));

        Self {
            new_items,
            expiring_items,
        }
    }
}

fn compare_deadlines(a: &MarketplaceItem, b: &MarketplaceItem) -> Ordering {
    b.is_available()
        .cmp(&a.is_available())
        .then_with(|| match (a.give_away_by, b.give_away_by) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(
        id: &str,
        status: ItemStatus,
        age_hours: i64,
        deadline_days: Option<i64>,
        now: DateTime<Utc>,
    ) -> MarketplaceItemView {
        MarketplaceItemView {
            item: MarketplaceItem {
                id: id.to_string(),
                user_id: "seller".to_string(),
                item_name: format!("Item {}", id),
                description: String::new(),
                location: "Lobby".to_string(),
                price: None,
                is_negotiable: false,
                give_away_by: deadline_days.map(|d| now + Duration::days(d)),
                status,
                contact_email: "seller@hook.coop".to_string(),
                image_url: None,
                view_count: 0,
                like_count: 0,
                created_at: now - Duration::hours(age_hours),
            },
            seller: AuthorSummary::unknown("seller"),
            is_liked_by_me: false,
        }
    }

    fn ids(views: &[MarketplaceItemView]) -> Vec<&str> {
        views.iter().map(|v| v.item.id.as_str()).collect()
    }

    #[test]
    fn test_partition_new_and_expiring() {
        let now = Utc::now();
        let board = MarketplaceBoard::partition(
            vec![
                view("fresh", ItemStatus::Available, 1, Some(10), now),
                view("fresh-sold", ItemStatus::Sold, 1, Some(1), now),
                view("later", ItemStatus::Available, 24, Some(9), now),
                view("soon", ItemStatus::Available, 24, Some(2), now),
                view("undated", ItemStatus::Available, 24, None, now),
            ],
            now,
        );

        assert_eq!(ids(&board.new_items), vec!["fresh"]);
        assert_eq!(
            ids(&board.expiring_items),
            vec!["soon", "later", "undated", "fresh-sold"]
        );
    }
}
