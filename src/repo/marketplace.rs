use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable};

use super::{bump, charge_post, flip_marker, Authors, Toggle};
use crate::constants::MAX_LIST_ROWS;
use crate::db::codec::{exists, load, load_all, store};
use crate::db::tables::{self, pair_key};
use crate::error::{AppError, Result};
use crate::models::{
    new_id, ItemStatus, MarketplaceBoard, MarketplaceItem, MarketplaceItemView,
    NewMarketplaceItem, PostLimits, Profile,
};

/// List an item for sale or give-away. Contact email falls back to the
/// seller's account email.
pub fn create_item(
    db: &Database,
    seller: &Profile,
    input: NewMarketplaceItem,
    image_url: Option<String>,
    now: DateTime<Utc>,
    limits: PostLimits,
) -> Result<MarketplaceItemView> {
    let item = MarketplaceItem {
        id: new_id(),
        user_id: seller.id.clone(),
        item_name: input.item_name,
        description: input.description,
        location: input.location,
        price: input.price,
        is_negotiable: input.is_negotiable,
        give_away_by: input.give_away_by,
        status: ItemStatus::Available,
        contact_email: input
            .contact_email
            .unwrap_or_else(|| seller.email.clone()),
        image_url,
        view_count: 0,
        like_count: 0,
        created_at: now,
    };

    let write_txn = db.begin_write()?;
    {
        charge_post(&write_txn, &seller.id, now, limits)?;
        let mut items = write_txn.open_table(tables::MARKETPLACE_ITEMS)?;
        store(&mut items, &item.id, &item)?;
    }
    write_txn.commit()?;

    tracing::info!("User {} listed marketplace item {}", seller.id, item.id);
    Ok(MarketplaceItemView {
        item,
        seller: seller.summary(),
        is_liked_by_me: false,
    })
}

/// Every item, split into new and expiring sections
pub fn list_items(
    db: &Database,
    viewer_id: &str,
    now: DateTime<Utc>,
) -> Result<MarketplaceBoard> {
    let read_txn = db.begin_read()?;
    let items = read_txn.open_table(tables::MARKETPLACE_ITEMS)?;
    let likes = read_txn.open_table(tables::MARKETPLACE_LIKES)?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    let mut authors = Authors::new(&profiles);

    let mut listed = load_all::<MarketplaceItem, _>(&items)?;
    listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    listed.truncate(MAX_LIST_ROWS);

    let views = listed
        .into_iter()
        .map(|item| view(item, viewer_id, &likes, &mut authors))
        .collect::<Result<Vec<_>>>()?;

    Ok(MarketplaceBoard::partition(views, now))
}

pub fn get_item(db: &Database, item_id: &str, viewer_id: &str) -> Result<MarketplaceItemView> {
    let read_txn = db.begin_read()?;
    let items = read_txn.open_table(tables::MARKETPLACE_ITEMS)?;
    let likes = read_txn.open_table(tables::MARKETPLACE_LIKES)?;
    let profiles = read_txn.open_table(tables::PROFILES)?;

    let item: MarketplaceItem =
        load(&items, item_id)?.ok_or(AppError::NotFound("Marketplace item"))?;
    let mut authors = Authors::new(&profiles);
    view(item, viewer_id, &likes, &mut authors)
}

/// Add or remove the user's like
pub fn toggle_like(db: &Database, item_id: &str, user_id: &str) -> Result<Toggle> {
    let write_txn = db.begin_write()?;
    let toggle = {
        let mut items = write_txn.open_table(tables::MARKETPLACE_ITEMS)?;
        let mut item: MarketplaceItem =
            load(&items, item_id)?.ok_or(AppError::NotFound("Marketplace item"))?;

        let mut likes = write_txn.open_table(tables::MARKETPLACE_LIKES)?;
        let active = flip_marker(&mut likes, &pair_key(item_id, user_id))?;
        item.like_count = bump(item.like_count, active);
        store(&mut items, item_id, &item)?;

        Toggle {
            active,
            count: item.like_count,
        }
    };
    write_txn.commit()?;
    Ok(toggle)
}

/// Count one view; returns the new total
pub fn record_view(db: &Database, item_id: &str) -> Result<u64> {
    let write_txn = db.begin_write()?;
    let views = {
        let mut items = write_txn.open_table(tables::MARKETPLACE_ITEMS)?;
        let mut item: MarketplaceItem =
            load(&items, item_id)?.ok_or(AppError::NotFound("Marketplace item"))?;
        item.view_count = item.view_count.saturating_add(1);
        store(&mut items, item_id, &item)?;
        item.view_count
    };
    write_txn.commit()?;
    Ok(views)
}

/// Close a listing as sold or given away. Seller only, and only once.
pub fn update_status(
    db: &Database,
    item_id: &str,
    seller_id: &str,
    status: ItemStatus,
) -> Result<MarketplaceItem> {
    if status == ItemStatus::Available {
        return Err(AppError::invalid("Status must be sold or given_away"));
    }

    let write_txn = db.begin_write()?;
    let item = {
        let mut items = write_txn.open_table(tables::MARKETPLACE_ITEMS)?;
        let mut item: MarketplaceItem =
            load(&items, item_id)?.ok_or(AppError::NotFound("Marketplace item"))?;
        if item.user_id != seller_id {
            return Err(AppError::Forbidden("Only the seller can update this item"));
        }
        if !item.is_available() {
            return Err(AppError::Conflict(
                "Item is no longer available".to_string(),
            ));
        }

        item.status = status;
        store(&mut items, item_id, &item)?;
        item
    };
    write_txn.commit()?;

    tracing::info!("Marketplace item {} marked {:?}", item_id, status);
    Ok(item)
}

fn view<L, P>(
    item: MarketplaceItem,
    viewer_id: &str,
    likes: &L,
    authors: &mut Authors<'_, P>,
) -> Result<MarketplaceItemView>
where
    L: ReadableTable<&'static str, &'static [u8]>,
    P: ReadableTable<&'static str, &'static [u8]>,
{
    Ok(MarketplaceItemView {
        seller: authors.get(&item.user_id)?,
        is_liked_by_me: exists(likes, &pair_key(&item.id, viewer_id))?,
        item,
    })
}
