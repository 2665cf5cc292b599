use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{Contributor, Reader};
use crate::clock;
use crate::error::Result;
use crate::models::{
    ItemStatus, MarketplaceBoard, MarketplaceItem, MarketplaceItemView, NewMarketplaceItem,
};
use crate::repo::{marketplace, Toggle};
use crate::storage::{Bucket, ImageUpload};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    #[serde(flatten)]
    pub item: NewMarketplaceItem,
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ItemStatus,
}

#[derive(Debug, Serialize)]
pub struct ViewCountResponse {
    pub view_count: u64,
}

pub async fn list_items(
    State(state): State<AppState>,
    Reader(viewer): Reader,
) -> Result<Json<MarketplaceBoard>> {
    let board = state
        .with_db(move |db| marketplace::list_items(db, &viewer.id, clock::now()))
        .await?;
    Ok(Json(board))
}

pub async fn create_item(
    State(state): State<AppState>,
    Contributor(seller): Contributor,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<MarketplaceItemView>)> {
    let input = payload.item.validate()?;
    let image_url = state
        .images
        .save_optional(Bucket::MarketplaceImages, payload.image.as_ref())
        .await?;

    let limits = state.post_limits();
    let stored = image_url.clone();
    let created = state
        .with_db(move |db| {
            marketplace::create_item(db, &seller, input, image_url, clock::now(), limits)
        })
        .await;
    // Nothing references the upload once the create has failed
    if created.is_err() {
        if let Some(url) = stored {
            state.images.discard(&url).await;
        }
    }
    let item = created?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<AppState>,
    Reader(viewer): Reader,
    Path(item_id): Path<String>,
) -> Result<Json<MarketplaceItemView>> {
    let item = state
        .with_db(move |db| marketplace::get_item(db, &item_id, &viewer.id))
        .await?;
    Ok(Json(item))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Contributor(user): Contributor,
    Path(item_id): Path<String>,
) -> Result<Json<Toggle>> {
    let toggle = state
        .with_db(move |db| marketplace::toggle_like(db, &item_id, &user.id))
        .await?;
    Ok(Json(toggle))
}

/// Opening an item's detail page counts as a view
pub async fn record_view(
    State(state): State<AppState>,
    _reader: Reader,
    Path(item_id): Path<String>,
) -> Result<Json<ViewCountResponse>> {
    let view_count = state
        .with_db(move |db| marketplace::record_view(db, &item_id))
        .await?;
    Ok(Json(ViewCountResponse { view_count }))
}

pub async fn update_status(
    State(state): State<AppState>,
    Contributor(seller): Contributor,
    Path(item_id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<MarketplaceItem>> {
    let item = state
        .with_db(move |db| marketplace::update_status(db, &item_id, &seller.id, payload.status))
        .await?;
    Ok(Json(item))
}
