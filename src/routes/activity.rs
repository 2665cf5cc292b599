use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::Reader;
use crate::clock;
use crate::error::Result;
use crate::models::{Badges, Tab, UserActivity};
use crate::repo::activity;
use crate::AppState;

pub async fn fetch_activity(
    State(state): State<AppState>,
    Reader(user): Reader,
) -> Result<Json<UserActivity>> {
    let row = state
        .with_db(move |db| activity::fetch_activity(db, &user.id, clock::now()))
        .await?;
    Ok(Json(row))
}

/// Called when the user opens a tab; clears that tab's badge
pub async fn mark_seen(
    State(state): State<AppState>,
    Reader(user): Reader,
    Path(tab): Path<Tab>,
) -> Result<Json<UserActivity>> {
    let row = state
        .with_db(move |db| activity::mark_seen(db, &user.id, tab, clock::now()))
        .await?;
    Ok(Json(row))
}

pub async fn fetch_badges(
    State(state): State<AppState>,
    Reader(user): Reader,
) -> Result<Json<Badges>> {
    let badges = state
        .with_db(move |db| activity::badges(db, &user.id, clock::now()))
        .await?;
    Ok(Json(badges))
}
