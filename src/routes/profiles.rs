use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::Reader;
use crate::error::{AppError, Result};
use crate::models::AuthorSummary;
use crate::repo::profiles;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Mention autocomplete
pub async fn search_profiles(
    State(state): State<AppState>,
    _reader: Reader,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<AuthorSummary>>> {
    let matches = state
        .with_db(move |db| profiles::search_profiles(db, &query.q))
        .await?;
    Ok(Json(matches))
}

pub async fn get_profile(
    State(state): State<AppState>,
    _reader: Reader,
    Path(user_id): Path<String>,
) -> Result<Json<AuthorSummary>> {
    let profile = state
        .with_db(move |db| profiles::get_profile(db, &user_id))
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(Json(profile.summary()))
}
