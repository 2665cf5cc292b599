use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::{Contributor, Reader};
use crate::clock;
use crate::error::Result;
use crate::models::{ForumPost, ForumPostView, NewPost};
use crate::repo::{forum, Toggle};
use crate::routes::SuccessResponse;
use crate::AppState;

pub async fn list_posts(
    State(state): State<AppState>,
    Reader(viewer): Reader,
) -> Result<Json<Vec<ForumPostView>>> {
    let posts = state
        .with_db(move |db| forum::list_posts(db, &viewer.id))
        .await?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Reader(viewer): Reader,
    Path(post_id): Path<String>,
) -> Result<Json<ForumPostView>> {
    let post = state
        .with_db(move |db| forum::get_post(db, &post_id, &viewer.id))
        .await?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<AppState>,
    Contributor(author): Contributor,
    Json(payload): Json<NewPost>,
) -> Result<(StatusCode, Json<ForumPost>)> {
    let input = payload.validate()?;
    let limits = state.post_limits();
    let post = state
        .with_db(move |db| forum::create_post(db, &author.id, input, clock::now(), limits))
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn toggle_useful(
    State(state): State<AppState>,
    Contributor(voter): Contributor,
    Path(post_id): Path<String>,
) -> Result<Json<Toggle>> {
    let toggle = state
        .with_db(move |db| forum::toggle_useful(db, &post_id, &voter.id))
        .await?;
    Ok(Json(toggle))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Contributor(viewer): Contributor,
    Path(post_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state
        .with_db(move |db| forum::delete_post(db, &post_id, &viewer, clock::now()))
        .await?;
    Ok(SuccessResponse::ok())
}
