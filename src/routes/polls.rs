use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::{Contributor, Reader};
use crate::clock;
use crate::error::Result;
use crate::models::{NewPoll, PollFilter, PollView};
use crate::repo::polls;
use crate::routes::SuccessResponse;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PollQuery {
    #[serde(default)]
    pub filter: PollFilter,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option_id: String,
}

/// GET /api/polls?filter=active|past|all
pub async fn list_polls(
    State(state): State<AppState>,
    Reader(viewer): Reader,
    Query(query): Query<PollQuery>,
) -> Result<Json<Vec<PollView>>> {
    let listed = state
        .with_db(move |db| polls::list_polls(db, &viewer.id, query.filter, clock::now()))
        .await?;
    Ok(Json(listed))
}

pub async fn create_poll(
    State(state): State<AppState>,
    Contributor(creator): Contributor,
    Json(payload): Json<NewPoll>,
) -> Result<(StatusCode, Json<PollView>)> {
    let input = payload.validate()?;
    let limits = state.post_limits();
    let poll = state
        .with_db(move |db| polls::create_poll(db, &creator.id, input, clock::now(), limits))
        .await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

/// Poll details with who voted for what
pub async fn get_poll(
    State(state): State<AppState>,
    Reader(viewer): Reader,
    Path(poll_id): Path<String>,
) -> Result<Json<PollView>> {
    let poll = state
        .with_db(move |db| polls::get_poll(db, &poll_id, &viewer.id))
        .await?;
    Ok(Json(poll))
}

pub async fn cast_vote(
    State(state): State<AppState>,
    Contributor(voter): Contributor,
    Path(poll_id): Path<String>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<PollView>> {
    let poll = state
        .with_db(move |db| {
            polls::cast_vote(db, &poll_id, &payload.option_id, &voter.id, clock::now())
        })
        .await?;
    Ok(Json(poll))
}

pub async fn retract_vote(
    State(state): State<AppState>,
    Contributor(voter): Contributor,
    Path(poll_id): Path<String>,
) -> Result<Json<PollView>> {
    let poll = state
        .with_db(move |db| polls::retract_vote(db, &poll_id, &voter.id, clock::now()))
        .await?;
    Ok(Json(poll))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    Contributor(viewer): Contributor,
    Path(poll_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state
        .with_db(move |db| polls::delete_poll(db, &poll_id, &viewer, clock::now()))
        .await?;
    Ok(SuccessResponse::ok())
}
