//! Comment endpoints shared by every board.
//!
//! `:board` is one of forum, packages, events, polls, marketplace or
//! dev-support; `:target` is the id of the post, report, event, poll, item
//! or ticket the thread belongs to.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::auth::{Contributor, Reader};
use crate::clock;
use crate::error::Result;
use crate::models::{nest_comments, CommentBoard, CommentThread, CommentView, NewComment};
use crate::repo::{comments, Toggle};
use crate::routes::SuccessResponse;
use crate::AppState;

/// Comments both as a flat list and grouped into reply threads
#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<CommentView>,
    pub threads: Vec<CommentThread>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Reader(viewer): Reader,
    Path((board, target_id)): Path<(CommentBoard, String)>,
) -> Result<Json<CommentsResponse>> {
    let flat = state
        .with_db(move |db| comments::list_comments(db, board, &target_id, &viewer.id))
        .await?;
    let threads = nest_comments(flat.clone());
    Ok(Json(CommentsResponse {
        comments: flat,
        threads,
    }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Contributor(author): Contributor,
    Path((board, target_id)): Path<(CommentBoard, String)>,
    Json(payload): Json<NewComment>,
) -> Result<(StatusCode, Json<CommentView>)> {
    let input = payload.validate()?;
    let limits = state.post_limits();
    let comment = state
        .with_db(move |db| {
            comments::create_comment(
                db,
                board,
                &target_id,
                &author.id,
                input,
                clock::now(),
                limits,
            )
        })
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn toggle_useful(
    State(state): State<AppState>,
    Contributor(voter): Contributor,
    Path((board, target_id, comment_id)): Path<(CommentBoard, String, String)>,
) -> Result<Json<Toggle>> {
    let toggle = state
        .with_db(move |db| {
            comments::toggle_useful(db, board, &target_id, &comment_id, &voter.id)
        })
        .await?;
    Ok(Json(toggle))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Contributor(viewer): Contributor,
    Path((board, target_id, comment_id)): Path<(CommentBoard, String, String)>,
) -> Result<Json<SuccessResponse>> {
    state
        .with_db(move |db| {
            comments::delete_comment(db, board, &target_id, &comment_id, &viewer, clock::now())
        })
        .await?;
    Ok(SuccessResponse::ok())
}
