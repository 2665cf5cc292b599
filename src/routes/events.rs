use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::{Contributor, Reader};
use crate::clock;
use crate::error::Result;
use crate::models::{Event, EventView, NewEvent};
use crate::repo::events;
use crate::routes::SuccessResponse;
use crate::storage::{Bucket, ImageUpload};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    #[serde(flatten)]
    pub event: NewEvent,
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

pub async fn list_events(
    State(state): State<AppState>,
    _reader: Reader,
) -> Result<Json<Vec<EventView>>> {
    let listed = state.with_db(events::list_events).await?;
    Ok(Json(listed))
}

pub async fn create_event(
    State(state): State<AppState>,
    Contributor(host): Contributor,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    let input = payload.event.validate()?;
    let image_url = state
        .images
        .save_optional(Bucket::EventImages, payload.image.as_ref())
        .await?;

    let limits = state.post_limits();
    let stored = image_url.clone();
    let created = state
        .with_db(move |db| {
            events::create_event(db, &host.id, input, image_url, clock::now(), limits)
        })
        .await;
    // Nothing references the upload once the create has failed
    if created.is_err() {
        if let Some(url) = stored {
            state.images.discard(&url).await;
        }
    }
    let event = created?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Contributor(viewer): Contributor,
    Path(event_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state
        .with_db(move |db| events::delete_event(db, &event_id, &viewer, clock::now()))
        .await?;
    Ok(SuccessResponse::ok())
}
