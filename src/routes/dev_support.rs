use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::{Admin, Contributor, Reader};
use crate::clock;
use crate::error::Result;
use crate::models::{DevSupportTicket, DevSupportTicketView, NewTicket, TicketStatus};
use crate::repo::{dev_support, Toggle};
use crate::routes::SuccessResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TicketStatusRequest {
    pub status: TicketStatus,
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Reader(viewer): Reader,
) -> Result<Json<Vec<DevSupportTicketView>>> {
    let tickets = state
        .with_db(move |db| dev_support::list_tickets(db, &viewer.id))
        .await?;
    Ok(Json(tickets))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Contributor(author): Contributor,
    Json(payload): Json<NewTicket>,
) -> Result<(StatusCode, Json<DevSupportTicket>)> {
    let input = payload.validate()?;
    let limits = state.post_limits();
    let ticket = state
        .with_db(move |db| {
            dev_support::create_ticket(db, &author.id, input, clock::now(), limits)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn toggle_vote(
    State(state): State<AppState>,
    Contributor(voter): Contributor,
    Path(ticket_id): Path<String>,
) -> Result<Json<Toggle>> {
    let toggle = state
        .with_db(move |db| dev_support::toggle_vote(db, &ticket_id, &voter.id))
        .await?;
    Ok(Json(toggle))
}

/// Administrators move tickets between open, in progress, resolved and closed
pub async fn update_status(
    State(state): State<AppState>,
    Admin(admin): Admin,
    Path(ticket_id): Path<String>,
    Json(payload): Json<TicketStatusRequest>,
) -> Result<Json<DevSupportTicket>> {
    let ticket = state
        .with_db(move |db| dev_support::update_status(db, &ticket_id, payload.status))
        .await?;
    tracing::info!("Admin {} updated ticket {}", admin.id, ticket.id);
    Ok(Json(ticket))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    Contributor(viewer): Contributor,
    Path(ticket_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state
        .with_db(move |db| dev_support::delete_ticket(db, &ticket_id, &viewer, clock::now()))
        .await?;
    Ok(SuccessResponse::ok())
}
