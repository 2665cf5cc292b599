pub mod account;
pub mod activity;
pub mod admin;
pub mod comments;
pub mod dev_support;
pub mod events;
pub mod forum;
pub mod health;
pub mod marketplace;
pub mod packages;
pub mod polls;
pub mod profiles;

use axum::Json;
use serde::Serialize;

/// Body for operations with nothing else to report
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}
