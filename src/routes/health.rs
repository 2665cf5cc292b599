use axum::{extract::State, Json};
use redb::ReadableDatabase;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub storage: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
///
/// Returns the health status of the server, its database and the image
/// directory. Used by load balancers and monitoring systems.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check database connectivity by attempting a read transaction
    let database = match state
        .with_db(|db| {
            let _txn = db.begin_read()?;
            Ok(())
        })
        .await
    {
        Ok(()) => "connected",
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected"
        }
    };

    let storage = if state.images.root().is_dir() {
        "available"
    } else {
        "missing"
    };

    Json(HealthResponse {
        status: if database == "connected" {
            "healthy"
        } else {
            "unhealthy"
        },
        database,
        storage,
        version: env!("CARGO_PKG_VERSION"),
    })
}
