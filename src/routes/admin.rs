use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::auth::Admin;
use crate::constants::ERR_SELF_DEMOTION;
use crate::error::Result;
use crate::models::{Profile, Role};
use crate::repo::{profiles, stats, stats::TableCount};
use crate::{AppError, AppState};

/// Sort direction for the user list, by sign-up time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    pub is_verified: bool,
}

/// Database statistics response
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub tables: Vec<TableCount>,
    pub database_size_bytes: u64,
    pub database_size_human: String,
}

/// Format bytes into human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// GET /api/admin/users?search=<text>&sort=asc|desc
pub async fn list_users(
    State(state): State<AppState>,
    _admin: Admin,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<Profile>>> {
    let ascending = query.sort == SortOrder::Asc;
    let users = state
        .with_db(move |db| profiles::list_users(db, query.search.as_deref(), ascending))
        .await?;
    Ok(Json(users))
}

pub async fn update_role(
    State(state): State<AppState>,
    Admin(admin): Admin,
    Path(user_id): Path<String>,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<Profile>> {
    if user_id == admin.id && payload.role != Role::Admin {
        return Err(AppError::Forbidden(ERR_SELF_DEMOTION));
    }

    let role = payload.role;
    let profile = state
        .with_db(move |db| profiles::update_role(db, &user_id, role))
        .await?;

    tracing::info!("Admin {} set role of {} to {:?}", admin.id, profile.id, role);
    Ok(Json(profile))
}

pub async fn update_verification(
    State(state): State<AppState>,
    Admin(admin): Admin,
    Path(user_id): Path<String>,
    Json(payload): Json<VerificationRequest>,
) -> Result<Json<Profile>> {
    let is_verified = payload.is_verified;
    let profile = state
        .with_db(move |db| profiles::update_verification(db, &user_id, is_verified))
        .await?;

    tracing::info!(
        "Admin {} set verification of {} to {}",
        admin.id,
        profile.id,
        is_verified
    );
    Ok(Json(profile))
}

/// Admin stats endpoint
///
/// Returns per-table record counts and the size of the database file.
///
/// GET /api/admin/stats
pub async fn admin_stats(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<AdminStatsResponse>> {
    let database_size_bytes = fs::metadata(&state.config.database_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let tables = state.with_db(stats::table_counts).await?;
    let total: u64 = tables.iter().map(|t| t.records).sum();

    tracing::info!(
        "Admin stats requested: {} records across {} tables, {} database",
        total,
        tables.len(),
        format_bytes(database_size_bytes)
    );

    Ok(Json(AdminStatsResponse {
        tables,
        database_size_bytes,
        database_size_human: format_bytes(database_size_bytes),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_sort_order_defaults_to_newest_first() {
        let query: UserListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.sort, SortOrder::Desc);
        assert!(query.search.is_none());
    }
}
