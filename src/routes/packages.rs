use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::{Contributor, Reader};
use crate::clock;
use crate::error::Result;
use crate::models::{NewPackageReport, PackageReport, PackageReportView};
use crate::repo::packages;
use crate::storage::{Bucket, ImageUpload};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PackageQuery {
    /// Also show open reports older than the board window
    #[serde(default)]
    pub include_old: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreatePackageRequest {
    #[serde(flatten)]
    pub report: NewPackageReport,
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

pub async fn list_packages(
    State(state): State<AppState>,
    _reader: Reader,
    Query(query): Query<PackageQuery>,
) -> Result<Json<Vec<PackageReportView>>> {
    let reports = state
        .with_db(move |db| packages::list_reports(db, clock::now(), query.include_old))
        .await?;
    Ok(Json(reports))
}

pub async fn create_package_report(
    State(state): State<AppState>,
    Contributor(reporter): Contributor,
    Json(payload): Json<CreatePackageRequest>,
) -> Result<(StatusCode, Json<PackageReport>)> {
    let input = payload.report.validate()?;
    let image_url = state
        .images
        .save_optional(Bucket::PackageReports, payload.image.as_ref())
        .await?;

    let limits = state.post_limits();
    let stored = image_url.clone();
    let created = state
        .with_db(move |db| {
            packages::create_report(db, &reporter.id, input, image_url, clock::now(), limits)
        })
        .await;
    // Nothing references the upload once the create has failed
    if created.is_err() {
        if let Some(url) = stored {
            state.images.discard(&url).await;
        }
    }
    let report = created?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Any contributor may mark a package as picked up
pub async fn resolve_package(
    State(state): State<AppState>,
    Contributor(user): Contributor,
    Path(report_id): Path<String>,
) -> Result<Json<PackageReport>> {
    let report = state
        .with_db(move |db| packages::resolve_report(db, &report_id))
        .await?;
    tracing::info!("User {} resolved package report {}", user.id, report.id);
    Ok(Json(report))
}
