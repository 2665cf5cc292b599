use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase};

use super::{charge_post, Authors};
use crate::constants::MAX_LIST_ROWS;
use crate::db::codec::{load, load_all, load_children, store};
use crate::db::tables;
use crate::error::{AppError, Result};
use crate::models::{
    new_id, Comment, NewPackageReport, PackageReport, PackageReportView, PackageStatus,
    PostLimits,
};

/// Open reports, newest first; old ones only when `include_old` is set
pub fn list_reports(
    db: &Database,
    now: DateTime<Utc>,
    include_old: bool,
) -> Result<Vec<PackageReportView>> {
    let read_txn = db.begin_read()?;
    let reports = read_txn.open_table(tables::PACKAGE_REPORTS)?;
    let comments = read_txn.open_table(tables::PACKAGE_COMMENTS)?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    let mut authors = Authors::new(&profiles);

    let mut listed: Vec<PackageReport> = load_all::<PackageReport, _>(&reports)?
        .into_iter()
        .filter(|r| r.is_listed(now, include_old))
        .collect();
    listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    listed.truncate(MAX_LIST_ROWS);

    listed
        .into_iter()
        .map(|report| -> Result<PackageReportView> {
            let comment_count = load_children::<Comment, _>(&comments, &report.id)?
                .iter()
                .filter(|c| c.deleted_at.is_none())
                .count();
            Ok(PackageReportView {
                reporter: authors.get(&report.user_id)?,
                comment_count,
                report,
            })
        })
        .collect()
}

pub fn create_report(
    db: &Database,
    user_id: &str,
    input: NewPackageReport,
    image_url: Option<String>,
    now: DateTime<Utc>,
    limits: PostLimits,
) -> Result<PackageReport> {
    let report = PackageReport {
        id: new_id(),
        user_id: user_id.to_string(),
        report_type: input.report_type,
        item_description: input.item_description,
        location_found: input.location_found,
        status: PackageStatus::Open,
        tags: input.tags,
        package_digits: input.package_digits,
        image_url,
        is_food: input.is_food,
        additional_notes: input.additional_notes,
        created_at: now,
    };

    let write_txn = db.begin_write()?;
    {
        charge_post(&write_txn, user_id, now, limits)?;
        let mut reports = write_txn.open_table(tables::PACKAGE_REPORTS)?;
        store(&mut reports, &report.id, &report)?;
    }
    write_txn.commit()?;

    tracing::info!(
        "User {} reported {:?} package {}",
        user_id,
        report.report_type,
        report.id
    );
    Ok(report)
}

/// Mark a report resolved. Resolving twice is harmless.
pub fn resolve_report(db: &Database, report_id: &str) -> Result<PackageReport> {
    let write_txn = db.begin_write()?;
    let report = {
        let mut reports = write_txn.open_table(tables::PACKAGE_REPORTS)?;
        let mut report: PackageReport =
            load(&reports, report_id)?.ok_or(AppError::NotFound("Package report"))?;
        report.status = PackageStatus::Resolved;
        store(&mut reports, report_id, &report)?;
        report
    };
    write_txn.commit()?;

    tracing::info!("Package report {} resolved", report_id);
    Ok(report)
}
