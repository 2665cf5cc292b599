use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::AuthorSummary;
use crate::constants::PACKAGE_WINDOW_DAYS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Found,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Open,
    Resolved,
}

/// Package Watch report, keyed by report id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReport {
    pub id: String,
    pub user_id: String,
    pub report_type: ReportType,
    pub item_description: String,
    pub location_found: String,
    pub status: PackageStatus,
    pub tags: Vec<String>,
    pub package_digits: Option<String>,
    pub image_url: Option<String>,
    pub is_food: bool,
    pub additional_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PackageReport {
    pub fn is_open(&self) -> bool {
        self.status == PackageStatus::Open
    }

    /// Open and, unless old reports are requested, inside the board window
    pub fn is_listed(&self, now: DateTime<Utc>, include_old: bool) -> bool {
        self.is_open()
            && (include_old || self.created_at > now - Duration::days(PACKAGE_WINDOW_DAYS))
    }
}

/// Last digits of a tracking number; digits only
pub fn validate_package_digits(digits: &str) -> bool {
    !digits.is_empty() && digits.len() <= 8 && digits.chars().all(|c| c.is_ascii_digit())
}

/// Report as listed, with who posted it
#[derive(Debug, Clone, Serialize)]
pub struct PackageReportView {
    #[serde(flatten)]
    pub report: PackageReport,
    pub reporter: AuthorSummary,
    pub comment_count: usize,
}
