use std::io;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use storage::repository::{
    EmailCaptureRepository, EmailCaptureRow, TestResultRepository, TestResultRow,
};

use crate::error::AdminError;

/// Export encodings for email captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(AdminError::UnknownFormat(s.to_owned())),
        }
    }
}

#[derive(Debug, Serialize)]
struct CaptureRecord<'a> {
    id: i64,
    email: &'a str,
    course_id: &'a str,
    course_name: &'a str,
    score: u32,
    total_questions: u32,
    percentage: u32,
    captured_at: DateTime<Utc>,
}

impl<'a> CaptureRecord<'a> {
    fn from_row(row: &'a EmailCaptureRow) -> Self {
        let c = &row.capture;
        Self {
            id: row.id,
            email: c.email(),
            course_id: c.course_id().as_str(),
            course_name: c.course_name(),
            score: c.score(),
            total_questions: c.total_questions(),
            percentage: c.percentage(),
            captured_at: c.captured_at(),
        }
    }
}

const CSV_HEADERS: [&str; 8] = [
    "id",
    "email",
    "course_id",
    "course_name",
    "score",
    "total_questions",
    "percentage",
    "captured_at",
];

/// Administrative read access to captured leads and past results.
///
/// Every call presents a key that must equal the configured one exactly.
#[derive(Clone)]
pub struct AdminService {
    admin_key: Option<String>,
    captures: Arc<dyn EmailCaptureRepository>,
    results: Arc<dyn TestResultRepository>,
}

impl AdminService {
    /// A blank `admin_key` counts as not configured.
    #[must_use]
    pub fn new(
        admin_key: Option<String>,
        captures: Arc<dyn EmailCaptureRepository>,
        results: Arc<dyn TestResultRepository>,
    ) -> Self {
        Self {
            admin_key: admin_key.filter(|k| !k.is_empty()),
            captures,
            results,
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.admin_key.is_some()
    }

    fn authorize(&self, key: &str) -> Result<(), AdminError> {
        let Some(expected) = self.admin_key.as_deref() else {
            log::warn!("admin access attempted but no key is configured");
            return Err(AdminError::NotConfigured);
        };
        if key != expected {
            log::warn!("admin access denied");
            return Err(AdminError::Unauthorized);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AdminError::NotConfigured`/`Unauthorized` for access failures
    /// and `AdminError::Storage` on backend failures.
    pub async fn list_captures(&self, key: &str) -> Result<Vec<EmailCaptureRow>, AdminError> {
        self.authorize(key)?;
        Ok(self.captures.list_captures().await?)
    }

    /// Most recent results first.
    ///
    /// # Errors
    ///
    /// Same as [`AdminService::list_captures`].
    pub async fn list_results(
        &self,
        key: &str,
        limit: u32,
    ) -> Result<Vec<TestResultRow>, AdminError> {
        self.authorize(key)?;
        Ok(self.results.list_results(limit).await?)
    }

    /// All captures rendered as CSV or a JSON array, newest first.
    ///
    /// # Errors
    ///
    /// Same as [`AdminService::list_captures`], plus `AdminError::Json`.
    pub async fn export_captures(
        &self,
        key: &str,
        format: ExportFormat,
    ) -> Result<String, AdminError> {
        let rows = self.list_captures(key).await?;
        log::info!("exporting {} captures as {format:?}", rows.len());
        match format {
            ExportFormat::Csv => captures_to_csv(&rows),
            ExportFormat::Json => {
                let records: Vec<CaptureRecord<'_>> =
                    rows.iter().map(CaptureRecord::from_row).collect();
                Ok(serde_json::to_string_pretty(&records)?)
            }
        }
    }
}

// Header row is written by hand so an empty export still has one.
fn captures_to_csv(rows: &[EmailCaptureRow]) -> Result<String, AdminError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(CSV_HEADERS)?;
    for row in rows {
        wtr.serialize(CaptureRecord::from_row(row))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AdminError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|e| AdminError::Csv(io::Error::new(io::ErrorKind::InvalidData, e).into()))
}
