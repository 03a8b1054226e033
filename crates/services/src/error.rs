//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{CaptureError, CourseId, SessionStateError, TestResultError};
use quiz_core::InteractionError;
use storage::catalog::CatalogError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no test available for course {course_id}")]
    EmptyBank { course_id: CourseId },
    #[error("this session does not collect an email")]
    GateNotEmail,
    #[error(transparent)]
    State(#[from] SessionStateError),
    #[error(transparent)]
    Interaction(#[from] InteractionError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    TestResult(#[from] TestResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AdminService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdminError {
    #[error("admin access is not configured")]
    NotConfigured,
    #[error("admin key rejected")]
    Unauthorized,
    #[error("unknown export format: {0}")]
    UnknownFormat(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
