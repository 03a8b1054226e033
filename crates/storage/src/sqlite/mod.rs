//! `SQLite` persistence for the quiz: the course catalog, each course's
//! ordered question bank, captured emails and completed test results.
//!
//! One `SqliteRepository` implements every repository trait over a shared
//! pool; `Storage::sqlite` hands out the same pool behind four trait objects.

use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{
    CourseRepository, EmailCaptureRepository, QuestionBank, Storage, TestResultRepository,
};

mod capture_repo;
mod course_repo;
mod mapping;
mod migrate;
mod question_repo;
mod result_repo;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

// Applied to every pooled connection.
const CONNECTION_PRAGMAS: [&str; 3] = [
    "PRAGMA foreign_keys = ON;",
    "PRAGMA journal_mode = WAL;",
    "PRAGMA busy_timeout = 5000;",
];

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open the quiz database at `database_url` without touching the schema.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the file cannot be opened or a connection
    /// pragma is rejected.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    for pragma in CONNECTION_PRAGMAS {
                        sqlx::query(pragma).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        log::debug!("quiz store opened at {database_url}");
        Ok(Self { pool })
    }

    /// Bring the catalog, capture and result tables up to the latest schema
    /// version.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration step fails; the failing
    /// version is rolled back.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Open and migrate the quiz database, then expose it through every
    /// repository seam.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or
    /// migrated.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionBank> = Arc::new(repo.clone());
        let captures: Arc<dyn EmailCaptureRepository> = Arc::new(repo.clone());
        let results: Arc<dyn TestResultRepository> = Arc::new(repo);
        Ok(Self {
            courses,
            questions,
            captures,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[tokio::test]
    async fn pragmas_apply_to_pooled_connections() {
        let repo = SqliteRepository::connect("sqlite::memory:").await.unwrap();
        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys;")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
        let (timeout,): (i64,) = sqlx::query_as("PRAGMA busy_timeout;")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(timeout, 5000);
    }
}
