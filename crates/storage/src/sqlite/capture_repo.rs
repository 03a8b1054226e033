use quiz_core::model::{CourseId, EmailCapture};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, ser, u32_from_i64},
};
use crate::repository::{EmailCaptureRepository, EmailCaptureRow, RowId, StorageError};

fn map_capture_row(row: &sqlx::sqlite::SqliteRow) -> Result<EmailCaptureRow, StorageError> {
    let id: RowId = row.try_get("id").map_err(ser)?;
    let email: String = row.try_get("email").map_err(ser)?;
    let course_id: String = row.try_get("course_id").map_err(ser)?;
    let course_name: String = row.try_get("course_name").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let captured_at = row.try_get("captured_at").map_err(ser)?;

    let capture = EmailCapture::from_persisted(
        email,
        CourseId::new(course_id),
        course_name,
        score,
        total,
        captured_at,
    )
    .map_err(ser)?;
    Ok(EmailCaptureRow { id, capture })
}

#[async_trait::async_trait]
impl EmailCaptureRepository for SqliteRepository {
    async fn append_capture(&self, capture: &EmailCapture) -> Result<RowId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO email_captures (
                    email, course_id, course_name, score,
                    total_questions, percentage, captured_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(capture.email())
        .bind(capture.course_id().as_str())
        .bind(capture.course_name())
        .bind(i64::from(capture.score()))
        .bind(i64::from(capture.total_questions()))
        .bind(i64::from(capture.percentage()))
        .bind(capture.captured_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_captures(&self) -> Result<Vec<EmailCaptureRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, email, course_id, course_name, score,
                    total_questions, captured_at
                FROM email_captures
                ORDER BY captured_at DESC, id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_capture_row).collect()
    }

    async fn list_captures_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<EmailCaptureRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, email, course_id, course_name, score,
                    total_questions, captured_at
                FROM email_captures
                WHERE email = ?1 COLLATE NOCASE
                ORDER BY captured_at DESC, id DESC
            ",
        )
        .bind(email.trim())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_capture_row).collect()
    }
}
