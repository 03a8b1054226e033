use quiz_core::model::{CourseId, ShareId, TestResult};
use sqlx::Row;
use uuid::Uuid;

use super::{
    SqliteRepository,
    mapping::{answers_from_json, answers_to_json, conn, ser, u32_from_i64},
};
use crate::repository::{RowId, StorageError, TestResultRepository, TestResultRow};

fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<TestResult, StorageError> {
    let course_id: String = row.try_get("course_id").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let answers = answers_from_json(&row.try_get::<String, _>("answers").map_err(ser)?)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;
    let share_id: String = row.try_get("share_id").map_err(ser)?;
    let share_id = Uuid::parse_str(&share_id).map_err(ser)?;

    TestResult::from_persisted(
        CourseId::new(course_id),
        score,
        total,
        answers,
        completed_at,
        ShareId::from_uuid(share_id),
    )
    .map_err(ser)
}

#[async_trait::async_trait]
impl TestResultRepository for SqliteRepository {
    async fn append_result(&self, result: &TestResult) -> Result<RowId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO test_results (
                    course_id, score, total_questions, answers,
                    completed_at, share_id
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(result.course_id().as_str())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(answers_to_json(result.answers())?)
        .bind(result.completed_at())
        .bind(result.share_id().value().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result_by_share_id(&self, share_id: ShareId) -> Result<TestResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    course_id, score, total_questions, answers,
                    completed_at, share_id
                FROM test_results
                WHERE share_id = ?1
            ",
        )
        .bind(share_id.value().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, course_id, score, total_questions, answers,
                    completed_at, share_id
                FROM test_results
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: RowId = row.try_get("id").map_err(ser)?;
            out.push(TestResultRow {
                id,
                result: map_result_row(&row)?,
            });
        }
        Ok(out)
    }
}
