use quiz_core::model::{CourseId, Question, QuestionId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, i64_from_usize, options_from_json, options_to_json, ser, usize_from_i64},
};
use crate::repository::{QuestionBank, StorageError};

fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let prompt: String = row.try_get("prompt").map_err(ser)?;
    let options = options_from_json(&row.try_get::<String, _>("options").map_err(ser)?)?;
    let correct = usize_from_i64(
        "correct_answer",
        row.try_get::<i64, _>("correct_answer").map_err(ser)?,
    )?;
    let explanation: String = row.try_get("explanation").map_err(ser)?;
    let topic: String = row.try_get("topic").map_err(ser)?;

    Question::new(
        QuestionId::new(id),
        prompt,
        options,
        correct,
        explanation,
        topic,
    )
    .map_err(ser)
}

#[async_trait::async_trait]
impl QuestionBank for SqliteRepository {
    async fn replace_questions(
        &self,
        course_id: &CourseId,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM questions WHERE course_id = ?1")
            .bind(course_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, question) in questions.iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO questions (
                        course_id, id, position, prompt, options,
                        correct_answer, explanation, topic
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(course_id.as_str())
            .bind(question.id().as_str())
            .bind(i64_from_usize("position", position)?)
            .bind(question.prompt())
            .bind(options_to_json(question.options())?)
            .bind(i64_from_usize(
                "correct_answer",
                question.correct_answer_index(),
            )?)
            .bind(question.explanation())
            .bind(question.topic())
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
                other => conn(other),
            })?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn questions_for_course(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, prompt, options, correct_answer, explanation, topic
                FROM questions
                WHERE course_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(course_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }
}
