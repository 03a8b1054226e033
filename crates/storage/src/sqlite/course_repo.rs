use quiz_core::model::{Course, CourseId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, ser},
};
use crate::repository::{CourseRepository, StorageError};

fn map_course_row(row: &sqlx::sqlite::SqliteRow) -> Result<Course, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let name: String = row.try_get("name").map_err(ser)?;
    let description: String = row.try_get("description").map_err(ser)?;
    let study_plan_url: Option<String> = row.try_get("study_plan_url").map_err(ser)?;

    Course::new(
        CourseId::new(id),
        name,
        description,
        study_plan_url.as_deref(),
    )
    .map_err(ser)
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO courses (id, name, description, study_plan_url)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    study_plan_url = excluded.study_plan_url
            ",
        )
        .bind(course.id().as_str())
        .bind(course.name())
        .bind(course.description())
        .bind(course.study_plan_url().map(url::Url::as_str))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, name, description, study_plan_url
                FROM courses
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, name, description, study_plan_url
                FROM courses
                ORDER BY name ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_course_row).collect()
    }
}
