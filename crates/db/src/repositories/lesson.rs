//! Lesson repository.
//!
//! Also owns attachment queries, since attachments only exist as children
//! of a lesson.

use std::sync::Arc;

use opencourse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};

use crate::entities::{Attachment, Chapter, Lesson, attachment, chapter, lesson};

/// Lesson repository for database operations.
#[derive(Clone)]
pub struct LessonRepository {
    db: Arc<DatabaseConnection>,
}

impl LessonRepository {
    /// Create a new lesson repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ==================== Lesson Operations ====================

    /// Find a lesson by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<lesson::Model>> {
        Lesson::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a lesson by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<lesson::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::LessonNotFound(id.to_string()))
    }

    /// Find lessons by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<lesson::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Lesson::find()
            .filter(lesson::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all lessons of a chapter, ordered by position.
    pub async fn find_by_chapter(&self, chapter_id: &str) -> AppResult<Vec<lesson::Model>> {
        Lesson::find()
            .filter(lesson::Column::ChapterId.eq(chapter_id))
            .order_by(lesson::Column::Position, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find published lessons of a chapter, ordered by position.
    pub async fn find_published_by_chapter(&self, chapter_id: &str) -> AppResult<Vec<lesson::Model>> {
        Lesson::find()
            .filter(lesson::Column::ChapterId.eq(chapter_id))
            .filter(lesson::Column::IsPublished.eq(true))
            .order_by(lesson::Column::Position, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the lessons of a course that count toward completion: published
    /// lessons inside published chapters.
    pub async fn find_eligible_by_course(&self, course_id: &str) -> AppResult<Vec<lesson::Model>> {
        let chapter_ids: Vec<String> = Chapter::find()
            .filter(chapter::Column::CourseId.eq(course_id))
            .filter(chapter::Column::IsPublished.eq(true))
            .select_only()
            .column(chapter::Column::Id)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if chapter_ids.is_empty() {
            return Ok(vec![]);
        }

        Lesson::find()
            .filter(lesson::Column::ChapterId.is_in(chapter_ids))
            .filter(lesson::Column::IsPublished.eq(true))
            .order_by(lesson::Column::Position, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Next free position in a chapter (max + 1, or 0 for an empty chapter).
    pub async fn next_position(&self, chapter_id: &str) -> AppResult<i32> {
        use sea_orm::FromQueryResult;

        #[derive(FromQueryResult)]
        struct MaxResult {
            max_position: Option<i32>,
        }

        let result = Lesson::find()
            .filter(lesson::Column::ChapterId.eq(chapter_id))
            .select_only()
            .column_as(lesson::Column::Position.max(), "max_position")
            .into_model::<MaxResult>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.and_then(|r| r.max_position).map_or(0, |max| max + 1))
    }

    /// Create a new lesson. A position collision surfaces as Conflict.
    pub async fn create(&self, model: lesson::ActiveModel) -> AppResult<lesson::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Lesson position already taken".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Update a lesson. A position collision surfaces as Conflict.
    pub async fn update(&self, model: lesson::ActiveModel) -> AppResult<lesson::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Lesson position already taken".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Delete a lesson permanently. Attachments and progress rows cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Lesson::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // ==================== Attachment Operations ====================

    /// Find attachments of a lesson.
    pub async fn find_attachments(&self, lesson_id: &str) -> AppResult<Vec<attachment::Model>> {
        Attachment::find()
            .filter(attachment::Column::LessonId.eq(lesson_id))
            .order_by(attachment::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find attachments for a set of lessons.
    pub async fn find_attachments_for(
        &self,
        lesson_ids: &[String],
    ) -> AppResult<Vec<attachment::Model>> {
        if lesson_ids.is_empty() {
            return Ok(vec![]);
        }

        Attachment::find()
            .filter(attachment::Column::LessonId.is_in(lesson_ids.to_vec()))
            .order_by(attachment::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace the attachment set of a lesson.
    pub async fn replace_attachments(
        &self,
        lesson_id: &str,
        models: Vec<attachment::ActiveModel>,
    ) -> AppResult<()> {
        Attachment::delete_many()
            .filter(attachment::Column::LessonId.eq(lesson_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !models.is_empty() {
            Attachment::insert_many(models)
                .exec(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_lesson(id: &str, chapter_id: &str, position: i32) -> lesson::Model {
        lesson::Model {
            id: id.to_string(),
            chapter_id: chapter_id.to_string(),
            title: format!("Lesson {position}"),
            description: None,
            video_url: None,
            position,
            is_published: true,
            is_free: false,
            duration: Some(15),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_chapter() {
        let l1 = create_test_lesson("l1", "ch1", 0);
        let l2 = create_test_lesson("l2", "ch1", 1);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[l1, l2]])
                .into_connection(),
        );

        let repo = LessonRepository::new(db);
        let result = repo.find_by_chapter("ch1").await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_find_eligible_short_circuits_without_published_chapters() {
        // The chapter id query comes back empty, so no lesson query runs.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<chapter::Model>::new()])
                .into_connection(),
        );

        let repo = LessonRepository::new(db);
        let result = repo.find_eligible_by_course("c1").await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<lesson::Model>::new()])
                .into_connection(),
        );

        let repo = LessonRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::LessonNotFound(_))));
    }

    #[tokio::test]
    async fn test_replace_attachments_empty_set_only_deletes() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = LessonRepository::new(db);
        let result = repo.replace_attachments("l1", vec![]).await;

        assert!(result.is_ok());
    }
}
