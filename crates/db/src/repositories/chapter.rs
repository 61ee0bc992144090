//! Chapter repository.

use std::sync::Arc;

use opencourse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr,
};

use crate::entities::{Chapter, chapter};

/// Chapter repository for database operations.
#[derive(Clone)]
pub struct ChapterRepository {
    db: Arc<DatabaseConnection>,
}

impl ChapterRepository {
    /// Create a new chapter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a chapter by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<chapter::Model>> {
        Chapter::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a chapter by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<chapter::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ChapterNotFound(id.to_string()))
    }

    /// Find all chapters of a course, ordered by position.
    pub async fn find_by_course(&self, course_id: &str) -> AppResult<Vec<chapter::Model>> {
        Chapter::find()
            .filter(chapter::Column::CourseId.eq(course_id))
            .order_by(chapter::Column::Position, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find published chapters of a course, ordered by position.
    pub async fn find_published_by_course(&self, course_id: &str) -> AppResult<Vec<chapter::Model>> {
        Chapter::find()
            .filter(chapter::Column::CourseId.eq(course_id))
            .filter(chapter::Column::IsPublished.eq(true))
            .order_by(chapter::Column::Position, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count published chapters of a course.
    pub async fn count_published_by_course(&self, course_id: &str) -> AppResult<u64> {
        Chapter::find()
            .filter(chapter::Column::CourseId.eq(course_id))
            .filter(chapter::Column::IsPublished.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Next free position in a course (max + 1, or 0 for an empty course).
    pub async fn next_position(&self, course_id: &str) -> AppResult<i32> {
        use sea_orm::FromQueryResult;

        #[derive(FromQueryResult)]
        struct MaxResult {
            max_position: Option<i32>,
        }

        let result = Chapter::find()
            .filter(chapter::Column::CourseId.eq(course_id))
            .select_only()
            .column_as(chapter::Column::Position.max(), "max_position")
            .into_model::<MaxResult>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.and_then(|r| r.max_position).map_or(0, |max| max + 1))
    }

    /// Create a new chapter. A position collision surfaces as Conflict.
    pub async fn create(&self, model: chapter::ActiveModel) -> AppResult<chapter::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Chapter position already taken".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Update a chapter. A position collision surfaces as Conflict.
    pub async fn update(&self, model: chapter::ActiveModel) -> AppResult<chapter::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Chapter position already taken".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Delete a chapter permanently. Lessons cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Chapter::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
