//! Lesson progress repository.

use std::sync::Arc;

use chrono::Utc;
use opencourse_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
    sea_query::OnConflict,
};

use crate::entities::{LessonProgress, lesson_progress};

/// Lesson progress repository for database operations.
#[derive(Clone)]
pub struct LessonProgressRepository {
    db: Arc<DatabaseConnection>,
}

impl LessonProgressRepository {
    /// Create a new lesson progress repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the progress of a user on a lesson.
    pub async fn find_by_user_and_lesson(
        &self,
        user_id: &str,
        lesson_id: &str,
    ) -> AppResult<Option<lesson_progress::Model>> {
        LessonProgress::find()
            .filter(lesson_progress::Column::UserId.eq(user_id))
            .filter(lesson_progress::Column::LessonId.eq(lesson_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write the progress of a user on a lesson as a single atomic upsert
    /// keyed on the unique (`user_id`, `lesson_id`) index. Calling twice
    /// with the same arguments leaves one row in the same state.
    pub async fn upsert(
        &self,
        id: String,
        user_id: String,
        lesson_id: String,
        is_completed: bool,
    ) -> AppResult<lesson_progress::Model> {
        let now = Utc::now();
        let model = lesson_progress::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            lesson_id: Set(lesson_id),
            is_completed: Set(is_completed),
            created_at: Set(now.into()),
            updated_at: Set(Some(now.into())),
        };

        LessonProgress::insert(model)
            .on_conflict(
                OnConflict::columns([
                    lesson_progress::Column::UserId,
                    lesson_progress::Column::LessonId,
                ])
                .update_columns([
                    lesson_progress::Column::IsCompleted,
                    lesson_progress::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the completed marks a user holds within a lesson set.
    pub async fn count_completed_in(
        &self,
        user_id: &str,
        lesson_ids: &[String],
    ) -> AppResult<u64> {
        if lesson_ids.is_empty() {
            return Ok(0);
        }

        LessonProgress::find()
            .filter(lesson_progress::Column::UserId.eq(user_id))
            .filter(lesson_progress::Column::LessonId.is_in(lesson_ids.to_vec()))
            .filter(lesson_progress::Column::IsCompleted.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of every lesson a user has completed.
    pub async fn find_completed_lesson_ids_by_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<String>> {
        LessonProgress::find()
            .filter(lesson_progress::Column::UserId.eq(user_id))
            .filter(lesson_progress::Column::IsCompleted.eq(true))
            .select_only()
            .column(lesson_progress::Column::LessonId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count completed marks held by any of the given users within a
    /// lesson set.
    pub async fn count_completed_by_users_in(
        &self,
        user_ids: &[String],
        lesson_ids: &[String],
    ) -> AppResult<u64> {
        if user_ids.is_empty() || lesson_ids.is_empty() {
            return Ok(0);
        }

        LessonProgress::find()
            .filter(lesson_progress::Column::UserId.is_in(user_ids.to_vec()))
            .filter(lesson_progress::Column::LessonId.is_in(lesson_ids.to_vec()))
            .filter(lesson_progress::Column::IsCompleted.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
