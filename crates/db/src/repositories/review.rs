//! Review repository.

use std::sync::Arc;

use opencourse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr,
};

use crate::entities::{Review, review};

/// Review repository for database operations.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the review a user left on a course.
    pub async fn find_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Option<review::Model>> {
        Review::find()
            .filter(review::Column::UserId.eq(user_id))
            .filter(review::Column::CourseId.eq(course_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find reviews of a course, newest first.
    pub async fn find_by_course(
        &self,
        course_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<review::Model>> {
        Review::find()
            .filter(review::Column::CourseId.eq(course_id))
            .order_by(review::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reviews of a course.
    pub async fn count_by_course(&self, course_id: &str) -> AppResult<u64> {
        Review::find()
            .filter(review::Column::CourseId.eq(course_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of the ratings on a course. Zero when there are no reviews.
    pub async fn rating_sum_by_course(&self, course_id: &str) -> AppResult<i64> {
        use sea_orm::FromQueryResult;

        #[derive(FromQueryResult)]
        struct SumResult {
            total: Option<i64>,
        }

        let result = Review::find()
            .filter(review::Column::CourseId.eq(course_id))
            .select_only()
            .column_as(review::Column::Rating.sum(), "total")
            .into_model::<SumResult>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.and_then(|r| r.total).unwrap_or(0))
    }

    /// Create a review. A second review by the same user on the same
    /// course surfaces as Conflict.
    pub async fn create(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Course already reviewed".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }
}
