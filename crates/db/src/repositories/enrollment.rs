//! Enrollment repository.

use std::sync::Arc;

use opencourse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr,
};

use crate::entities::{Enrollment, enrollment};

/// Enrollment repository for database operations.
#[derive(Clone)]
pub struct EnrollmentRepository {
    db: Arc<DatabaseConnection>,
}

impl EnrollmentRepository {
    /// Create a new enrollment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the enrollment of a user in a course.
    pub async fn find_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Option<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::CourseId.eq(course_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is enrolled in a course.
    pub async fn is_enrolled(&self, user_id: &str, course_id: &str) -> AppResult<bool> {
        let count = Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::CourseId.eq(course_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Find all enrollments of a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .order_by(enrollment::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of the courses a user is enrolled in.
    pub async fn find_course_ids_by_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .select_only()
            .column(enrollment::Column::CourseId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of the users enrolled in a course.
    pub async fn find_user_ids_by_course(&self, course_id: &str) -> AppResult<Vec<String>> {
        Enrollment::find()
            .filter(enrollment::Column::CourseId.eq(course_id))
            .select_only()
            .column(enrollment::Column::UserId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count enrollments in a course.
    pub async fn count_by_course(&self, course_id: &str) -> AppResult<u64> {
        Enrollment::find()
            .filter(enrollment::Column::CourseId.eq(course_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count enrollments of a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all enrollments.
    pub async fn count(&self) -> AppResult<u64> {
        Enrollment::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an enrollment. Under concurrent duplicate enrolls the unique
    /// (`user_id`, `course_id`) index decides; the losing insert surfaces
    /// as Conflict.
    pub async fn create(&self, model: enrollment::ActiveModel) -> AppResult<enrollment::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Already enrolled in this course".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Delete the enrollment of a user in a course. Returns whether a row
    /// was removed.
    pub async fn delete_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<bool> {
        let deleted = Enrollment::delete_many()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::CourseId.eq(course_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(deleted.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_enrollment(id: &str, user_id: &str, course_id: &str) -> enrollment::Model {
        enrollment::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_course() {
        let enrollment = create_test_enrollment("e1", "u1", "c1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[enrollment]])
                .into_connection(),
        );

        let repo = EnrollmentRepository::new(db);
        let result = repo.find_by_user_and_course("u1", "c1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "e1");
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let e1 = create_test_enrollment("e1", "u1", "c1");
        let e2 = create_test_enrollment("e2", "u1", "c2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1, e2]])
                .into_connection(),
        );

        let repo = EnrollmentRepository::new(db);
        let result = repo.find_by_user("u1").await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_is_enrolled() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .into_connection(),
        );

        let repo = EnrollmentRepository::new(db);
        assert!(repo.is_enrolled("u1", "c1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_user_and_course_reports_removal() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = EnrollmentRepository::new(db);
        assert!(repo.delete_by_user_and_course("u1", "c1").await.unwrap());
        assert!(!repo.delete_by_user_and_course("u1", "c1").await.unwrap());
    }
}
