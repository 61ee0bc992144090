//! Certificate repository.

use std::sync::Arc;

use chrono::Utc;
use opencourse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};

use crate::entities::{Certificate, certificate};

/// Certificate repository for database operations.
///
/// Certificates are append-only: there is no update or delete path.
#[derive(Clone)]
pub struct CertificateRepository {
    db: Arc<DatabaseConnection>,
}

impl CertificateRepository {
    /// Create a new certificate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the certificate of a user for a course.
    pub async fn find_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Option<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::UserId.eq(user_id))
            .filter(certificate::Column::CourseId.eq(course_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all certificates of a user, most recent first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::UserId.eq(user_id))
            .order_by(certificate::Column::IssuedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count certificates of a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Certificate::find()
            .filter(certificate::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all certificates.
    pub async fn count(&self) -> AppResult<u64> {
        Certificate::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Issue a certificate. When a concurrent issuance wins the race on the
    /// unique (`user_id`, `course_id`) index, the existing certificate is
    /// fetched and returned instead of surfacing an error.
    pub async fn create(
        &self,
        id: String,
        user_id: String,
        course_id: String,
    ) -> AppResult<certificate::Model> {
        let model = certificate::ActiveModel {
            id: Set(id),
            user_id: Set(user_id.clone()),
            course_id: Set(course_id.clone()),
            issued_at: Set(Utc::now().into()),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(certificate) => Ok(certificate),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => self
                    .find_by_user_and_course(&user_id, &course_id)
                    .await?
                    .ok_or_else(|| AppError::Database(e.to_string())),
                _ => Err(AppError::Database(e.to_string())),
            },
        }
    }
}
