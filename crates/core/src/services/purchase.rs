//! Purchase service.
//!
//! Payment processing is mocked: checkout produces a pending session the
//! frontend drives, and the subsequent enroll call carries the payment
//! confirmation. No payment provider is involved.

use opencourse_common::{AppError, AppResult, Config};
use opencourse_db::{
    entities::user,
    repositories::{CourseRepository, EnrollmentRepository},
};

/// Purchase service producing mock checkout sessions for paid courses.
#[derive(Clone)]
pub struct PurchaseService {
    course_repo: CourseRepository,
    enrollment_repo: EnrollmentRepository,
    frontend_url: String,
}

/// A mock checkout session, shaped like a payment provider's.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub course_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub url: String,
}

impl PurchaseService {
    /// Create a new purchase service.
    #[must_use]
    pub fn new(
        course_repo: CourseRepository,
        enrollment_repo: EnrollmentRepository,
        config: &Config,
    ) -> Self {
        Self {
            course_repo,
            enrollment_repo,
            frontend_url: config.server.frontend_url.clone(),
        }
    }

    /// Start a mock checkout for a paid course.
    ///
    /// Only published, paid courses the user neither owns nor is enrolled
    /// in qualify. Free courses are rejected; callers enroll in those
    /// directly.
    pub async fn create_checkout_session(
        &self,
        user: &user::Model,
        course_id: &str,
    ) -> AppResult<CheckoutSession> {
        let course = self.course_repo.get_by_id(course_id).await?;

        if !course.status.is_published() {
            return Err(AppError::InvalidState(
                "Course is not open for enrollment".to_string(),
            ));
        }
        if user.id == course.user_id {
            return Err(AppError::Forbidden(
                "You cannot purchase your own course".to_string(),
            ));
        }
        if self.enrollment_repo.is_enrolled(&user.id, &course.id).await? {
            return Err(AppError::Conflict(
                "Already enrolled in this course".to_string(),
            ));
        }
        if !course.is_paid() {
            return Err(AppError::InvalidState(
                "Course is free, enroll in it directly".to_string(),
            ));
        }

        let id = format!("mock_session_{}", chrono::Utc::now().timestamp_millis());
        let url = format!(
            "{}/checkout/{}?session={}",
            self.frontend_url, course.id, id
        );

        tracing::info!(
            user_id = %user.id,
            course_id = %course.id,
            session_id = %id,
            "created mock checkout session"
        );

        Ok(CheckoutSession {
            id,
            course_id: course.id,
            user_id: user.id.clone(),
            amount: course.price.unwrap_or_default(),
            currency: "usd".to_string(),
            status: "pending".to_string(),
            url,
        })
    }
}
