//! Review service.

use std::collections::HashMap;

use opencourse_common::{AppError, AppResult, IdGenerator};
use opencourse_db::{
    entities::{review, user},
    repositories::{CourseRepository, EnrollmentRepository, ReviewRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::policy;

/// Upper bound on page sizes for review listings.
const MAX_PAGE_SIZE: u64 = 100;

/// Review service for course ratings.
#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    course_repo: CourseRepository,
    enrollment_repo: EnrollmentRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a review.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// A review joined with its author's display fields.
#[derive(Debug, Clone)]
pub struct ReviewWithAuthor {
    pub review: review::Model,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
}

/// One page of a course's reviews plus the overall aggregate.
#[derive(Debug, Clone)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewWithAuthor>,
    pub total: u64,
    pub average_rating: f64,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub const fn new(
        review_repo: ReviewRepository,
        course_repo: CourseRepository,
        enrollment_repo: EnrollmentRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            review_repo,
            course_repo,
            enrollment_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List a course's reviews, newest first, with author display fields.
    pub async fn list_for_course(
        &self,
        viewer: Option<&user::Model>,
        course_id: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<ReviewPage> {
        let course = self.course_repo.get_by_id(course_id).await?;
        if !policy::can_access_course(viewer, &course) {
            return Err(AppError::CourseNotFound(course_id.to_string()));
        }

        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let reviews = self
            .review_repo
            .find_by_course(&course.id, limit, (page - 1) * limit)
            .await?;
        let total = self.review_repo.count_by_course(&course.id).await?;
        let rating_sum = self.review_repo.rating_sum_by_course(&course.id).await?;

        let author_ids: Vec<String> = reviews.iter().map(|r| r.user_id.clone()).collect();
        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let reviews = reviews
            .into_iter()
            .map(|review| {
                let author = authors.get(&review.user_id);
                ReviewWithAuthor {
                    author_name: author.map(|u| u.name.clone()).unwrap_or_default(),
                    author_avatar_url: author.and_then(|u| u.avatar_url.clone()),
                    review,
                }
            })
            .collect();

        let average_rating = if total == 0 {
            0.0
        } else {
            ((rating_sum as f64 / total as f64) * 10.0).round() / 10.0
        };

        Ok(ReviewPage {
            reviews,
            total,
            average_rating,
        })
    }

    /// Leave a review on a course. One per user per course; enrollment
    /// required.
    pub async fn create(
        &self,
        user: &user::Model,
        course_id: &str,
        input: CreateReviewInput,
    ) -> AppResult<review::Model> {
        input.validate()?;

        let course = self.course_repo.get_by_id(course_id).await?;

        if !self.enrollment_repo.is_enrolled(&user.id, &course.id).await? {
            return Err(AppError::Forbidden(
                "Enroll in the course to leave a review".to_string(),
            ));
        }

        // Check for an existing review. The unique index remains the
        // authority under concurrent submissions.
        if self
            .review_repo
            .find_by_user_and_course(&user.id, &course.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Course already reviewed".to_string()));
        }

        let model = review::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            course_id: Set(course.id.clone()),
            rating: Set(input.rating),
            comment: Set(input.comment),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let review = self.review_repo.create(model).await?;
        tracing::info!(
            user_id = %user.id,
            course_id = %course.id,
            rating = review.rating,
            "reviewed course"
        );

        Ok(review)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use opencourse_db::entities::course::{self, CourseLevel, CourseStatus};
    use opencourse_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            email_lower: format!("{id}@example.com"),
            name: "Test User".to_string(),
            bio: None,
            avatar_url: None,
            role,
            password_hash: "$argon2id$stub".to_string(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_course(id: &str, owner_id: &str, status: CourseStatus) -> course::Model {
        course::Model {
            id: id.to_string(),
            user_id: owner_id.to_string(),
            title: "Rust Basics".to_string(),
            description: "Learn Rust from scratch".to_string(),
            small_description: "Rust from zero".to_string(),
            slug: "rust-basics".to_string(),
            image_url: Some("https://example.com/cover.png".to_string()),
            price: None,
            duration: 10,
            level: CourseLevel::Beginner,
            category: "Development".to_string(),
            status,
            requirements: serde_json::json!([]),
            what_you_will_learn: serde_json::json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_review(id: &str, user_id: &str, course_id: &str, rating: i32) -> review::Model {
        review::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            rating,
            comment: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> ReviewService {
        ReviewService::new(
            ReviewRepository::new(db.clone()),
            CourseRepository::new(db.clone()),
            EnrollmentRepository::new(db.clone()),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_create_requires_enrollment() {
        let course = create_test_course("c1", "u1", CourseStatus::Published);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0)),
                }]])
                .into_connection(),
        );
        let service = create_test_service(db);
        let learner = create_test_user("u2", UserRole::Student);

        let result = service
            .create(
                &learner,
                "c1",
                CreateReviewInput {
                    rating: 5,
                    comment: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_second_review() {
        let course = create_test_course("c1", "u1", CourseStatus::Published);
        let existing = create_test_review("r1", "u2", "c1", 4);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]])
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = create_test_service(db);
        let learner = create_test_user("u2", UserRole::Student);

        let result = service
            .create(
                &learner,
                "c1",
                CreateReviewInput {
                    rating: 5,
                    comment: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_validates_rating_bounds() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);
        let learner = create_test_user("u2", UserRole::Student);

        let result = service
            .create(
                &learner,
                "c1",
                CreateReviewInput {
                    rating: 6,
                    comment: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_persists_review() {
        let course = create_test_course("c1", "u1", CourseStatus::Published);
        let created = create_test_review("r1", "u2", "c1", 5);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]])
                .append_query_results([Vec::<review::Model>::new()])
                .append_query_results([[created]])
                .into_connection(),
        );
        let service = create_test_service(db);
        let learner = create_test_user("u2", UserRole::Student);

        let review = service
            .create(
                &learner,
                "c1",
                CreateReviewInput {
                    rating: 5,
                    comment: Some("Great course".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(review.rating, 5);
    }

    #[tokio::test]
    async fn test_list_computes_average_and_joins_authors() {
        let course = create_test_course("c1", "u1", CourseStatus::Published);
        let r1 = create_test_review("r1", "u2", "c1", 5);
        let r2 = create_test_review("r2", "u3", "c1", 4);
        let u2 = create_test_user("u2", UserRole::Student);
        let u3 = create_test_user("u3", UserRole::Student);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course]])
                .append_query_results([[r1, r2]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2)),
                }]])
                .append_query_results([[btreemap! {
                    "total" => sea_orm::Value::BigInt(Some(9)),
                }]])
                .append_query_results([[u2, u3]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let page = service.list_for_course(None, "c1", 1, 10).await.unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.average_rating, 4.5);
        assert_eq!(page.reviews.len(), 2);
        assert_eq!(page.reviews[0].author_name, "Test User");
    }

    #[tokio::test]
    async fn test_list_hides_draft_course() {
        let course = create_test_course("c1", "u1", CourseStatus::Draft);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let result = service.list_for_course(None, "c1", 1, 10).await;
        assert!(matches!(result, Err(AppError::CourseNotFound(_))));
    }
}
