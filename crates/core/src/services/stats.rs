//! Dashboard statistics service.

use opencourse_common::AppResult;
use opencourse_db::{
    entities::{course::CourseStatus, user},
    repositories::{
        CertificateRepository, CourseRepository, EnrollmentRepository, LessonProgressRepository,
        LessonRepository, ReviewRepository, UserRepository,
    },
};

use super::certificate::CertificateService;
use super::course::round_rating;

/// Default lesson length in minutes when the instructor left it unset.
const DEFAULT_LESSON_MINUTES: i64 = 10;

/// Stats service for the learner, instructor and admin dashboards.
#[derive(Clone)]
pub struct StatsService {
    user_repo: UserRepository,
    course_repo: CourseRepository,
    enrollment_repo: EnrollmentRepository,
    certificate_repo: CertificateRepository,
    review_repo: ReviewRepository,
    lesson_repo: LessonRepository,
    progress_repo: LessonProgressRepository,
    certificates: CertificateService,
}

/// Learner dashboard numbers.
#[derive(Debug, Clone)]
pub struct UserStats {
    pub total_enrollments: u64,
    pub total_certificates: u64,
    pub completed_courses: u64,
    pub total_learning_hours: i64,
}

/// Instructor dashboard numbers, aggregated over the instructor's courses.
#[derive(Debug, Clone)]
pub struct InstructorStats {
    pub total_courses: u64,
    pub published_courses: u64,
    pub total_students: u64,
    pub total_revenue: f64,
    pub average_rating: f64,
    pub completion_rate: u32,
}

/// Platform-wide totals for the admin dashboard.
#[derive(Debug, Clone)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_courses: u64,
    pub published_courses: u64,
    pub total_enrollments: u64,
    pub total_certificates: u64,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        user_repo: UserRepository,
        course_repo: CourseRepository,
        enrollment_repo: EnrollmentRepository,
        certificate_repo: CertificateRepository,
        review_repo: ReviewRepository,
        lesson_repo: LessonRepository,
        progress_repo: LessonProgressRepository,
        certificates: CertificateService,
    ) -> Self {
        Self {
            user_repo,
            course_repo,
            enrollment_repo,
            certificate_repo,
            review_repo,
            lesson_repo,
            progress_repo,
            certificates,
        }
    }

    /// Learner dashboard numbers for a user.
    ///
    /// Completed courses are counted by re-evaluating completion over the
    /// user's enrollments, so courses without eligible lessons never count.
    /// Learning hours sum the durations of completed lessons, falling back
    /// to ten minutes per lesson, rounded to the nearest hour.
    pub async fn user_stats(&self, user_id: &str) -> AppResult<UserStats> {
        let total_enrollments = self.enrollment_repo.count_by_user(user_id).await?;
        let total_certificates = self.certificate_repo.count_by_user(user_id).await?;

        let mut completed_courses = 0;
        for course_id in self.enrollment_repo.find_course_ids_by_user(user_id).await? {
            if self.certificates.is_course_complete(user_id, &course_id).await? {
                completed_courses += 1;
            }
        }

        let completed_ids = self
            .progress_repo
            .find_completed_lesson_ids_by_user(user_id)
            .await?;
        let minutes: i64 = self
            .lesson_repo
            .find_by_ids(&completed_ids)
            .await?
            .iter()
            .map(|l| l.duration.map_or(DEFAULT_LESSON_MINUTES, i64::from))
            .sum();

        Ok(UserStats {
            total_enrollments,
            total_certificates,
            completed_courses,
            total_learning_hours: (minutes + 30) / 60,
        })
    }

    /// Instructor dashboard numbers over the instructor's own courses.
    pub async fn instructor_stats(&self, user: &user::Model) -> AppResult<InstructorStats> {
        let courses = self.course_repo.find_all_by_owner(&user.id).await?;

        let total_courses = courses.len() as u64;
        let published_courses = courses
            .iter()
            .filter(|c| c.status.is_published())
            .count() as u64;

        let mut total_students: u64 = 0;
        let mut total_revenue = 0.0;
        let mut rating_sum: i64 = 0;
        let mut review_count: u64 = 0;
        let mut possible_completions: u64 = 0;
        let mut completed_marks: u64 = 0;

        for course in &courses {
            let students = self.enrollment_repo.count_by_course(&course.id).await?;
            total_students += students;
            total_revenue += students as f64 * course.price.unwrap_or_default();

            rating_sum += self.review_repo.rating_sum_by_course(&course.id).await?;
            review_count += self.review_repo.count_by_course(&course.id).await?;

            let eligible = self.lesson_repo.find_eligible_by_course(&course.id).await?;
            let lesson_ids: Vec<String> = eligible.iter().map(|l| l.id.clone()).collect();
            let user_ids = self.enrollment_repo.find_user_ids_by_course(&course.id).await?;

            possible_completions += user_ids.len() as u64 * lesson_ids.len() as u64;
            completed_marks += self
                .progress_repo
                .count_completed_by_users_in(&user_ids, &lesson_ids)
                .await?;
        }

        let completion_rate = if possible_completions == 0 {
            0
        } else {
            ((completed_marks as f64 / possible_completions as f64) * 100.0).round() as u32
        };

        Ok(InstructorStats {
            total_courses,
            published_courses,
            total_students,
            total_revenue,
            average_rating: round_rating(rating_sum, review_count),
            completion_rate,
        })
    }

    /// Platform-wide totals.
    pub async fn admin_stats(&self) -> AppResult<AdminStats> {
        Ok(AdminStats {
            total_users: self.user_repo.count().await?,
            total_courses: self.course_repo.count().await?,
            published_courses: self
                .course_repo
                .count_by_status(CourseStatus::Published)
                .await?,
            total_enrollments: self.enrollment_repo.count().await?,
            total_certificates: self.certificate_repo.count().await?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use opencourse_db::entities::course::{self, CourseLevel};
    use opencourse_db::entities::user::UserRole;
    use opencourse_db::entities::{enrollment, lesson, lesson_progress};
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

    fn create_test_course(
        id: &str,
        owner_id: &str,
        status: CourseStatus,
        price: Option<f64>,
    ) -> course::Model {
        course::Model {
            id: id.to_string(),
            user_id: owner_id.to_string(),
            title: "Rust Basics".to_string(),
            description: "Learn Rust from scratch".to_string(),
            small_description: "Rust from zero".to_string(),
            slug: "rust-basics".to_string(),
            image_url: Some("https://example.com/cover.png".to_string()),
            price,
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

    fn create_test_lesson(id: &str, chapter_id: &str, duration: Option<i32>) -> lesson::Model {
        lesson::Model {
            id: id.to_string(),
            chapter_id: chapter_id.to_string(),
            title: "Lesson".to_string(),
            description: None,
            video_url: None,
            position: 0,
            is_published: true,
            is_free: false,
            duration,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> StatsService {
        let certificates = CertificateService::new(
            CertificateRepository::new(db.clone()),
            CourseRepository::new(db.clone()),
            LessonRepository::new(db.clone()),
            LessonProgressRepository::new(db.clone()),
        );
        StatsService::new(
            UserRepository::new(db.clone()),
            CourseRepository::new(db.clone()),
            EnrollmentRepository::new(db.clone()),
            CertificateRepository::new(db.clone()),
            ReviewRepository::new(db.clone()),
            LessonRepository::new(db.clone()),
            LessonProgressRepository::new(db),
            certificates,
        )
    }

    #[tokio::test]
    async fn test_user_stats_counts_completed_courses_and_hours() {
        let l1 = create_test_lesson("l1", "ch1", Some(50));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2)),
                }]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]])
                .append_query_results([[btreemap! {
                    "course_id" => sea_orm::Value::String(Some(Box::new("c1".to_string()))),
                }]])
                .append_query_results([[btreemap! {
                    "id" => sea_orm::Value::String(Some(Box::new("ch1".to_string()))),
                }]])
                .append_query_results([[l1.clone()]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]])
                .append_query_results([[btreemap! {
                    "lesson_id" => sea_orm::Value::String(Some(Box::new("l1".to_string()))),
                }]])
                .append_query_results([[l1]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let stats = service.user_stats("u1").await.unwrap();

        assert_eq!(stats.total_enrollments, 2);
        assert_eq!(stats.total_certificates, 1);
        assert_eq!(stats.completed_courses, 1);
        assert_eq!(stats.total_learning_hours, 1);
    }

    #[tokio::test]
    async fn test_user_stats_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0)),
                }]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0)),
                }]])
                .append_query_results([Vec::<enrollment::Model>::new()])
                .append_query_results([Vec::<lesson_progress::Model>::new()])
                .into_connection(),
        );
        let service = create_test_service(db);

        let stats = service.user_stats("u1").await.unwrap();

        assert_eq!(stats.total_enrollments, 0);
        assert_eq!(stats.completed_courses, 0);
        assert_eq!(stats.total_learning_hours, 0);
    }

    #[tokio::test]
    async fn test_instructor_stats_aggregates() {
        let course = create_test_course("c1", "u1", CourseStatus::Published, Some(10.0));
        let l1 = create_test_lesson("l1", "ch1", Some(15));
        let l2 = create_test_lesson("l2", "ch1", Some(15));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4)),
                }]])
                .append_query_results([[btreemap! {
                    "total" => sea_orm::Value::BigInt(Some(9)),
                }]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2)),
                }]])
                .append_query_results([[btreemap! {
                    "id" => sea_orm::Value::String(Some(Box::new("ch1".to_string()))),
                }]])
                .append_query_results([[l1, l2]])
                .append_query_results([[
                    btreemap! {
                        "user_id" => sea_orm::Value::String(Some(Box::new("u2".to_string()))),
                    },
                    btreemap! {
                        "user_id" => sea_orm::Value::String(Some(Box::new("u3".to_string()))),
                    },
                ]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3)),
                }]])
                .into_connection(),
        );
        let service = create_test_service(db);
        let instructor = create_test_user("u1", UserRole::Instructor);

        let stats = service.instructor_stats(&instructor).await.unwrap();

        assert_eq!(stats.total_courses, 1);
        assert_eq!(stats.published_courses, 1);
        assert_eq!(stats.total_students, 4);
        assert_eq!(stats.total_revenue, 40.0);
        assert_eq!(stats.average_rating, 4.5);
        assert_eq!(stats.completion_rate, 75);
    }

    #[tokio::test]
    async fn test_instructor_stats_without_courses() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<course::Model>::new()])
                .into_connection(),
        );
        let service = create_test_service(db);
        let instructor = create_test_user("u1", UserRole::Instructor);

        let stats = service.instructor_stats(&instructor).await.unwrap();

        assert_eq!(stats.total_courses, 0);
        assert_eq!(stats.total_revenue, 0.0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.completion_rate, 0);
    }

    #[tokio::test]
    async fn test_admin_stats_totals() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(10)),
                }]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(5)),
                }]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3)),
                }]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(20)),
                }]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7)),
                }]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let stats = service.admin_stats().await.unwrap();

        assert_eq!(stats.total_users, 10);
        assert_eq!(stats.total_courses, 5);
        assert_eq!(stats.published_courses, 3);
        assert_eq!(stats.total_enrollments, 20);
        assert_eq!(stats.total_certificates, 7);
    }
}
