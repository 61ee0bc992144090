//! Lesson progress service.

use opencourse_common::{AppError, AppResult, IdGenerator};
use opencourse_db::{
    entities::{certificate, lesson_progress, user},
    repositories::{
        ChapterRepository, CourseRepository, EnrollmentRepository, LessonProgressRepository,
        LessonRepository,
    },
};

use super::certificate::CertificateService;

/// Progress service for recording lesson completion.
#[derive(Clone)]
pub struct ProgressService {
    progress_repo: LessonProgressRepository,
    lesson_repo: LessonRepository,
    chapter_repo: ChapterRepository,
    course_repo: CourseRepository,
    enrollment_repo: EnrollmentRepository,
    certificates: CertificateService,
    id_gen: IdGenerator,
}

/// Result of a progress write: the stored row, plus a certificate when the
/// write completed the course.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub progress: lesson_progress::Model,
    pub certificate: Option<certificate::Model>,
}

impl ProgressService {
    /// Create a new progress service.
    #[must_use]
    pub const fn new(
        progress_repo: LessonProgressRepository,
        lesson_repo: LessonRepository,
        chapter_repo: ChapterRepository,
        course_repo: CourseRepository,
        enrollment_repo: EnrollmentRepository,
        certificates: CertificateService,
    ) -> Self {
        Self {
            progress_repo,
            lesson_repo,
            chapter_repo,
            course_repo,
            enrollment_repo,
            certificates,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record a user's progress on a lesson, then check the owning course
    /// for completion.
    ///
    /// Requires an enrollment unless the user owns the course or is an
    /// admin; free lessons do not bypass this. The upsert lands before the
    /// completion check runs, so a failed issuance leaves the progress in
    /// place and a retry re-attempts issuance safely.
    pub async fn set_lesson_progress(
        &self,
        user: &user::Model,
        lesson_id: &str,
        is_completed: bool,
    ) -> AppResult<ProgressUpdate> {
        let lesson = self.lesson_repo.get_by_id(lesson_id).await?;
        let chapter = self.chapter_repo.get_by_id(&lesson.chapter_id).await?;
        let course = self.course_repo.get_by_id(&chapter.course_id).await?;

        let can_track = user.role.is_admin()
            || user.id == course.user_id
            || self.enrollment_repo.is_enrolled(&user.id, &course.id).await?;
        if !can_track {
            return Err(AppError::Forbidden(
                "Enroll in the course to track progress".to_string(),
            ));
        }

        let progress = self
            .progress_repo
            .upsert(
                self.id_gen.generate(),
                user.id.clone(),
                lesson.id.clone(),
                is_completed,
            )
            .await?;

        let certificate = if is_completed {
            self.certificates.issue_if_complete(&user.id, &course.id).await?
        } else {
            None
        };

        tracing::info!(
            user_id = %user.id,
            lesson_id = %lesson.id,
            is_completed,
            "updated lesson progress"
        );

        Ok(ProgressUpdate { progress, certificate })
    }

    /// Percentage of the course's eligible lessons the user has completed,
    /// rounded to the nearest integer. Courses without eligible lessons sit
    /// at 0.
    pub async fn completion_percentage(&self, user_id: &str, course_id: &str) -> AppResult<u32> {
        let eligible = self.lesson_repo.find_eligible_by_course(course_id).await?;
        if eligible.is_empty() {
            return Ok(0);
        }

        let lesson_ids: Vec<String> = eligible.iter().map(|l| l.id.clone()).collect();
        let completed = self
            .progress_repo
            .count_completed_in(user_id, &lesson_ids)
            .await?;

        Ok(((completed as f64 / lesson_ids.len() as f64) * 100.0).round() as u32)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use opencourse_db::entities::chapter;
    use opencourse_db::entities::course::{self, CourseLevel, CourseStatus};
    use opencourse_db::entities::lesson;
    use opencourse_db::entities::user::UserRole;
    use opencourse_db::repositories::CertificateRepository;
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

    fn create_test_course(id: &str, owner_id: &str) -> course::Model {
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
            status: CourseStatus::Published,
            requirements: serde_json::json!([]),
            what_you_will_learn: serde_json::json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_chapter(id: &str, course_id: &str) -> chapter::Model {
        chapter::Model {
            id: id.to_string(),
            course_id: course_id.to_string(),
            title: "Chapter".to_string(),
            position: 0,
            is_published: true,
            is_free: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_lesson(id: &str, chapter_id: &str) -> lesson::Model {
        lesson::Model {
            id: id.to_string(),
            chapter_id: chapter_id.to_string(),
            title: "Lesson".to_string(),
            description: None,
            video_url: None,
            position: 0,
            is_published: true,
            is_free: false,
            duration: Some(15),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_progress(id: &str, user_id: &str, lesson_id: &str) -> lesson_progress::Model {
        lesson_progress::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            lesson_id: lesson_id.to_string(),
            is_completed: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_certificate(id: &str, user_id: &str, course_id: &str) -> certificate::Model {
        certificate::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            issued_at: Utc::now().into(),
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> ProgressService {
        let certificates = CertificateService::new(
            CertificateRepository::new(db.clone()),
            CourseRepository::new(db.clone()),
            LessonRepository::new(db.clone()),
            LessonProgressRepository::new(db.clone()),
        );
        ProgressService::new(
            LessonProgressRepository::new(db.clone()),
            LessonRepository::new(db.clone()),
            ChapterRepository::new(db.clone()),
            CourseRepository::new(db.clone()),
            EnrollmentRepository::new(db),
            certificates,
        )
    }

    #[tokio::test]
    async fn test_progress_requires_enrollment() {
        let lesson = create_test_lesson("l1", "ch1");
        let chapter = create_test_chapter("ch1", "c1");
        let course = create_test_course("c1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[lesson]])
                .append_query_results([[chapter]])
                .append_query_results([[course]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0)),
                }]])
                .into_connection(),
        );
        let service = create_test_service(db);
        let learner = create_test_user("u2", UserRole::Student);

        let result = service.set_lesson_progress(&learner, "l1", true).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_owner_tracks_progress_without_enrollment() {
        let lesson = create_test_lesson("l1", "ch1");
        let chapter = create_test_chapter("ch1", "c1");
        let course = create_test_course("c1", "u1");
        let progress = create_test_progress("p1", "u1", "l1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[lesson]])
                .append_query_results([[chapter]])
                .append_query_results([[course]])
                .append_query_results([[progress]])
                .into_connection(),
        );
        let service = create_test_service(db);
        let owner = create_test_user("u1", UserRole::Instructor);

        let update = service
            .set_lesson_progress(&owner, "l1", false)
            .await
            .unwrap();

        assert_eq!(update.progress.id, "p1");
        assert!(update.certificate.is_none());
    }

    #[tokio::test]
    async fn test_completing_last_lesson_issues_certificate() {
        let lesson = create_test_lesson("l2", "ch1");
        let chapter = create_test_chapter("ch1", "c1");
        let course = create_test_course("c1", "u1");
        let progress = create_test_progress("p2", "u2", "l2");
        let certificate = create_test_certificate("cert1", "u2", "c1");
        let l1 = create_test_lesson("l1", "ch1");
        let l2 = create_test_lesson("l2", "ch1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[lesson]])
                .append_query_results([[chapter]])
                .append_query_results([[course]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]])
                .append_query_results([[progress]])
                .append_query_results([[btreemap! {
                    "id" => sea_orm::Value::String(Some(Box::new("ch1".to_string()))),
                }]])
                .append_query_results([[l1, l2]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2)),
                }]])
                .append_query_results([Vec::<certificate::Model>::new()])
                .append_query_results([[certificate]])
                .into_connection(),
        );
        let service = create_test_service(db);
        let learner = create_test_user("u2", UserRole::Student);

        let update = service
            .set_lesson_progress(&learner, "l2", true)
            .await
            .unwrap();

        assert!(update.progress.is_completed);
        assert_eq!(update.certificate.unwrap().id, "cert1");
    }

    #[tokio::test]
    async fn test_partial_completion_earns_no_certificate() {
        let lesson = create_test_lesson("l1", "ch1");
        let chapter = create_test_chapter("ch1", "c1");
        let course = create_test_course("c1", "u1");
        let progress = create_test_progress("p1", "u2", "l1");
        let l1 = create_test_lesson("l1", "ch1");
        let l2 = create_test_lesson("l2", "ch1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[lesson]])
                .append_query_results([[chapter]])
                .append_query_results([[course]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]])
                .append_query_results([[progress]])
                .append_query_results([[btreemap! {
                    "id" => sea_orm::Value::String(Some(Box::new("ch1".to_string()))),
                }]])
                .append_query_results([[l1, l2]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]])
                .into_connection(),
        );
        let service = create_test_service(db);
        let learner = create_test_user("u2", UserRole::Student);

        let update = service
            .set_lesson_progress(&learner, "l1", true)
            .await
            .unwrap();

        assert!(update.certificate.is_none());
    }

    #[tokio::test]
    async fn test_missing_lesson_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<lesson::Model>::new()])
                .into_connection(),
        );
        let service = create_test_service(db);
        let learner = create_test_user("u2", UserRole::Student);

        let result = service.set_lesson_progress(&learner, "missing", true).await;
        assert!(matches!(result, Err(AppError::LessonNotFound(_))));
    }

    #[tokio::test]
    async fn test_completion_percentage_rounds() {
        let l1 = create_test_lesson("l1", "ch1");
        let l2 = create_test_lesson("l2", "ch1");
        let l3 = create_test_lesson("l3", "ch1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "id" => sea_orm::Value::String(Some(Box::new("ch1".to_string()))),
                }]])
                .append_query_results([[l1, l2, l3]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2)),
                }]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let percentage = service.completion_percentage("u1", "c1").await.unwrap();
        assert_eq!(percentage, 67);
    }

    #[tokio::test]
    async fn test_completion_percentage_empty_course_is_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<chapter::Model>::new()])
                .into_connection(),
        );
        let service = create_test_service(db);

        let percentage = service.completion_percentage("u1", "c1").await.unwrap();
        assert_eq!(percentage, 0);
    }
}
