//! Certificate service.
//!
//! Owns the course completion rule: a course is complete for a user once
//! every published lesson in a published chapter carries a completed mark.

use std::collections::HashMap;

use opencourse_common::{AppResult, IdGenerator};
use opencourse_db::{
    entities::{certificate, course},
    repositories::{
        CertificateRepository, CourseRepository, LessonProgressRepository, LessonRepository,
    },
};

/// Certificate service for completion checks and issuance.
#[derive(Clone)]
pub struct CertificateService {
    certificate_repo: CertificateRepository,
    course_repo: CourseRepository,
    lesson_repo: LessonRepository,
    progress_repo: LessonProgressRepository,
    id_gen: IdGenerator,
}

/// A certificate joined with its course.
#[derive(Debug, Clone)]
pub struct CertificateWithCourse {
    pub certificate: certificate::Model,
    pub course: course::Model,
}

impl CertificateService {
    /// Create a new certificate service.
    #[must_use]
    pub const fn new(
        certificate_repo: CertificateRepository,
        course_repo: CourseRepository,
        lesson_repo: LessonRepository,
        progress_repo: LessonProgressRepository,
    ) -> Self {
        Self {
            certificate_repo,
            course_repo,
            lesson_repo,
            progress_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Whether the user has completed every eligible lesson of the course.
    ///
    /// A course without eligible lessons is never complete.
    pub async fn is_course_complete(&self, user_id: &str, course_id: &str) -> AppResult<bool> {
        let eligible = self.lesson_repo.find_eligible_by_course(course_id).await?;
        if eligible.is_empty() {
            return Ok(false);
        }

        let lesson_ids: Vec<String> = eligible.iter().map(|l| l.id.clone()).collect();
        let completed = self
            .progress_repo
            .count_completed_in(user_id, &lesson_ids)
            .await?;

        Ok(completed == lesson_ids.len() as u64)
    }

    /// Issue a certificate if the course is now complete for the user.
    ///
    /// Idempotent: an already issued certificate is returned as-is, and an
    /// incomplete course yields `None`.
    pub async fn issue_if_complete(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Option<certificate::Model>> {
        if !self.is_course_complete(user_id, course_id).await? {
            return Ok(None);
        }

        if let Some(existing) = self
            .certificate_repo
            .find_by_user_and_course(user_id, course_id)
            .await?
        {
            return Ok(Some(existing));
        }

        let certificate = self
            .certificate_repo
            .create(
                self.id_gen.generate(),
                user_id.to_string(),
                course_id.to_string(),
            )
            .await?;

        tracing::info!(
            user_id = %user_id,
            course_id = %course_id,
            certificate_id = %certificate.id,
            "issued course completion certificate"
        );

        Ok(Some(certificate))
    }

    /// The user's certificates, most recent first, joined with their courses.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<CertificateWithCourse>> {
        let certificates = self.certificate_repo.find_by_user(user_id).await?;

        let course_ids: Vec<String> = certificates.iter().map(|c| c.course_id.clone()).collect();
        let courses: HashMap<String, course::Model> = self
            .course_repo
            .find_by_ids(&course_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        Ok(certificates
            .into_iter()
            .filter_map(|certificate| {
                courses.get(&certificate.course_id).map(|course| CertificateWithCourse {
                    certificate,
                    course: course.clone(),
                })
            })
            .collect())
    }
}
