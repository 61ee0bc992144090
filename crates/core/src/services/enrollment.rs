//! Enrollment service.

use std::collections::HashMap;

use opencourse_common::{AppError, AppResult, IdGenerator};
use opencourse_db::{
    entities::{course, enrollment, user},
    repositories::{CourseRepository, EnrollmentRepository},
};
use sea_orm::Set;

use super::policy;
use super::progress::ProgressService;

/// Enrollment service for joining and leaving courses.
#[derive(Clone)]
pub struct EnrollmentService {
    enrollment_repo: EnrollmentRepository,
    course_repo: CourseRepository,
    progress: ProgressService,
    id_gen: IdGenerator,
}

/// An enrollment joined with its course and the user's completion state.
#[derive(Debug, Clone)]
pub struct EnrolledCourse {
    pub enrollment: enrollment::Model,
    pub course: course::Model,
    pub completion_percentage: u32,
}

impl EnrollmentService {
    /// Create a new enrollment service.
    #[must_use]
    pub const fn new(
        enrollment_repo: EnrollmentRepository,
        course_repo: CourseRepository,
        progress: ProgressService,
    ) -> Self {
        Self {
            enrollment_repo,
            course_repo,
            progress,
            id_gen: IdGenerator::new(),
        }
    }

    /// Enroll a user in a course.
    ///
    /// Paid courses require `payment_completed`; the rejection carries the
    /// course facts so the caller can start a checkout flow. The unique
    /// (user, course) index collapses concurrent duplicate enrolls, the
    /// losing insert surfacing as Conflict.
    pub async fn enroll(
        &self,
        user: &user::Model,
        course_id: &str,
        payment_completed: bool,
    ) -> AppResult<enrollment::Model> {
        let course = self.course_repo.get_by_id(course_id).await?;
        let already_enrolled = self.enrollment_repo.is_enrolled(&user.id, &course.id).await?;

        if !policy::can_enroll_in_course(user, &course, already_enrolled) {
            if user.id == course.user_id {
                return Err(AppError::Forbidden(
                    "You cannot enroll in your own course".to_string(),
                ));
            }
            if !course.status.is_published() {
                return Err(AppError::InvalidState(
                    "Course is not open for enrollment".to_string(),
                ));
            }
            return Err(AppError::Conflict(
                "Already enrolled in this course".to_string(),
            ));
        }

        if course.is_paid() && !payment_completed {
            return Err(AppError::PaymentRequired {
                course_id: course.id,
                title: course.title,
                price: course.price.unwrap_or_default(),
            });
        }

        let model = enrollment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            course_id: Set(course.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let enrollment = self.enrollment_repo.create(model).await?;
        tracing::info!(user_id = %user.id, course_id = %course.id, "enrolled in course");

        Ok(enrollment)
    }

    /// Remove a user's enrollment. Progress and certificates stay.
    pub async fn unenroll(&self, user: &user::Model, course_id: &str) -> AppResult<()> {
        let removed = self
            .enrollment_repo
            .delete_by_user_and_course(&user.id, course_id)
            .await?;
        if !removed {
            return Err(AppError::EnrollmentNotFound(course_id.to_string()));
        }

        tracing::info!(user_id = %user.id, course_id = %course_id, "unenrolled from course");

        Ok(())
    }

    /// The user's enrollments, newest first, each joined with its course and
    /// completion percentage.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<EnrolledCourse>> {
        let enrollments = self.enrollment_repo.find_by_user(user_id).await?;

        let course_ids: Vec<String> = enrollments.iter().map(|e| e.course_id.clone()).collect();
        let courses: HashMap<String, course::Model> = self
            .course_repo
            .find_by_ids(&course_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        let mut enrolled = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let Some(course) = courses.get(&enrollment.course_id) else {
                continue;
            };
            let completion_percentage = self
                .progress
                .completion_percentage(user_id, &enrollment.course_id)
                .await?;
            enrolled.push(EnrolledCourse {
                enrollment,
                course: course.clone(),
                completion_percentage,
            });
        }

        Ok(enrolled)
    }
}
