//! Access policy predicates and authorization guards.
//!
//! The predicates are pure functions over already-loaded rows. They never
//! touch storage and never error; callers resolve existence first and treat
//! a missing entity as `NotFound` rather than an authorization failure.

use opencourse_common::{AppError, AppResult};
use opencourse_db::entities::{
    course,
    user::{self, UserRole},
};

/// Whether `user` may view a course's metadata and preview content.
///
/// Published courses are public. Drafts and archived courses are visible
/// only to their owner and admins.
#[must_use]
pub fn can_access_course(user: Option<&user::Model>, course: &course::Model) -> bool {
    match user {
        Some(u) if u.role.is_admin() || u.id == course.user_id => true,
        _ => course.status.is_published(),
    }
}

/// Whether `user` may modify a course and its chapters and lessons.
#[must_use]
pub fn can_edit_course(user: &user::Model, course: &course::Model) -> bool {
    user.role.is_admin() || (user.role == UserRole::Instructor && user.id == course.user_id)
}

/// Whether `user` may create courses at all.
#[must_use]
pub fn can_create_course(user: &user::Model) -> bool {
    user.role.can_author_courses()
}

/// Whether `user` may enroll in `course`.
///
/// Owners never enroll in their own courses, enrollment is restricted to
/// published courses, and an existing enrollment blocks a second one.
#[must_use]
pub fn can_enroll_in_course(
    user: &user::Model,
    course: &course::Model,
    already_enrolled: bool,
) -> bool {
    if user.id == course.user_id {
        return false;
    }
    if !course.status.is_published() {
        return false;
    }
    !already_enrolled
}

/// Require an authenticated user.
pub fn require_auth(user: Option<user::Model>) -> AppResult<user::Model> {
    user.ok_or(AppError::Unauthorized)
}

/// Require an authenticated user holding one of the allowed roles.
pub fn require_role(user: Option<user::Model>, allowed: &[UserRole]) -> AppResult<user::Model> {
    let user = require_auth(user)?;
    if !allowed.contains(&user.role) {
        return Err(AppError::Forbidden("Insufficient permissions".to_string()));
    }
    Ok(user)
}
