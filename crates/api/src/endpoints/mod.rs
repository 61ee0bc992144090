//! API endpoints.

mod admin;
mod auth;
mod chapters;
mod courses;
mod enrollments;
mod instructor;
mod lessons;
mod reviews;
mod user;

use axum::Router;

use crate::middleware::AppState;

pub use courses::CourseResponse;

/// Create the API router.
///
/// Routes use absolute paths rather than nesting because several
/// resources are reachable under two prefixes (a chapter is created
/// under its course but edited under `/chapters/{id}`).
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(courses::router())
        .merge(chapters::router())
        .merge(lessons::router())
        .merge(enrollments::router())
        .merge(reviews::router())
        .merge(user::router())
        .merge(instructor::router())
        .merge(admin::router())
}
