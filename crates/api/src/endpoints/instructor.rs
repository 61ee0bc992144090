//! Instructor dashboard endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use opencourse_common::AppResult;
use opencourse_core::InstructorStats;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

use super::courses::CoursePageResponse;

/// Instructor dashboard numbers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorStatsResponse {
    pub total_courses: u64,
    pub published_courses: u64,
    pub total_students: u64,
    pub total_revenue: f64,
    pub average_rating: f64,
    pub completion_rate: u32,
}

impl From<InstructorStats> for InstructorStatsResponse {
    fn from(stats: InstructorStats) -> Self {
        Self {
            total_courses: stats.total_courses,
            published_courses: stats.published_courses,
            total_students: stats.total_students,
            total_revenue: stats.total_revenue,
            average_rating: stats.average_rating,
            completion_rate: stats.completion_rate,
        }
    }
}

/// Instructor course listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorCoursesQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    20
}

/// List the caller's own courses, most recently updated first.
async fn courses(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<InstructorCoursesQuery>,
) -> AppResult<ApiResponse<CoursePageResponse>> {
    let page = state
        .course_service
        .list_for_instructor(&user, query.page, query.limit)
        .await?;

    Ok(ApiResponse::ok(page.into()))
}

/// Get the caller's instructor dashboard stats.
async fn stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<InstructorStatsResponse>> {
    let stats = state.stats_service.instructor_stats(&user).await?;
    Ok(ApiResponse::ok(stats.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/instructor/courses", get(courses))
        .route("/instructor/stats", get(stats))
}
