//! Admin dashboard endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use opencourse_common::{AppError, AppResult};
use opencourse_core::AdminStats;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

use super::courses::CoursePageResponse;

/// Platform-wide totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub total_users: u64,
    pub total_courses: u64,
    pub published_courses: u64,
    pub total_enrollments: u64,
    pub total_certificates: u64,
}

impl From<AdminStats> for AdminStatsResponse {
    fn from(stats: AdminStats) -> Self {
        Self {
            total_users: stats.total_users,
            total_courses: stats.total_courses,
            published_courses: stats.published_courses,
            total_enrollments: stats.total_enrollments,
            total_certificates: stats.total_certificates,
        }
    }
}

/// Admin course listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCoursesQuery {
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

/// Get platform totals (admin only).
async fn stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AdminStatsResponse>> {
    if !user.role.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can view platform stats".to_string(),
        ));
    }

    let stats = state.stats_service.admin_stats().await?;
    Ok(ApiResponse::ok(stats.into()))
}

/// List all courses regardless of status (admin only).
async fn courses(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AdminCoursesQuery>,
) -> AppResult<ApiResponse<CoursePageResponse>> {
    if !user.role.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can list all courses".to_string(),
        ));
    }

    let page = state
        .course_service
        .list_all(query.page, query.limit)
        .await?;

    Ok(ApiResponse::ok(page.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/courses", get(courses))
}
