//! Learner dashboard and profile endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use opencourse_common::AppResult;
use opencourse_core::{UpdateProfileInput, UserStats};
use opencourse_db::entities::{
    certificate,
    user::{self, UserRole},
};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

use super::{courses::CourseResponse, enrollments::EnrollmentResponse};

/// User profile response.
///
/// Credential fields never leave the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            bio: user.bio,
            avatar_url: user.avatar_url,
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Certificate response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub issued_at: String,
}

impl From<certificate::Model> for CertificateResponse {
    fn from(certificate: certificate::Model) -> Self {
        Self {
            id: certificate.id,
            user_id: certificate.user_id,
            course_id: certificate.course_id,
            issued_at: certificate.issued_at.to_rfc3339(),
        }
    }
}

/// An enrollment joined with its course and completion percentage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseResponse {
    #[serde(flatten)]
    pub enrollment: EnrollmentResponse,
    pub course: CourseResponse,
    pub completion_percentage: u32,
}

/// A certificate joined with its course.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateWithCourseResponse {
    #[serde(flatten)]
    pub certificate: CertificateResponse,
    pub course: CourseResponse,
}

/// Learner dashboard numbers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub total_enrollments: u64,
    pub total_certificates: u64,
    pub completed_courses: u64,
    pub total_learning_hours: i64,
}

impl From<UserStats> for UserStatsResponse {
    fn from(stats: UserStats) -> Self {
        Self {
            total_enrollments: stats.total_enrollments,
            total_certificates: stats.total_certificates,
            completed_courses: stats.completed_courses,
            total_learning_hours: stats.total_learning_hours,
        }
    }
}

/// Get the caller's profile.
async fn profile(AuthUser(user): AuthUser) -> AppResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok(user.into()))
}

/// Update the caller's profile.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.update_profile(&user.id, input).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// List the caller's enrollments with completion percentages.
async fn enrollments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<EnrolledCourseResponse>>> {
    let enrolled = state.enrollment_service.list_for_user(&user.id).await?;

    Ok(ApiResponse::ok(
        enrolled
            .into_iter()
            .map(|entry| EnrolledCourseResponse {
                enrollment: entry.enrollment.into(),
                course: entry.course.into(),
                completion_percentage: entry.completion_percentage,
            })
            .collect(),
    ))
}

/// List the caller's certificates, newest first.
async fn certificates(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CertificateWithCourseResponse>>> {
    let certificates = state.certificate_service.list_for_user(&user.id).await?;

    Ok(ApiResponse::ok(
        certificates
            .into_iter()
            .map(|entry| CertificateWithCourseResponse {
                certificate: entry.certificate.into(),
                course: entry.course.into(),
            })
            .collect(),
    ))
}

/// Get the caller's learning stats.
async fn stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserStatsResponse>> {
    let stats = state.stats_service.user_stats(&user.id).await?;
    Ok(ApiResponse::ok(stats.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/profile", get(profile).put(update_profile))
        .route("/user/enrollments", get(enrollments))
        .route("/user/certificates", get(certificates))
        .route("/user/stats", get(stats))
}
