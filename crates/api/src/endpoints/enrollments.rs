//! Enrollment and purchase endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use opencourse_common::AppResult;
use opencourse_core::CheckoutSession;
use opencourse_db::entities::enrollment;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Enrollment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub created_at: String,
}

impl From<enrollment::Model> for EnrollmentResponse {
    fn from(enrollment: enrollment::Model) -> Self {
        Self {
            id: enrollment.id,
            user_id: enrollment.user_id,
            course_id: enrollment.course_id,
            created_at: enrollment.created_at.to_rfc3339(),
        }
    }
}

/// Enroll request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    /// Whether payment has been confirmed for a paid course.
    #[serde(default)]
    pub payment_completed: bool,
}

/// Checkout session response, keyed like a payment provider session.
#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    pub id: String,
    pub course_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub url: String,
}

impl From<CheckoutSession> for CheckoutSessionResponse {
    fn from(session: CheckoutSession) -> Self {
        Self {
            id: session.id,
            course_id: session.course_id,
            user_id: session.user_id,
            amount: session.amount,
            currency: session.currency,
            status: session.status,
            url: session.url,
        }
    }
}

/// Enroll the caller in a course.
async fn enroll(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(req): Json<EnrollRequest>,
) -> AppResult<ApiResponse<EnrollmentResponse>> {
    let enrollment = state
        .enrollment_service
        .enroll(&user, &course_id, req.payment_completed)
        .await?;

    Ok(ApiResponse::ok(enrollment.into()))
}

/// Remove the caller's enrollment.
async fn unenroll(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.enrollment_service.unenroll(&user, &course_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Start a mock checkout session for a paid course.
async fn purchase(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<ApiResponse<CheckoutSessionResponse>> {
    let session = state
        .purchase_service
        .create_checkout_session(&user, &course_id)
        .await?;

    Ok(ApiResponse::ok(session.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses/{id}/enroll", post(enroll).delete(unenroll))
        .route("/courses/{id}/purchase", post(purchase))
}
