//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use opencourse_common::AppResult;
use opencourse_core::{LoginInput, RegisterInput};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

use super::user::UserResponse;

/// Login response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Create a new user account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.register(input).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Sign in with email and password, minting a session token.
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let user = state.user_service.login(input).await?;

    Ok(ApiResponse::ok(LoginResponse {
        token: user.token.clone().unwrap_or_default(),
        user: user.into(),
    }))
}

/// Sign out by invalidating the current token.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.logout(&user.id).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}
