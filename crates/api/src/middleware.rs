//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use opencourse_core::{
    CertificateService, ChapterService, CourseService, EnrollmentService, LessonService,
    ProgressService, PurchaseService, ReviewService, StatsService, UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub course_service: CourseService,
    pub chapter_service: ChapterService,
    pub lesson_service: LessonService,
    pub enrollment_service: EnrollmentService,
    pub progress_service: ProgressService,
    pub certificate_service: CertificateService,
    pub review_service: ReviewService,
    pub purchase_service: PurchaseService,
    pub stats_service: StatsService,
}

/// Authentication middleware.
///
/// Resolves the bearer token into a user and stashes it in request
/// extensions. Requests without a valid token pass through anonymous;
/// the extractors decide whether that is acceptable per route.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Try to extract token from header
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
            && let Some(token) = auth_str.strip_prefix("Bearer ") {
                // Authenticate user by token
                if let Ok(user) = state.user_service.authenticate_by_token(token).await {
                    req.extensions_mut().insert(user);
                }
            }

    next.run(req).await
}
