//! Course review endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use opencourse_common::AppResult;
use opencourse_core::{CreateReviewInput, ReviewPage, ReviewWithAuthor};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Review response, with the author's public profile fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<ReviewWithAuthor> for ReviewResponse {
    fn from(entry: ReviewWithAuthor) -> Self {
        Self {
            id: entry.review.id,
            user_id: entry.review.user_id,
            course_id: entry.review.course_id,
            rating: entry.review.rating,
            comment: entry.review.comment,
            author_name: entry.author_name,
            author_avatar_url: entry.author_avatar_url,
            created_at: entry.review.created_at.to_rfc3339(),
            updated_at: entry.review.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Paginated review listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPageResponse {
    pub reviews: Vec<ReviewResponse>,
    pub total: u64,
    pub average_rating: f64,
}

impl From<ReviewPage> for ReviewPageResponse {
    fn from(page: ReviewPage) -> Self {
        Self {
            reviews: page.reviews.into_iter().map(Into::into).collect(),
            total: page.total,
            average_rating: page.average_rating,
        }
    }
}

/// Review listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// List the reviews of a course, newest first.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<ReviewsQuery>,
) -> AppResult<ApiResponse<ReviewPageResponse>> {
    let page = state
        .review_service
        .list_for_course(viewer.as_ref(), &course_id, query.page, query.limit)
        .await?;

    Ok(ApiResponse::ok(page.into()))
}

/// Leave a review on an enrolled course.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(input): Json<CreateReviewInput>,
) -> AppResult<ApiResponse<ReviewResponse>> {
    let review = state.review_service.create(&user, &course_id, input).await?;

    // The caller is the author.
    Ok(ApiResponse::ok(ReviewResponse {
        id: review.id,
        user_id: review.user_id,
        course_id: review.course_id,
        rating: review.rating,
        comment: review.comment,
        author_name: user.name,
        author_avatar_url: user.avatar_url,
        created_at: review.created_at.to_rfc3339(),
        updated_at: review.updated_at.map(|dt| dt.to_rfc3339()),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/courses/{id}/reviews", get(list).post(create))
}
