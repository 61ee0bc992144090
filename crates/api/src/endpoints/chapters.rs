//! Chapter endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use opencourse_common::AppResult;
use opencourse_core::{CreateChapterInput, UpdateChapterInput};
use opencourse_db::entities::chapter;
use serde::Serialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Chapter response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResponse {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub position: i32,
    pub is_published: bool,
    pub is_free: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<chapter::Model> for ChapterResponse {
    fn from(chapter: chapter::Model) -> Self {
        Self {
            id: chapter.id,
            course_id: chapter.course_id,
            title: chapter.title,
            position: chapter.position,
            is_published: chapter.is_published,
            is_free: chapter.is_free,
            created_at: chapter.created_at.to_rfc3339(),
            updated_at: chapter.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// List the chapters of a course, in position order.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<ApiResponse<Vec<ChapterResponse>>> {
    let chapters = state
        .chapter_service
        .list(viewer.as_ref(), &course_id)
        .await?;

    Ok(ApiResponse::ok(chapters.into_iter().map(Into::into).collect()))
}

/// Append a new chapter to a course.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(input): Json<CreateChapterInput>,
) -> AppResult<ApiResponse<ChapterResponse>> {
    let chapter = state
        .chapter_service
        .create(&user, &course_id, input)
        .await?;

    Ok(ApiResponse::ok(chapter.into()))
}

/// Partially update a chapter.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
    Json(input): Json<UpdateChapterInput>,
) -> AppResult<ApiResponse<ChapterResponse>> {
    let chapter = state
        .chapter_service
        .update(&user, &chapter_id, input)
        .await?;

    Ok(ApiResponse::ok(chapter.into()))
}

/// Delete a chapter and its lessons.
async fn delete_chapter(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.chapter_service.delete(&user, &chapter_id).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses/{id}/chapters", get(list).post(create))
        .route("/chapters/{id}", put(update).delete(delete_chapter))
}
