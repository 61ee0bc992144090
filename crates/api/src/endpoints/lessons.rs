//! Lesson and lesson progress endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use opencourse_common::AppResult;
use opencourse_core::{CreateLessonInput, LessonWithAttachments, UpdateLessonInput};
use opencourse_db::entities::{attachment, lesson, lesson_progress};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

use super::user::CertificateResponse;

/// Lesson response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonResponse {
    pub id: String,
    pub chapter_id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub position: i32,
    pub is_published: bool,
    pub is_free: bool,
    pub duration: Option<i32>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<lesson::Model> for LessonResponse {
    fn from(lesson: lesson::Model) -> Self {
        Self {
            id: lesson.id,
            chapter_id: lesson.chapter_id,
            title: lesson.title,
            description: lesson.description,
            video_url: lesson.video_url,
            position: lesson.position,
            is_published: lesson.is_published,
            is_free: lesson.is_free,
            duration: lesson.duration,
            created_at: lesson.created_at.to_rfc3339(),
            updated_at: lesson.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Attachment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: String,
    pub lesson_id: String,
    pub name: String,
    pub url: String,
    pub created_at: String,
}

impl From<attachment::Model> for AttachmentResponse {
    fn from(attachment: attachment::Model) -> Self {
        Self {
            id: attachment.id,
            lesson_id: attachment.lesson_id,
            name: attachment.name,
            url: attachment.url,
            created_at: attachment.created_at.to_rfc3339(),
        }
    }
}

/// A lesson with its attachments.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDetailResponse {
    #[serde(flatten)]
    pub lesson: LessonResponse,
    pub attachments: Vec<AttachmentResponse>,
}

impl From<LessonWithAttachments> for LessonDetailResponse {
    fn from(detail: LessonWithAttachments) -> Self {
        Self {
            lesson: detail.lesson.into(),
            attachments: detail.attachments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lesson progress response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressResponse {
    pub id: String,
    pub user_id: String,
    pub lesson_id: String,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<lesson_progress::Model> for LessonProgressResponse {
    fn from(progress: lesson_progress::Model) -> Self {
        Self {
            id: progress.id,
            user_id: progress.user_id,
            lesson_id: progress.lesson_id,
            is_completed: progress.is_completed,
            created_at: progress.created_at.to_rfc3339(),
            updated_at: progress.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Progress update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    #[serde(default)]
    pub is_completed: bool,
}

/// Progress update response.
///
/// `certificate` is set when this update completed the whole course.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub progress: LessonProgressResponse,
    pub certificate: Option<CertificateResponse>,
}

/// List the lessons of a chapter, in position order.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
) -> AppResult<ApiResponse<Vec<LessonDetailResponse>>> {
    let lessons = state
        .lesson_service
        .list(viewer.as_ref(), &chapter_id)
        .await?;

    Ok(ApiResponse::ok(lessons.into_iter().map(Into::into).collect()))
}

/// Get a single lesson with its attachments.
async fn detail(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> AppResult<ApiResponse<LessonDetailResponse>> {
    let lesson = state.lesson_service.get(viewer.as_ref(), &lesson_id).await?;
    Ok(ApiResponse::ok(lesson.into()))
}

/// Append a new lesson to a chapter.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
    Json(input): Json<CreateLessonInput>,
) -> AppResult<ApiResponse<LessonDetailResponse>> {
    let lesson = state.lesson_service.create(&user, &chapter_id, input).await?;
    Ok(ApiResponse::ok(lesson.into()))
}

/// Partially update a lesson.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
    Json(input): Json<UpdateLessonInput>,
) -> AppResult<ApiResponse<LessonDetailResponse>> {
    let lesson = state.lesson_service.update(&user, &lesson_id, input).await?;
    Ok(ApiResponse::ok(lesson.into()))
}

/// Delete a lesson and its attachments.
async fn delete_lesson(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.lesson_service.delete(&user, &lesson_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Record the caller's progress on a lesson.
async fn set_progress(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
    Json(req): Json<ProgressRequest>,
) -> AppResult<ApiResponse<ProgressResponse>> {
    let update = state
        .progress_service
        .set_lesson_progress(&user, &lesson_id, req.is_completed)
        .await?;

    Ok(ApiResponse::ok(ProgressResponse {
        progress: update.progress.into(),
        certificate: update.certificate.map(Into::into),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chapters/{id}/lessons", get(list).post(create))
        .route(
            "/lessons/{id}",
            get(detail).put(update).delete(delete_lesson),
        )
        .route("/lessons/{id}/progress", put(set_progress))
}
