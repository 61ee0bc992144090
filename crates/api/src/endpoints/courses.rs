//! Course catalog and authoring endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use opencourse_common::AppResult;
use opencourse_core::{
    ChapterContent, CourseDetail, CoursePage, CourseSummary, CreateCourseInput, UpdateCourseInput,
};
use opencourse_db::{
    entities::{
        course::{self, CourseLevel, CourseStatus},
        user,
    },
    repositories::{CourseFilter, CourseSort, PriceRange},
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

use super::{chapters::ChapterResponse, lessons::LessonResponse, reviews::ReviewResponse};

/// Course response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub small_description: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub duration: i32,
    pub level: CourseLevel,
    pub category: String,
    pub status: CourseStatus,
    pub requirements: serde_json::Value,
    pub what_you_will_learn: serde_json::Value,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<course::Model> for CourseResponse {
    fn from(course: course::Model) -> Self {
        Self {
            id: course.id,
            user_id: course.user_id,
            title: course.title,
            description: course.description,
            small_description: course.small_description,
            slug: course.slug,
            image_url: course.image_url,
            price: course.price,
            duration: course.duration,
            level: course.level,
            category: course.category,
            status: course.status,
            requirements: course.requirements,
            what_you_will_learn: course.what_you_will_learn,
            created_at: course.created_at.to_rfc3339(),
            updated_at: course.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Catalog card: a course with its instructor and rating aggregates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummaryResponse {
    #[serde(flatten)]
    pub course: CourseResponse,
    pub instructor_name: String,
    pub enrollment_count: u64,
    pub review_count: u64,
    pub average_rating: f64,
}

impl From<CourseSummary> for CourseSummaryResponse {
    fn from(summary: CourseSummary) -> Self {
        Self {
            course: summary.course.into(),
            instructor_name: summary.instructor_name,
            enrollment_count: summary.enrollment_count,
            review_count: summary.review_count,
            average_rating: summary.average_rating,
        }
    }
}

/// Paginated catalog page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePageResponse {
    pub courses: Vec<CourseSummaryResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl From<CoursePage> for CoursePageResponse {
    fn from(page: CoursePage) -> Self {
        Self {
            courses: page.courses.into_iter().map(Into::into).collect(),
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
        }
    }
}

/// Public instructor card on the course page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorResponse {
    pub id: String,
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<user::Model> for InstructorResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            bio: user.bio,
            avatar_url: user.avatar_url,
        }
    }
}

/// A chapter with its lessons, as shown on the course page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterContentResponse {
    #[serde(flatten)]
    pub chapter: ChapterResponse,
    pub lessons: Vec<LessonResponse>,
}

impl From<ChapterContent> for ChapterContentResponse {
    fn from(content: ChapterContent) -> Self {
        Self {
            chapter: content.chapter.into(),
            lessons: content.lessons.into_iter().map(Into::into).collect(),
        }
    }
}

/// Full course page response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    pub course: CourseResponse,
    pub instructor: InstructorResponse,
    pub chapters: Vec<ChapterContentResponse>,
    pub reviews: Vec<ReviewResponse>,
    pub enrollment_count: u64,
    pub review_count: u64,
    pub average_rating: f64,
    pub is_enrolled: bool,
}

impl From<CourseDetail> for CourseDetailResponse {
    fn from(detail: CourseDetail) -> Self {
        Self {
            course: detail.course.into(),
            instructor: detail.instructor.into(),
            chapters: detail.chapters.into_iter().map(Into::into).collect(),
            reviews: detail.reviews.into_iter().map(Into::into).collect(),
            enrollment_count: detail.enrollment_count,
            review_count: detail.review_count,
            average_rating: detail.average_rating,
            is_enrolled: detail.is_enrolled,
        }
    }
}

/// Catalog query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub search: Option<String>,
    pub price: Option<PriceRange>,
    #[serde(default)]
    pub sort: CourseSort,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    12
}

/// Recommendations query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsQuery {
    #[serde(default = "default_recommendations_limit")]
    pub limit: u64,
}

const fn default_recommendations_limit() -> u64 {
    8
}

/// Browse the published course catalog.
async fn catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<ApiResponse<CoursePageResponse>> {
    let filter = CourseFilter {
        category: query.category,
        level: query.level,
        search: query.search,
        price: query.price,
    };

    let page = state
        .course_service
        .catalog(filter, query.sort, query.page, query.limit)
        .await?;

    Ok(ApiResponse::ok(page.into()))
}

/// Courses picked from the caller's enrollment history.
async fn recommendations(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> AppResult<ApiResponse<Vec<CourseSummaryResponse>>> {
    let courses = state
        .course_service
        .recommendations(&user, query.limit)
        .await?;

    Ok(ApiResponse::ok(courses.into_iter().map(Into::into).collect()))
}

/// Get the full course page.
async fn detail(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<ApiResponse<CourseDetailResponse>> {
    let detail = state
        .course_service
        .get_detail(viewer.as_ref(), &course_id)
        .await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Create a new course in Draft status.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCourseInput>,
) -> AppResult<ApiResponse<CourseResponse>> {
    let course = state.course_service.create(&user, input).await?;
    Ok(ApiResponse::ok(course.into()))
}

/// Partially update a course.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(input): Json<UpdateCourseInput>,
) -> AppResult<ApiResponse<CourseResponse>> {
    let course = state.course_service.update(&user, &course_id, input).await?;
    Ok(ApiResponse::ok(course.into()))
}

/// Publish a course to the catalog.
async fn publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<ApiResponse<CourseResponse>> {
    let course = state.course_service.publish(&user, &course_id).await?;
    Ok(ApiResponse::ok(course.into()))
}

/// Take a course back to Draft.
async fn unpublish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<ApiResponse<CourseResponse>> {
    let course = state.course_service.unpublish(&user, &course_id).await?;
    Ok(ApiResponse::ok(course.into()))
}

/// Delete a course and all its content.
async fn delete_course(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.course_service.delete(&user, &course_id).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(catalog).post(create))
        .route("/courses/recommendations", get(recommendations))
        .route("/courses/{id}", get(detail).put(update).delete(delete_course))
        .route("/courses/{id}/publish", patch(publish).delete(unpublish))
}
