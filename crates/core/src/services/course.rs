//! Course service.

use std::collections::HashMap;
use std::sync::LazyLock;

use opencourse_common::{AppError, AppResult, IdGenerator};
use opencourse_db::{
    entities::{
        chapter,
        course::{self, CourseLevel, CourseStatus},
        lesson, user,
    },
    repositories::{
        ChapterRepository, CourseFilter, CourseRepository, CourseSort, EnrollmentRepository,
        LessonRepository, ReviewRepository, UserRepository,
    },
};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::policy;
use super::review::ReviewWithAuthor;

/// Closed list of course categories.
pub const COURSE_CATEGORIES: [&str; 11] = [
    "Development",
    "Business",
    "Finance",
    "IT & Software",
    "Office Productivity",
    "Personal Development",
    "Design",
    "Marketing",
    "Health & Fitness",
    "Music",
    "Teaching & Academics",
];

/// Number of recent reviews shown on the course page.
const LATEST_REVIEWS: u64 = 10;

/// Upper bound on page sizes for course listings.
const MAX_PAGE_SIZE: u64 = 100;

// Regex patterns - these are valid static patterns that cannot fail
#[allow(clippy::unwrap_used)]
static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Course service for catalog, authoring and lifecycle operations.
#[derive(Clone)]
pub struct CourseService {
    course_repo: CourseRepository,
    chapter_repo: ChapterRepository,
    lesson_repo: LessonRepository,
    enrollment_repo: EnrollmentRepository,
    review_repo: ReviewRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a course.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseInput {
    #[validate(length(min = 3, max = 100))]
    pub title: String,

    #[validate(length(min = 3))]
    pub description: String,

    #[validate(length(min = 3, max = 100))]
    pub small_description: String,

    #[validate(url)]
    pub image_url: Option<String>,

    #[validate(range(min = 0.0))]
    pub price: Option<f64>,

    /// Estimated total duration in hours.
    #[validate(range(min = 1, max = 500))]
    pub duration: i32,

    #[serde(default)]
    pub level: CourseLevel,

    pub category: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    pub what_you_will_learn: Vec<String>,
}

/// Input for partially updating a course.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseInput {
    #[validate(length(min = 3, max = 100))]
    pub title: Option<String>,

    #[validate(length(min = 3))]
    pub description: Option<String>,

    #[validate(length(min = 3, max = 100))]
    pub small_description: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,

    #[validate(range(min = 0.0))]
    pub price: Option<f64>,

    #[validate(range(min = 1, max = 500))]
    pub duration: Option<i32>,

    pub level: Option<CourseLevel>,

    pub category: Option<String>,

    pub requirements: Option<Vec<String>>,

    pub what_you_will_learn: Option<Vec<String>>,
}

/// A catalog card: course plus display aggregates.
#[derive(Debug, Clone)]
pub struct CourseSummary {
    pub course: course::Model,
    pub instructor_name: String,
    pub enrollment_count: u64,
    pub review_count: u64,
    pub average_rating: f64,
}

/// One page of a course listing.
#[derive(Debug, Clone)]
pub struct CoursePage {
    pub courses: Vec<CourseSummary>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// A chapter with its lessons, ordered by position.
#[derive(Debug, Clone)]
pub struct ChapterContent {
    pub chapter: chapter::Model,
    pub lessons: Vec<lesson::Model>,
}

/// Full course page for a viewer.
#[derive(Debug, Clone)]
pub struct CourseDetail {
    pub course: course::Model,
    pub instructor: user::Model,
    pub chapters: Vec<ChapterContent>,
    pub reviews: Vec<ReviewWithAuthor>,
    pub enrollment_count: u64,
    pub review_count: u64,
    pub average_rating: f64,
    pub is_enrolled: bool,
}

impl CourseService {
    /// Create a new course service.
    #[must_use]
    pub const fn new(
        course_repo: CourseRepository,
        chapter_repo: ChapterRepository,
        lesson_repo: LessonRepository,
        enrollment_repo: EnrollmentRepository,
        review_repo: ReviewRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            course_repo,
            chapter_repo,
            lesson_repo,
            enrollment_repo,
            review_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Browse the published catalog.
    pub async fn catalog(
        &self,
        filter: CourseFilter,
        sort: CourseSort,
        page: u64,
        limit: u64,
    ) -> AppResult<CoursePage> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let courses = self
            .course_repo
            .find_published(&filter, sort, limit, (page - 1) * limit)
            .await?;
        let total = self.course_repo.count_published(&filter).await?;

        let courses = self.summarize(courses).await?;

        Ok(CoursePage {
            courses,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    /// Full course page, with content visibility scoped to the viewer.
    ///
    /// Drafts and archived courses stay hidden from non-owners, surfacing
    /// as not-found rather than as an authorization failure.
    pub async fn get_detail(
        &self,
        viewer: Option<&user::Model>,
        course_id: &str,
    ) -> AppResult<CourseDetail> {
        let course = self.course_repo.get_by_id(course_id).await?;

        if !policy::can_access_course(viewer, &course) {
            return Err(AppError::CourseNotFound(course_id.to_string()));
        }

        let sees_unpublished = viewer.is_some_and(|u| u.role.is_admin() || u.id == course.user_id);

        let chapters = if sees_unpublished {
            self.chapter_repo.find_by_course(&course.id).await?
        } else {
            self.chapter_repo.find_published_by_course(&course.id).await?
        };

        let mut contents = Vec::with_capacity(chapters.len());
        for chapter in chapters {
            let lessons = if sees_unpublished {
                self.lesson_repo.find_by_chapter(&chapter.id).await?
            } else {
                self.lesson_repo.find_published_by_chapter(&chapter.id).await?
            };
            contents.push(ChapterContent { chapter, lessons });
        }

        let instructor = self.user_repo.get_by_id(&course.user_id).await?;
        let enrollment_count = self.enrollment_repo.count_by_course(&course.id).await?;
        let review_count = self.review_repo.count_by_course(&course.id).await?;
        let rating_sum = self.review_repo.rating_sum_by_course(&course.id).await?;

        let reviews = self
            .review_repo
            .find_by_course(&course.id, LATEST_REVIEWS, 0)
            .await?;
        let author_ids: Vec<String> = reviews.iter().map(|r| r.user_id.clone()).collect();
        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let reviews = reviews
            .into_iter()
            .map(|review| {
                let author = authors.get(&review.user_id);
                ReviewWithAuthor {
                    author_name: author.map(|u| u.name.clone()).unwrap_or_default(),
                    author_avatar_url: author.and_then(|u| u.avatar_url.clone()),
                    review,
                }
            })
            .collect();

        let is_enrolled = match viewer {
            Some(u) => self.enrollment_repo.is_enrolled(&u.id, &course.id).await?,
            None => false,
        };

        Ok(CourseDetail {
            course,
            instructor,
            chapters: contents,
            reviews,
            enrollment_count,
            review_count,
            average_rating: round_rating(rating_sum, review_count),
            is_enrolled,
        })
    }

    /// Create a draft course owned by `owner`.
    pub async fn create(
        &self,
        owner: &user::Model,
        input: CreateCourseInput,
    ) -> AppResult<course::Model> {
        if !policy::can_create_course(owner) {
            return Err(AppError::Forbidden(
                "Only instructors can create courses".to_string(),
            ));
        }

        input.validate()?;
        validate_category(&input.category)?;

        let slug = self.unique_slug(&input.title).await?;

        let model = course::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(owner.id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            small_description: Set(input.small_description),
            slug: Set(slug),
            image_url: Set(input.image_url),
            price: Set(input.price),
            duration: Set(input.duration),
            level: Set(input.level),
            category: Set(input.category),
            status: Set(CourseStatus::Draft),
            requirements: Set(serde_json::json!(input.requirements)),
            what_you_will_learn: Set(serde_json::json!(input.what_you_will_learn)),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let course = self.course_repo.create(model).await?;
        tracing::info!(course_id = %course.id, user_id = %owner.id, "created course");

        Ok(course)
    }

    /// Partially update a course.
    pub async fn update(
        &self,
        editor: &user::Model,
        course_id: &str,
        input: UpdateCourseInput,
    ) -> AppResult<course::Model> {
        input.validate()?;
        if let Some(category) = &input.category {
            validate_category(category)?;
        }

        let course = self.course_repo.get_by_id(course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        let mut active: course::ActiveModel = course.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(small_description) = input.small_description {
            active.small_description = Set(small_description);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(price) = input.price {
            active.price = Set(Some(price));
        }
        if let Some(duration) = input.duration {
            active.duration = Set(duration);
        }
        if let Some(level) = input.level {
            active.level = Set(level);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(requirements) = input.requirements {
            active.requirements = Set(serde_json::json!(requirements));
        }
        if let Some(outcomes) = input.what_you_will_learn {
            active.what_you_will_learn = Set(serde_json::json!(outcomes));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.course_repo.update(active).await
    }

    /// Publish a course once it has presentable metadata and at least one
    /// published chapter.
    pub async fn publish(&self, editor: &user::Model, course_id: &str) -> AppResult<course::Model> {
        let course = self.course_repo.get_by_id(course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        if course.title.is_empty()
            || course.description.is_empty()
            || course.category.is_empty()
            || course.image_url.is_none()
        {
            return Err(AppError::InvalidState(
                "Course needs a title, description, category and cover image before publishing"
                    .to_string(),
            ));
        }

        let published_chapters = self.chapter_repo.count_published_by_course(&course.id).await?;
        if published_chapters == 0 {
            return Err(AppError::InvalidState(
                "Course needs at least one published chapter before publishing".to_string(),
            ));
        }

        let mut active: course::ActiveModel = course.into();
        active.status = Set(CourseStatus::Published);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let course = self.course_repo.update(active).await?;
        tracing::info!(course_id = %course.id, "published course");

        Ok(course)
    }

    /// Take a course back to draft.
    pub async fn unpublish(
        &self,
        editor: &user::Model,
        course_id: &str,
    ) -> AppResult<course::Model> {
        let course = self.course_repo.get_by_id(course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        let mut active: course::ActiveModel = course.into();
        active.status = Set(CourseStatus::Draft);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let course = self.course_repo.update(active).await?;
        tracing::info!(course_id = %course.id, "unpublished course");

        Ok(course)
    }

    /// Delete a course and, via FK cascades, all of its content.
    pub async fn delete(&self, editor: &user::Model, course_id: &str) -> AppResult<()> {
        let course = self.course_repo.get_by_id(course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        self.course_repo.delete(&course.id).await?;
        tracing::info!(course_id = %course_id, "deleted course");

        Ok(())
    }

    /// Published courses similar to the user's enrollments, excluding the
    /// enrolled ones. Users without enrollments get the most popular courses
    /// instead.
    pub async fn recommendations(
        &self,
        user: &user::Model,
        limit: u64,
    ) -> AppResult<Vec<CourseSummary>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let enrolled_ids = self.enrollment_repo.find_course_ids_by_user(&user.id).await?;

        if enrolled_ids.is_empty() {
            let popular = self
                .course_repo
                .find_published(&CourseFilter::default(), CourseSort::Popular, limit, 0)
                .await?;
            return self.summarize(popular).await;
        }

        let enrolled = self.course_repo.find_by_ids(&enrolled_ids).await?;

        let mut categories: Vec<String> = Vec::new();
        let mut levels: Vec<CourseLevel> = Vec::new();
        for course in &enrolled {
            if !categories.contains(&course.category) {
                categories.push(course.category.clone());
            }
            if !levels.contains(&course.level) {
                levels.push(course.level);
            }
        }

        let similar = self
            .course_repo
            .find_published_similar(&categories, &levels, &enrolled_ids, limit)
            .await?;

        self.summarize(similar).await
    }

    /// List an instructor's own courses, most recently touched first.
    pub async fn list_for_instructor(
        &self,
        owner: &user::Model,
        page: u64,
        limit: u64,
    ) -> AppResult<CoursePage> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let courses = self
            .course_repo
            .find_by_owner(&owner.id, limit, (page - 1) * limit)
            .await?;
        let total = self.course_repo.count_by_owner(&owner.id).await?;

        let courses = self.summarize(courses).await?;

        Ok(CoursePage {
            courses,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    /// List courses of any status for the admin panel.
    pub async fn list_all(&self, page: u64, limit: u64) -> AppResult<CoursePage> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let courses = self.course_repo.find_all(limit, (page - 1) * limit).await?;
        let total = self.course_repo.count().await?;

        let courses = self.summarize(courses).await?;

        Ok(CoursePage {
            courses,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    /// Attach instructor names and display aggregates to a course list.
    async fn summarize(&self, courses: Vec<course::Model>) -> AppResult<Vec<CourseSummary>> {
        let mut instructor_ids: Vec<String> = courses.iter().map(|c| c.user_id.clone()).collect();
        instructor_ids.sort();
        instructor_ids.dedup();

        let instructors: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&instructor_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        let mut summaries = Vec::with_capacity(courses.len());
        for course in courses {
            let enrollment_count = self.enrollment_repo.count_by_course(&course.id).await?;
            let review_count = self.review_repo.count_by_course(&course.id).await?;
            let rating_sum = self.review_repo.rating_sum_by_course(&course.id).await?;

            summaries.push(CourseSummary {
                instructor_name: instructors.get(&course.user_id).cloned().unwrap_or_default(),
                enrollment_count,
                review_count,
                average_rating: round_rating(rating_sum, review_count),
                course,
            });
        }

        Ok(summaries)
    }

    /// Derive a unique slug from the title, suffixing the current epoch
    /// millis on collision.
    async fn unique_slug(&self, title: &str) -> AppResult<String> {
        let slug = slugify(title);
        if self.course_repo.find_by_slug(&slug).await?.is_none() {
            return Ok(slug);
        }
        Ok(format!("{slug}-{}", chrono::Utc::now().timestamp_millis()))
    }
}

/// Reject categories outside the closed list.
fn validate_category(category: &str) -> AppResult<()> {
    if COURSE_CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Unknown category: {category}"
        )))
    }
}

/// Lowercase the title and collapse non-alphanumeric runs into hyphens.
fn slugify(title: &str) -> String {
    let slug = SLUG_RE
        .replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string();

    if slug.is_empty() { "course".to_string() } else { slug }
}

/// Average rating rounded to one decimal; 0 when there are no reviews.
pub(crate) fn round_rating(rating_sum: i64, review_count: u64) -> f64 {
    if review_count == 0 {
        return 0.0;
    }
    ((rating_sum as f64 / review_count as f64) * 10.0).round() / 10.0
}
