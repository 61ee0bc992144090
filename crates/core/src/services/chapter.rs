//! Chapter service.

use opencourse_common::{AppError, AppResult, IdGenerator};
use opencourse_db::{
    entities::{chapter, user},
    repositories::{ChapterRepository, CourseRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::policy;

/// Chapter service for structuring course content.
#[derive(Clone)]
pub struct ChapterService {
    chapter_repo: ChapterRepository,
    course_repo: CourseRepository,
    id_gen: IdGenerator,
}

/// Input for creating a chapter.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChapterInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}

/// Input for partially updating a chapter.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChapterInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(range(min = 0))]
    pub position: Option<i32>,

    pub is_published: Option<bool>,

    pub is_free: Option<bool>,
}

impl ChapterService {
    /// Create a new chapter service.
    #[must_use]
    pub const fn new(chapter_repo: ChapterRepository, course_repo: CourseRepository) -> Self {
        Self {
            chapter_repo,
            course_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List a course's chapters as the viewer sees them. Owners and admins
    /// get every chapter, everyone else only published ones.
    pub async fn list(
        &self,
        viewer: Option<&user::Model>,
        course_id: &str,
    ) -> AppResult<Vec<chapter::Model>> {
        let course = self.course_repo.get_by_id(course_id).await?;
        if !policy::can_access_course(viewer, &course) {
            return Err(AppError::CourseNotFound(course_id.to_string()));
        }

        let sees_unpublished = viewer.is_some_and(|u| u.role.is_admin() || u.id == course.user_id);
        if sees_unpublished {
            self.chapter_repo.find_by_course(&course.id).await
        } else {
            self.chapter_repo.find_published_by_course(&course.id).await
        }
    }

    /// Append a new chapter at the end of the course.
    pub async fn create(
        &self,
        editor: &user::Model,
        course_id: &str,
        input: CreateChapterInput,
    ) -> AppResult<chapter::Model> {
        input.validate()?;

        let course = self.course_repo.get_by_id(course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        let position = self.chapter_repo.next_position(&course.id).await?;

        let model = chapter::ActiveModel {
            id: Set(self.id_gen.generate()),
            course_id: Set(course.id.clone()),
            title: Set(input.title),
            position: Set(position),
            is_published: Set(false),
            is_free: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let chapter = self.chapter_repo.create(model).await?;
        tracing::info!(chapter_id = %chapter.id, course_id = %course.id, "created chapter");

        Ok(chapter)
    }

    /// Partially update a chapter.
    pub async fn update(
        &self,
        editor: &user::Model,
        chapter_id: &str,
        input: UpdateChapterInput,
    ) -> AppResult<chapter::Model> {
        input.validate()?;

        let chapter = self.chapter_repo.get_by_id(chapter_id).await?;
        let course = self.course_repo.get_by_id(&chapter.course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        let mut active: chapter::ActiveModel = chapter.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(position) = input.position {
            active.position = Set(position);
        }
        if let Some(is_published) = input.is_published {
            active.is_published = Set(is_published);
        }
        if let Some(is_free) = input.is_free {
            active.is_free = Set(is_free);
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.chapter_repo.update(active).await
    }

    /// Delete a chapter and its lessons.
    pub async fn delete(&self, editor: &user::Model, chapter_id: &str) -> AppResult<()> {
        let chapter = self.chapter_repo.get_by_id(chapter_id).await?;
        let course = self.course_repo.get_by_id(&chapter.course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        self.chapter_repo.delete(&chapter.id).await?;
        tracing::info!(chapter_id = %chapter_id, course_id = %course.id, "deleted chapter");

        Ok(())
    }
}
