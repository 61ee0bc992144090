//! Lesson service.

use std::collections::HashMap;

use opencourse_common::{AppError, AppResult, IdGenerator};
use opencourse_db::{
    entities::{attachment, lesson, user},
    repositories::{ChapterRepository, CourseRepository, EnrollmentRepository, LessonRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::policy;

/// Lesson service for content authoring and gated delivery.
#[derive(Clone)]
pub struct LessonService {
    lesson_repo: LessonRepository,
    chapter_repo: ChapterRepository,
    course_repo: CourseRepository,
    enrollment_repo: EnrollmentRepository,
    id_gen: IdGenerator,
}

/// A downloadable material on a lesson.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(url)]
    pub url: String,
}

/// Input for creating a lesson.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    pub description: Option<String>,

    #[validate(url)]
    pub video_url: Option<String>,

    #[serde(default)]
    pub is_free: bool,

    /// Estimated duration in minutes.
    #[validate(range(min = 0))]
    pub duration: Option<i32>,

    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

/// Input for partially updating a lesson.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(url)]
    pub video_url: Option<String>,

    #[validate(range(min = 0))]
    pub position: Option<i32>,

    pub is_published: Option<bool>,

    pub is_free: Option<bool>,

    #[validate(range(min = 0))]
    pub duration: Option<i32>,

    /// When present, replaces the whole attachment set.
    pub attachments: Option<Vec<AttachmentInput>>,
}

/// A lesson with its attachments.
#[derive(Debug, Clone)]
pub struct LessonWithAttachments {
    pub lesson: lesson::Model,
    pub attachments: Vec<attachment::Model>,
}

impl LessonService {
    /// Create a new lesson service.
    #[must_use]
    pub const fn new(
        lesson_repo: LessonRepository,
        chapter_repo: ChapterRepository,
        course_repo: CourseRepository,
        enrollment_repo: EnrollmentRepository,
    ) -> Self {
        Self {
            lesson_repo,
            chapter_repo,
            course_repo,
            enrollment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List a chapter's lessons as the viewer sees them, attachments
    /// included.
    pub async fn list(
        &self,
        viewer: Option<&user::Model>,
        chapter_id: &str,
    ) -> AppResult<Vec<LessonWithAttachments>> {
        let chapter = self.chapter_repo.get_by_id(chapter_id).await?;
        let course = self.course_repo.get_by_id(&chapter.course_id).await?;
        if !policy::can_access_course(viewer, &course) {
            return Err(AppError::CourseNotFound(course.id));
        }

        let sees_unpublished = viewer.is_some_and(|u| u.role.is_admin() || u.id == course.user_id);

        let lessons = if sees_unpublished {
            self.lesson_repo.find_by_chapter(&chapter.id).await?
        } else {
            if !chapter.is_published {
                return Err(AppError::ChapterNotFound(chapter_id.to_string()));
            }
            self.lesson_repo.find_published_by_chapter(&chapter.id).await?
        };

        let lesson_ids: Vec<String> = lessons.iter().map(|l| l.id.clone()).collect();
        let mut by_lesson: HashMap<String, Vec<attachment::Model>> = HashMap::new();
        for attachment in self.lesson_repo.find_attachments_for(&lesson_ids).await? {
            by_lesson
                .entry(attachment.lesson_id.clone())
                .or_default()
                .push(attachment);
        }

        Ok(lessons
            .into_iter()
            .map(|lesson| LessonWithAttachments {
                attachments: by_lesson.remove(&lesson.id).unwrap_or_default(),
                lesson,
            })
            .collect())
    }

    /// Fetch a single lesson for the viewer.
    ///
    /// Owners and admins see everything. Learners only see published lessons
    /// in published chapters, and non-free lessons require an enrollment.
    pub async fn get(
        &self,
        viewer: Option<&user::Model>,
        lesson_id: &str,
    ) -> AppResult<LessonWithAttachments> {
        let lesson = self.lesson_repo.get_by_id(lesson_id).await?;
        let chapter = self.chapter_repo.get_by_id(&lesson.chapter_id).await?;
        let course = self.course_repo.get_by_id(&chapter.course_id).await?;

        let sees_unpublished = viewer.is_some_and(|u| u.role.is_admin() || u.id == course.user_id);

        if !sees_unpublished {
            if !policy::can_access_course(viewer, &course) {
                return Err(AppError::CourseNotFound(course.id));
            }
            if !chapter.is_published || !lesson.is_published {
                return Err(AppError::LessonNotFound(lesson_id.to_string()));
            }
            if !lesson.is_free {
                let enrolled = match viewer {
                    Some(u) => self.enrollment_repo.is_enrolled(&u.id, &course.id).await?,
                    None => false,
                };
                if !enrolled {
                    return Err(AppError::Forbidden(
                        "Enroll in the course to view this lesson".to_string(),
                    ));
                }
            }
        }

        let attachments = self.lesson_repo.find_attachments(&lesson.id).await?;

        Ok(LessonWithAttachments { lesson, attachments })
    }

    /// Append a new lesson at the end of the chapter.
    pub async fn create(
        &self,
        editor: &user::Model,
        chapter_id: &str,
        input: CreateLessonInput,
    ) -> AppResult<LessonWithAttachments> {
        input.validate()?;
        for attachment in &input.attachments {
            attachment.validate()?;
        }

        let chapter = self.chapter_repo.get_by_id(chapter_id).await?;
        let course = self.course_repo.get_by_id(&chapter.course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        let position = self.lesson_repo.next_position(&chapter.id).await?;

        let model = lesson::ActiveModel {
            id: Set(self.id_gen.generate()),
            chapter_id: Set(chapter.id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            video_url: Set(input.video_url),
            position: Set(position),
            is_published: Set(false),
            is_free: Set(input.is_free),
            duration: Set(input.duration),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let lesson = self.lesson_repo.create(model).await?;

        let attachments = if input.attachments.is_empty() {
            vec![]
        } else {
            self.store_attachments(&lesson.id, input.attachments).await?
        };

        tracing::info!(lesson_id = %lesson.id, chapter_id = %chapter.id, "created lesson");

        Ok(LessonWithAttachments { lesson, attachments })
    }

    /// Partially update a lesson.
    pub async fn update(
        &self,
        editor: &user::Model,
        lesson_id: &str,
        input: UpdateLessonInput,
    ) -> AppResult<LessonWithAttachments> {
        input.validate()?;
        if let Some(attachments) = &input.attachments {
            for attachment in attachments {
                attachment.validate()?;
            }
        }

        let lesson = self.lesson_repo.get_by_id(lesson_id).await?;
        let chapter = self.chapter_repo.get_by_id(&lesson.chapter_id).await?;
        let course = self.course_repo.get_by_id(&chapter.course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        let mut active: lesson::ActiveModel = lesson.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(video_url) = input.video_url {
            active.video_url = Set(Some(video_url));
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
        if let Some(duration) = input.duration {
            active.duration = Set(Some(duration));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let lesson = self.lesson_repo.update(active).await?;

        let attachments = match input.attachments {
            Some(attachments) => self.store_attachments(&lesson.id, attachments).await?,
            None => self.lesson_repo.find_attachments(&lesson.id).await?,
        };

        Ok(LessonWithAttachments { lesson, attachments })
    }

    /// Delete a lesson, its attachments and its progress rows.
    pub async fn delete(&self, editor: &user::Model, lesson_id: &str) -> AppResult<()> {
        let lesson = self.lesson_repo.get_by_id(lesson_id).await?;
        let chapter = self.chapter_repo.get_by_id(&lesson.chapter_id).await?;
        let course = self.course_repo.get_by_id(&chapter.course_id).await?;
        if !policy::can_edit_course(editor, &course) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this course".to_string(),
            ));
        }

        self.lesson_repo.delete(&lesson.id).await?;
        tracing::info!(lesson_id = %lesson_id, chapter_id = %chapter.id, "deleted lesson");

        Ok(())
    }

    /// Replace the attachment set of a lesson with freshly minted rows.
    async fn store_attachments(
        &self,
        lesson_id: &str,
        inputs: Vec<AttachmentInput>,
    ) -> AppResult<Vec<attachment::Model>> {
        let now = chrono::Utc::now();

        let mut models = Vec::with_capacity(inputs.len());
        let mut actives = Vec::with_capacity(inputs.len());
        for input in inputs {
            let model = attachment::Model {
                id: self.id_gen.generate(),
                lesson_id: lesson_id.to_string(),
                name: input.name,
                url: input.url,
                created_at: now.into(),
            };
            actives.push(attachment::ActiveModel {
                id: Set(model.id.clone()),
                lesson_id: Set(model.lesson_id.clone()),
                name: Set(model.name.clone()),
                url: Set(model.url.clone()),
                created_at: Set(model.created_at),
            });
            models.push(model);
        }

        self.lesson_repo.replace_attachments(lesson_id, actives).await?;

        Ok(models)
    }
}
