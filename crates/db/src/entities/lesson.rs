//! Lesson entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lesson - a single unit of content within a chapter.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lesson")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub chapter_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Video content URL.
    #[sea_orm(nullable)]
    pub video_url: Option<String>,

    /// Display order within the chapter (0-based, unique per chapter).
    pub position: i32,

    /// Unpublished lessons are hidden from learners and excluded from
    /// completion.
    #[sea_orm(default_value = false)]
    pub is_published: bool,

    /// Free lessons are viewable without an enrollment.
    #[sea_orm(default_value = false)]
    pub is_free: bool,

    /// Estimated duration in minutes.
    #[sea_orm(nullable)]
    pub duration: Option<i32>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chapter::Entity",
        from = "Column::ChapterId",
        to = "super::chapter::Column::Id",
        on_delete = "Cascade"
    )]
    Chapter,

    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachments,

    #[sea_orm(has_many = "super::lesson_progress::Entity")]
    Progress,
}

impl Related<super::chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapter.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::lesson_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
