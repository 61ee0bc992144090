//! Chapter entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Chapter - an ordered section of a course containing lessons.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chapter")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub course_id: String,

    pub title: String,

    /// Display order within the course (0-based, unique per course).
    pub position: i32,

    /// Unpublished chapters are hidden from learners and excluded from
    /// completion.
    #[sea_orm(default_value = false)]
    pub is_published: bool,

    /// Preview flag shown in the catalog. Informational only; access gating
    /// happens per lesson.
    #[sea_orm(default_value = false)]
    pub is_free: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,

    #[sea_orm(has_many = "super::lesson::Entity")]
    Lessons,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lessons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
