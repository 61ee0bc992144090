//! Course entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CourseStatus {
    /// Being authored; visible to the owner and admins only.
    #[sea_orm(string_value = "Draft")]
    Draft,
    /// Live in the catalog; open for enrollment.
    #[sea_orm(string_value = "Published")]
    Published,
    /// Retired from the catalog; no new enrollments.
    #[sea_orm(string_value = "Archived")]
    Archived,
}

impl Default for CourseStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl CourseStatus {
    /// Check whether the course is live in the catalog.
    #[must_use]
    pub const fn is_published(self) -> bool {
        matches!(self, Self::Published)
    }
}

/// Difficulty level of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CourseLevel {
    #[sea_orm(string_value = "Beginner")]
    Beginner,
    #[sea_orm(string_value = "Intermediate")]
    Intermediate,
    #[sea_orm(string_value = "Advanced")]
    Advanced,
}

impl Default for CourseLevel {
    fn default() -> Self {
        Self::Beginner
    }
}

/// Course entity - a unit of instruction owned by one instructor.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning instructor.
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Short blurb shown on catalog cards.
    pub small_description: String,

    /// URL-friendly identifier, unique across courses.
    #[sea_orm(unique)]
    pub slug: String,

    /// Cover image URL.
    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    /// Price in dollars. NULL or 0 means free.
    #[sea_orm(nullable)]
    pub price: Option<f64>,

    /// Estimated total duration in hours.
    pub duration: i32,

    pub level: CourseLevel,

    pub category: String,

    pub status: CourseStatus,

    /// Prerequisites, as a JSON array of strings.
    pub requirements: Json,

    /// Learning outcomes, as a JSON array of strings.
    pub what_you_will_learn: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether enrolling requires a completed payment.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.price.is_some_and(|p| p > 0.0)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,

    #[sea_orm(has_many = "super::chapter::Entity")]
    Chapters,

    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,

    #[sea_orm(has_many = "super::certificate::Entity")]
    Certificates,

    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapters.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
