//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Platform role of a user.
///
/// Roles are a closed set used for authorization decisions only; there is no
/// implicit hierarchy beyond the predicates defined here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UserRole {
    /// Learner - can browse, enroll, and track progress.
    #[sea_orm(string_value = "STUDENT")]
    Student,
    /// Instructor - can author and publish courses.
    #[sea_orm(string_value = "INSTRUCTOR")]
    Instructor,
    /// Admin - full access to all content and analytics.
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Student
    }
}

impl UserRole {
    /// Check if the role can author courses.
    #[must_use]
    pub const fn can_author_courses(self) -> bool {
        matches!(self, Self::Instructor | Self::Admin)
    }

    /// Check if this is the admin role.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Total ordering over roles for "at least" checks.
    const fn rank(self) -> u8 {
        match self {
            Self::Student => 0,
            Self::Instructor => 1,
            Self::Admin => 2,
        }
    }

    /// Check whether this role grants at least the capabilities of `other`.
    #[must_use]
    pub const fn is_at_least(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Lowercased email for case-insensitive lookup.
    pub email_lower: String,

    /// Display name.
    pub name: String,

    /// Profile bio.
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    /// Avatar URL.
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Platform role.
    pub role: UserRole,

    /// Argon2 password hash.
    pub password_hash: String,

    /// Access token (NULL when signed out).
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course::Entity")]
    Courses,

    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,

    #[sea_orm(has_many = "super::lesson_progress::Entity")]
    LessonProgress,

    #[sea_orm(has_many = "super::certificate::Entity")]
    Certificates,

    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courses.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::certificate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certificates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_predicates() {
        assert!(UserRole::Instructor.can_author_courses());
        assert!(UserRole::Admin.can_author_courses());
        assert!(!UserRole::Student.can_author_courses());

        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Instructor.is_admin());
    }

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::Admin.is_at_least(UserRole::Instructor));
        assert!(UserRole::Instructor.is_at_least(UserRole::Instructor));
        assert!(UserRole::Instructor.is_at_least(UserRole::Student));
        assert!(!UserRole::Student.is_at_least(UserRole::Instructor));
    }
}
