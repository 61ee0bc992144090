//! Create certificate table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificate::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Certificate::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Certificate::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Certificate::CourseId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Certificate::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_user")
                            .from(Certificate::Table, Certificate::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_course")
                            .from(Certificate::Table, Certificate::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, course_id) - at most one certificate per pair
        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_user_id_course_id")
                    .table(Certificate::Table)
                    .col(Certificate::UserId)
                    .col(Certificate::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: course_id
        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_course_id")
                    .table(Certificate::Table)
                    .col(Certificate::CourseId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificate::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Certificate {
    Table,
    Id,
    UserId,
    CourseId,
    IssuedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Course {
    Table,
    Id,
}
