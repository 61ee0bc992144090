//! Create course table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Course::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Course::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Course::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Course::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Course::Description).text().not_null())
                    .col(ColumnDef::new(Course::SmallDescription).string_len(512).not_null())
                    .col(ColumnDef::new(Course::Slug).string_len(256).not_null())
                    .col(ColumnDef::new(Course::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(Course::Price).double())
                    .col(ColumnDef::new(Course::Duration).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Course::Level)
                            .string_len(16)
                            .not_null()
                            .default("Beginner"),
                    )
                    .col(ColumnDef::new(Course::Category).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Course::Status)
                            .string_len(16)
                            .not_null()
                            .default("Draft"),
                    )
                    .col(ColumnDef::new(Course::Requirements).json_binary().not_null())
                    .col(ColumnDef::new(Course::WhatYouWillLearn).json_binary().not_null())
                    .col(
                        ColumnDef::new(Course::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Course::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_user")
                            .from(Course::Table, Course::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: slug
        manager
            .create_index(
                Index::create()
                    .name("idx_course_slug")
                    .table(Course::Table)
                    .col(Course::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (instructor dashboards)
        manager
            .create_index(
                Index::create()
                    .name("idx_course_user_id")
                    .table(Course::Table)
                    .col(Course::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: status (catalog queries filter on Published)
        manager
            .create_index(
                Index::create()
                    .name("idx_course_status")
                    .table(Course::Table)
                    .col(Course::Status)
                    .to_owned(),
            )
            .await?;

        // Index: category
        manager
            .create_index(
                Index::create()
                    .name("idx_course_category")
                    .table(Course::Table)
                    .col(Course::Category)
                    .to_owned(),
            )
            .await?;

        // Index: created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_course_created_at")
                    .table(Course::Table)
                    .col(Course::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Course::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Course {
    Table,
    Id,
    UserId,
    Title,
    Description,
    SmallDescription,
    Slug,
    ImageUrl,
    Price,
    Duration,
    Level,
    Category,
    Status,
    Requirements,
    WhatYouWillLearn,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
