//! Create chapter table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chapter::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Chapter::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Chapter::CourseId).string_len(32).not_null())
                    .col(ColumnDef::new(Chapter::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Chapter::Position).integer().not_null())
                    .col(ColumnDef::new(Chapter::IsPublished).boolean().not_null().default(false))
                    .col(ColumnDef::new(Chapter::IsFree).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Chapter::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Chapter::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chapter_course")
                            .from(Chapter::Table, Chapter::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: course_id
        manager
            .create_index(
                Index::create()
                    .name("idx_chapter_course_id")
                    .table(Chapter::Table)
                    .col(Chapter::CourseId)
                    .to_owned(),
            )
            .await?;

        // Unique index: (course_id, position) - positions never collide within a course
        manager
            .create_index(
                Index::create()
                    .name("idx_chapter_course_id_position")
                    .table(Chapter::Table)
                    .col(Chapter::CourseId)
                    .col(Chapter::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chapter::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Chapter {
    Table,
    Id,
    CourseId,
    Title,
    Position,
    IsPublished,
    IsFree,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Course {
    Table,
    Id,
}
