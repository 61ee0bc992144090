//! Create lesson table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lesson::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lesson::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Lesson::ChapterId).string_len(32).not_null())
                    .col(ColumnDef::new(Lesson::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Lesson::Description).text())
                    .col(ColumnDef::new(Lesson::VideoUrl).string_len(1024))
                    .col(ColumnDef::new(Lesson::Position).integer().not_null())
                    .col(ColumnDef::new(Lesson::IsPublished).boolean().not_null().default(false))
                    .col(ColumnDef::new(Lesson::IsFree).boolean().not_null().default(false))
                    .col(ColumnDef::new(Lesson::Duration).integer())
                    .col(
                        ColumnDef::new(Lesson::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Lesson::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lesson_chapter")
                            .from(Lesson::Table, Lesson::ChapterId)
                            .to(Chapter::Table, Chapter::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: chapter_id
        manager
            .create_index(
                Index::create()
                    .name("idx_lesson_chapter_id")
                    .table(Lesson::Table)
                    .col(Lesson::ChapterId)
                    .to_owned(),
            )
            .await?;

        // Unique index: (chapter_id, position) - positions never collide within a chapter
        manager
            .create_index(
                Index::create()
                    .name("idx_lesson_chapter_id_position")
                    .table(Lesson::Table)
                    .col(Lesson::ChapterId)
                    .col(Lesson::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lesson::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Lesson {
    Table,
    Id,
    ChapterId,
    Title,
    Description,
    VideoUrl,
    Position,
    IsPublished,
    IsFree,
    Duration,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Chapter {
    Table,
    Id,
}
