//! Create attachment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attachment::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Attachment::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Attachment::LessonId).string_len(32).not_null())
                    .col(ColumnDef::new(Attachment::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Attachment::Url).string_len(1024).not_null())
                    .col(
                        ColumnDef::new(Attachment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attachment_lesson")
                            .from(Attachment::Table, Attachment::LessonId)
                            .to(Lesson::Table, Lesson::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: lesson_id
        manager
            .create_index(
                Index::create()
                    .name("idx_attachment_lesson_id")
                    .table(Attachment::Table)
                    .col(Attachment::LessonId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attachment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Attachment {
    Table,
    Id,
    LessonId,
    Name,
    Url,
    CreatedAt,
}

#[derive(Iden)]
enum Lesson {
    Table,
    Id,
}
