//! Create note_attachment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NoteAttachment::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(NoteAttachment::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(NoteAttachment::NoteId).string_len(32).not_null())
                    .col(ColumnDef::new(NoteAttachment::Url).string_len(1024).not_null())
                    .col(ColumnDef::new(NoteAttachment::MediaType).string_len(128))
                    .col(ColumnDef::new(NoteAttachment::Name).string_len(512))
                    .col(ColumnDef::new(NoteAttachment::Width).integer())
                    .col(ColumnDef::new(NoteAttachment::Height).integer())
                    .col(ColumnDef::new(NoteAttachment::Blurhash).string_len(128))
                    .col(
                        ColumnDef::new(NoteAttachment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_attachment_note")
                            .from(NoteAttachment::Table, NoteAttachment::NoteId)
                            .to(Note::Table, Note::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_note_attachment_note_id")
                    .table(NoteAttachment::Table)
                    .col(NoteAttachment::NoteId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(NoteAttachment::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum NoteAttachment {
    Table,
    Id,
    NoteId,
    Url,
    MediaType,
    Name,
    Width,
    Height,
    Blurhash,
    CreatedAt,
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
}
