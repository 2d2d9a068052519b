//! Create note_tag table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NoteTag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(NoteTag::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(NoteTag::NoteId).string_len(32).not_null())
                    .col(ColumnDef::new(NoteTag::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(NoteTag::Value).string_len(1024).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_tag_note")
                            .from(NoteTag::Table, NoteTag::NoteId)
                            .to(Note::Table, Note::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().name("idx_note_tag_note_id").table(NoteTag::Table).col(NoteTag::NoteId).to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(NoteTag::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum NoteTag {
    Table,
    Id,
    NoteId,
    Kind,
    Value,
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
}
