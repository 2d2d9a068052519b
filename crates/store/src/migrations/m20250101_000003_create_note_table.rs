//! Create note table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Note::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Note::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Note::ActorId).string_len(32).not_null())
                    .col(ColumnDef::new(Note::Uri).string_len(1024))
                    .col(ColumnDef::new(Note::Content).text())
                    .col(ColumnDef::new(Note::Visibility).string_len(16).not_null())
                    .col(ColumnDef::new(Note::To).json_binary().not_null())
                    .col(ColumnDef::new(Note::Cc).json_binary().not_null())
                    .col(ColumnDef::new(Note::InReplyToId).string_len(32))
                    .col(ColumnDef::new(Note::ReplyRootId).string_len(32))
                    .col(ColumnDef::new(Note::QuoteId).string_len(32))
                    .col(ColumnDef::new(Note::GroupId).string_len(32))
                    .col(ColumnDef::new(Note::PublishedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Note::EditedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Note::Deleted).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Note::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_actor")
                            .from(Note::Table, Note::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_in_reply_to")
                            .from(Note::Table, Note::InReplyToId)
                            .to(Note::Table, Note::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().name("idx_note_uri").table(Note::Table).col(Note::Uri).unique().to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().name("idx_note_actor_id").table(Note::Table).col(Note::ActorId).to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_note_in_reply_to_id")
                    .table(Note::Table)
                    .col(Note::InReplyToId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_note_reply_root_id")
                    .table(Note::Table)
                    .col(Note::ReplyRootId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().name("idx_note_group_id").table(Note::Table).col(Note::GroupId).to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Note::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
    ActorId,
    Uri,
    Content,
    Visibility,
    To,
    Cc,
    InReplyToId,
    ReplyRootId,
    QuoteId,
    GroupId,
    PublishedAt,
    EditedAt,
    Deleted,
    CreatedAt,
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
}
