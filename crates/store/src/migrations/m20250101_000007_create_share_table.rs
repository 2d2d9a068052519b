//! Create share table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Share::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Share::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Share::ActorId).string_len(32).not_null())
                    .col(ColumnDef::new(Share::NoteId).string_len(32).not_null())
                    .col(ColumnDef::new(Share::Uri).string_len(1024))
                    .col(
                        ColumnDef::new(Share::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_share_actor")
                            .from(Share::Table, Share::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_share_note")
                            .from(Share::Table, Share::NoteId)
                            .to(Note::Table, Note::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().name("idx_share_uri").table(Share::Table).col(Share::Uri).unique().to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_share_actor_note")
                    .table(Share::Table)
                    .col(Share::ActorId)
                    .col(Share::NoteId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().name("idx_share_note_id").table(Share::Table).col(Share::NoteId).to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Share::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum Share {
    Table,
    Id,
    ActorId,
    NoteId,
    Uri,
    CreatedAt,
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
}
