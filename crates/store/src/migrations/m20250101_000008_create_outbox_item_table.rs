//! Create outbox_item table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OutboxItem::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OutboxItem::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(OutboxItem::ActorId).string_len(32).not_null())
                    .col(ColumnDef::new(OutboxItem::InboxUrl).string_len(1024).not_null())
                    .col(ColumnDef::new(OutboxItem::Activity).json_binary().not_null())
                    .col(ColumnDef::new(OutboxItem::State).string_len(16).not_null())
                    .col(ColumnDef::new(OutboxItem::Attempts).integer().not_null().default(0))
                    .col(ColumnDef::new(OutboxItem::LastError).text())
                    .col(ColumnDef::new(OutboxItem::NextAttemptAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(OutboxItem::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(OutboxItem::DeliveredAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_outbox_item_actor")
                            .from(OutboxItem::Table, OutboxItem::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_outbox_item_actor_id")
                    .table(OutboxItem::Table)
                    .col(OutboxItem::ActorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_outbox_item_inbox_url")
                    .table(OutboxItem::Table)
                    .col(OutboxItem::InboxUrl)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_outbox_item_next_attempt_at")
                    .table(OutboxItem::Table)
                    .col(OutboxItem::NextAttemptAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OutboxItem::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum OutboxItem {
    Table,
    Id,
    ActorId,
    InboxUrl,
    Activity,
    State,
    Attempts,
    LastError,
    NextAttemptAt,
    CreatedAt,
    DeliveredAt,
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
}
