//! Create actor_key table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActorKey::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ActorKey::KeyId).string_len(64).not_null().primary_key())
                    .col(ColumnDef::new(ActorKey::ActorId).string_len(32).not_null())
                    .col(ColumnDef::new(ActorKey::Algorithm).string_len(16).not_null())
                    .col(ColumnDef::new(ActorKey::PublicKey).text().not_null())
                    .col(ColumnDef::new(ActorKey::PrivateKey).text())
                    .col(
                        ColumnDef::new(ActorKey::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_actor_key_actor")
                            .from(ActorKey::Table, ActorKey::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_actor_key_actor_id")
                    .table(ActorKey::Table)
                    .col(ActorKey::ActorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ActorKey::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum ActorKey {
    Table,
    KeyId,
    ActorId,
    Algorithm,
    PublicKey,
    PrivateKey,
    CreatedAt,
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
}
