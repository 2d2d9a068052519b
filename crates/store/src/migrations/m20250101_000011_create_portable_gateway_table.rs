//! Create portable_gateway table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PortableGateway::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PortableGateway::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(PortableGateway::ActorId).string_len(32).not_null())
                    .col(ColumnDef::new(PortableGateway::Host).string_len(256).not_null())
                    .col(
                        ColumnDef::new(PortableGateway::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portable_gateway_actor")
                            .from(PortableGateway::Table, PortableGateway::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_portable_gateway_actor_id")
                    .table(PortableGateway::Table)
                    .col(PortableGateway::ActorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PortableGateway::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum PortableGateway {
    Table,
    Id,
    ActorId,
    Host,
    RegisteredAt,
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
}
