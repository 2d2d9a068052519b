//! Create invitation_code table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InvitationCode::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(InvitationCode::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(InvitationCode::Code).string_len(64).not_null())
                    .col(ColumnDef::new(InvitationCode::CreatedBy).string_len(32))
                    .col(ColumnDef::new(InvitationCode::UsedBy).string_len(32))
                    .col(ColumnDef::new(InvitationCode::UsedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(InvitationCode::ExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(InvitationCode::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invitation_code_created_by")
                            .from(InvitationCode::Table, InvitationCode::CreatedBy)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invitation_code_used_by")
                            .from(InvitationCode::Table, InvitationCode::UsedBy)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invitation_code_code")
                    .table(InvitationCode::Table)
                    .col(InvitationCode::Code)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(InvitationCode::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum InvitationCode {
    Table,
    Id,
    Code,
    CreatedBy,
    UsedBy,
    UsedAt,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
}
