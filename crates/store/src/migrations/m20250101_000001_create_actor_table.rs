//! Create actor table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Actor::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Actor::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Actor::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Actor::PreferredUsername).string_len(128).not_null())
                    .col(ColumnDef::new(Actor::UsernameLower).string_len(128).not_null())
                    .col(ColumnDef::new(Actor::Host).string_len(256))
                    .col(ColumnDef::new(Actor::Name).string_len(256))
                    .col(ColumnDef::new(Actor::Summary).text())
                    .col(ColumnDef::new(Actor::Inbox).string_len(1024))
                    .col(ColumnDef::new(Actor::Outbox).string_len(1024))
                    .col(ColumnDef::new(Actor::FollowersUrl).string_len(1024))
                    .col(ColumnDef::new(Actor::SharedInbox).string_len(1024))
                    .col(
                        ColumnDef::new(Actor::ManuallyApprovesFollowers)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Actor::AlsoKnownAs).json_binary().not_null())
                    .col(ColumnDef::new(Actor::MovedTo).string_len(32))
                    .col(ColumnDef::new(Actor::DidKey).string_len(256))
                    .col(ColumnDef::new(Actor::Uri).string_len(1024))
                    .col(ColumnDef::new(Actor::FollowersCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Actor::FollowingCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Actor::NotesCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Actor::IsSuspended).boolean().not_null().default(false))
                    .col(ColumnDef::new(Actor::LastFetchedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Actor::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Actor::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_actor_username_lower_host")
                    .table(Actor::Table)
                    .col(Actor::UsernameLower)
                    .col(Actor::Host)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_actor_preferred_username")
                    .table(Actor::Table)
                    .col(Actor::PreferredUsername)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_actor_did_key")
                    .table(Actor::Table)
                    .col(Actor::DidKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_actor_uri")
                    .table(Actor::Table)
                    .col(Actor::Uri)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().name("idx_actor_host").table(Actor::Table).col(Actor::Host).to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Actor::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
    Kind,
    PreferredUsername,
    UsernameLower,
    Host,
    Name,
    Summary,
    Inbox,
    Outbox,
    FollowersUrl,
    SharedInbox,
    ManuallyApprovesFollowers,
    AlsoKnownAs,
    MovedTo,
    DidKey,
    Uri,
    FollowersCount,
    FollowingCount,
    NotesCount,
    IsSuspended,
    LastFetchedAt,
    CreatedAt,
    UpdatedAt,
}
