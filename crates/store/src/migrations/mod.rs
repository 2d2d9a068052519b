//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_actor_table;
mod m20250101_000002_create_actor_key_table;
mod m20250101_000003_create_note_table;
mod m20250101_000004_create_note_attachment_table;
mod m20250101_000005_create_note_tag_table;
mod m20250101_000006_create_follow_table;
mod m20250101_000007_create_share_table;
mod m20250101_000008_create_outbox_item_table;
mod m20250101_000009_create_invitation_code_table;
mod m20250101_000010_create_poll_tables;
mod m20250101_000011_create_portable_gateway_table;
mod m20250101_000012_create_instance_setting_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_actor_table::Migration),
            Box::new(m20250101_000002_create_actor_key_table::Migration),
            Box::new(m20250101_000003_create_note_table::Migration),
            Box::new(m20250101_000004_create_note_attachment_table::Migration),
            Box::new(m20250101_000005_create_note_tag_table::Migration),
            Box::new(m20250101_000006_create_follow_table::Migration),
            Box::new(m20250101_000007_create_share_table::Migration),
            Box::new(m20250101_000008_create_outbox_item_table::Migration),
            Box::new(m20250101_000009_create_invitation_code_table::Migration),
            Box::new(m20250101_000010_create_poll_tables::Migration),
            Box::new(m20250101_000011_create_portable_gateway_table::Migration),
            Box::new(m20250101_000012_create_instance_setting_table::Migration),
        ]
    }
}
