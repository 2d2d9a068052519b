//! Instance setting repository.

use std::sync::Arc;

use crate::entities::instance_setting::{self, Entity as InstanceSetting};
use plaza_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Instance setting repository for database operations.
#[derive(Clone)]
pub struct InstanceSettingRepository {
    db: Arc<DatabaseConnection>,
}

impl InstanceSettingRepository {
    /// Create a new instance setting repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get a setting's raw value by key.
    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(InstanceSetting::find_by_id(key)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .map(|m| m.value))
    }

    /// Upsert a setting.
    pub async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let existing = InstanceSetting::find_by_id(key)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let active = match existing {
            Some(found) => {
                let mut active: instance_setting::ActiveModel = found.into();
                active.value = Set(value.to_string());
                active.updated_at = Set(chrono::Utc::now().into());
                active
            }
            None => instance_setting::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(chrono::Utc::now().into()),
            },
        };

        active.save(self.db.as_ref()).await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
