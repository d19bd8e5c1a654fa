use crate::domain::value_objects::StaffId;
use crate::ports::activity_log::{
    ActivityAction, ActivityLog as ActivityLogTrait, ActivityRecord, Result,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;
use uuid::Uuid;

use super::invalid_data;

fn map_row_to_record(row: &PgRow) -> Result<ActivityRecord> {
    let action_str: &str = row.get("action");
    let action = ActivityAction::from_str(action_str).map_err(invalid_data)?;

    let changed_fields: serde_json::Value = row.get("changed_fields");
    let changed_fields: Vec<String> = serde_json::from_value(changed_fields)?;

    let actor: Option<Uuid> = row.get("actor_id");

    Ok(ActivityRecord {
        entity_kind: row.get("entity_kind"),
        entity_id: row.get("entity_id"),
        action,
        changed_fields,
        old_status: row.get("old_status"),
        new_status: row.get("new_status"),
        actor: actor.map(StaffId::from_uuid),
        occurred_at: row.get("occurred_at"),
    })
}

/// 監査ログのPostgreSQL実装
///
/// 変更フィールドはJSONB配列で保存する。
pub struct ActivityLog {
    pool: PgPool,
}

impl ActivityLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogTrait for ActivityLog {
    async fn append(&self, record: ActivityRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (
                entity_kind,
                entity_id,
                action,
                changed_fields,
                old_status,
                new_status,
                actor_id,
                occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&record.entity_kind)
        .bind(record.entity_id)
        .bind(record.action.as_str())
        .bind(serde_json::to_value(&record.changed_fields)?)
        .bind(&record.old_status)
        .bind(&record.new_status)
        .bind(record.actor.map(|a| a.value()))
        .bind(record.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_entity(&self, entity_kind: &str, entity_id: Uuid) -> Result<Vec<ActivityRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT
                entity_kind,
                entity_id,
                action,
                changed_fields,
                old_status,
                new_status,
                actor_id,
                occurred_at
            FROM activity_log
            WHERE entity_kind = $1 AND entity_id = $2
            ORDER BY activity_id ASC
            "#,
        )
        .bind(entity_kind)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_record).collect()
    }
}
