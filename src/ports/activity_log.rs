use crate::domain::value_objects::StaffId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Created => "created",
            ActivityAction::Updated => "updated",
        }
    }
}

impl std::str::FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "created" => Ok(ActivityAction::Created),
            "updated" => Ok(ActivityAction::Updated),
            _ => Err(format!("Invalid activity action: {}", s)),
        }
    }
}

/// 管理操作の監査記録
///
/// コミット1回につき1件。追記のみで変更・削除しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub entity_kind: String,
    pub entity_id: Uuid,
    pub action: ActivityAction,
    pub changed_fields: Vec<String>,
    pub old_status: Option<String>,
    pub new_status: String,
    pub actor: Option<StaffId>,
    pub occurred_at: DateTime<Utc>,
}

/// 監査ログポート
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// 記録を追記する
    async fn append(&self, record: ActivityRecord) -> Result<()>;

    /// エンティティの記録を古い順に取得する
    async fn list_for_entity(&self, entity_kind: &str, entity_id: Uuid)
    -> Result<Vec<ActivityRecord>>;
}
