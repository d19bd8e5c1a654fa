use crate::ports::activity_log::{ActivityLog as ActivityLogTrait, ActivityRecord, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

/// ActivityLogのモック実装（メモリ上に追記するだけ）
pub struct ActivityLog {
    records: Mutex<Vec<ActivityRecord>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<ActivityRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityLogTrait for ActivityLog {
    async fn append(&self, record: ActivityRecord) -> Result<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn list_for_entity(&self, entity_kind: &str, entity_id: Uuid) -> Result<Vec<ActivityRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.entity_kind == entity_kind && r.entity_id == entity_id)
            .cloned()
            .collect())
    }
}
