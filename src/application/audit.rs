use crate::domain::{ChangeSet, Entity};
use crate::ports::activity_log::{ActivityAction, ActivityLog, ActivityRecord};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

use super::commit::{CommitContext, CommitObserver};

/// 管理操作を監査ログへ記録するオブザーバー
///
/// エンティティの種類ごとにインスタンスを作り、それぞれのパイプラインに登録する。
/// 書き込みの失敗はログに残すだけで、コミットには影響しない。
pub struct ActivityRecorder<E> {
    log: Arc<dyn ActivityLog>,
    _entity: PhantomData<fn(&E)>,
}

impl<E: Entity> ActivityRecorder<E> {
    pub fn new(log: Arc<dyn ActivityLog>) -> Self {
        Self {
            log,
            _entity: PhantomData,
        }
    }

    async fn append(&self, record: ActivityRecord) {
        let entity_id = record.entity_id;
        if let Err(e) = self.log.append(record).await {
            tracing::warn!(kind = E::KIND, %entity_id, error = %e, "failed to write activity log");
        }
    }
}

#[async_trait]
impl<E: Entity> CommitObserver<E> for ActivityRecorder<E> {
    async fn on_created(&self, entity: &E, ctx: &CommitContext) {
        self.append(ActivityRecord {
            entity_kind: E::KIND.to_string(),
            entity_id: entity.uuid(),
            action: ActivityAction::Created,
            changed_fields: Vec::new(),
            old_status: None,
            new_status: entity.status().to_string(),
            actor: ctx.actor,
            occurred_at: ctx.at,
        })
        .await;
    }

    async fn on_committed(&self, entity: &E, changes: &ChangeSet<E::Status>, ctx: &CommitContext) {
        self.append(ActivityRecord {
            entity_kind: E::KIND.to_string(),
            entity_id: entity.uuid(),
            action: ActivityAction::Updated,
            changed_fields: changes.fields().map(str::to_string).collect(),
            old_status: changes.status_change().map(|c| c.from.to_string()),
            new_status: entity.status().to_string(),
            actor: ctx.actor,
            occurred_at: ctx.at,
        })
        .await;
    }
}
