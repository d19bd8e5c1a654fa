use crate::domain::{ChangeSet, Entity, value_objects::StaffId};
use crate::ports::entity_store::EntityStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// コミット時の文脈
///
/// 操作した職員はグローバルなセキュリティコンテキストから取らず、呼び出し側が渡す。
/// バッチ処理など職員がいない場合は `actor` が `None`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitContext {
    pub actor: Option<StaffId>,
    pub at: DateTime<Utc>,
}

impl CommitContext {
    pub fn by(actor: StaffId, at: DateTime<Utc>) -> Self {
        Self {
            actor: Some(actor),
            at,
        }
    }

    pub fn system(at: DateTime<Utc>) -> Self {
        Self { actor: None, at }
    }
}

/// 永続化の失敗
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("failed to persist {kind} {id}")]
    Persistence {
        kind: &'static str,
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CommitError {
    fn persistence<E: Entity>(
        entity: &E,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        CommitError::Persistence {
            kind: E::KIND,
            id: entity.id().to_string(),
            source,
        }
    }

    /// 原因が楽観的ロックの競合か
    pub fn is_stale(&self) -> bool {
        match self {
            CommitError::Persistence { source, .. } => source
                .downcast_ref::<crate::ports::StaleEntityError>()
                .is_some(),
        }
    }
}

/// コミット成功後に呼ばれるオブザーバー
///
/// エンティティの種類ごとに登録する。エラーは返さず、内部で記録して握りつぶす。
#[async_trait]
pub trait CommitObserver<E: Entity>: Send + Sync {
    /// 新規作成がコミットされた
    async fn on_created(&self, entity: &E, ctx: &CommitContext);

    /// 更新がコミットされた（変更があった場合のみ呼ばれる）
    async fn on_committed(&self, entity: &E, changes: &ChangeSet<E::Status>, ctx: &CommitContext);
}

/// コミットパイプライン
///
/// 保存 → 変更セットの計算 → オブザーバー呼び出し、を同期的に順番に行う。
/// オブザーバーは登録順に呼ばれ、保存が失敗した場合は呼ばれない。
pub struct CommitPipeline<E: Entity, S: ?Sized + EntityStore<E>> {
    store: Arc<S>,
    observers: Vec<Arc<dyn CommitObserver<E>>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, S: ?Sized + EntityStore<E>> CommitPipeline<E, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            observers: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// オブザーバーを登録する
    pub fn with_observer(mut self, observer: Arc<dyn CommitObserver<E>>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// 新規エンティティを保存し、`on_created` を通知する
    pub async fn create(&self, entity: &E, ctx: &CommitContext) -> Result<(), CommitError> {
        self.store
            .insert(entity)
            .await
            .map_err(|e| CommitError::persistence(entity, e))?;

        tracing::debug!(kind = E::KIND, id = %entity.id(), status = %entity.status(), "entity created");

        for observer in &self.observers {
            observer.on_created(entity, ctx).await;
        }
        Ok(())
    }

    /// 変更を保存し、`on_committed` を通知する
    ///
    /// `before` は読み込み時のスナップショット、`after` は遷移関数を適用したもの。
    /// 差分がなければ何も書き込まない。成功時は `after` のバージョンが進む。
    pub async fn commit(
        &self,
        before: &E,
        after: &mut E,
        ctx: &CommitContext,
    ) -> Result<ChangeSet<E::Status>, CommitError> {
        let changes = E::diff(before, after);
        if changes.is_empty() {
            return Ok(changes);
        }

        self.store
            .update(after)
            .await
            .map_err(|e| CommitError::persistence(after, e))?;
        after.set_version(after.version() + 1);

        tracing::debug!(
            kind = E::KIND,
            id = %after.id(),
            fields = ?changes.fields().collect::<Vec<_>>(),
            "entity committed"
        );

        let entity: &E = after;
        for observer in &self.observers {
            observer.on_committed(entity, &changes, ctx).await;
        }
        Ok(changes)
    }
}
