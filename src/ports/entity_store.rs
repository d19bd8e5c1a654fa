use crate::domain::Entity;
use async_trait::async_trait;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 保存済みのバージョンと読み込み時のバージョンが一致しない
///
/// 同じエンティティへの並行更新を検出したことを表す。
#[derive(Debug, Clone, Error)]
#[error("{kind} {id} was modified concurrently (expected version {expected_version})")]
pub struct StaleEntityError {
    pub kind: &'static str,
    pub id: String,
    pub expected_version: i32,
}

/// エンティティの永続化ポート
///
/// エンティティの種類ごとに実装する。
/// 更新はバージョン番号による楽観的ロックで直列化する。
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// 新規エンティティを保存する
    async fn insert(&self, entity: &E) -> Result<()>;

    /// エンティティを更新する
    ///
    /// 保存済みのバージョンが `entity.version()` と一致する場合のみ更新し、
    /// バージョンを1つ進める。一致しなければ `StaleEntityError` を返す。
    async fn update(&self, entity: &E) -> Result<()>;

    /// IDでエンティティを取得する
    async fn get_by_id(&self, id: E::Id) -> Result<Option<E>>;
}
