use crate::application::commit::CommitError;
use crate::domain::TransitionError;
use thiserror::Error;

/// 予約・注文のステータス更新のエラー
#[derive(Debug, Error)]
pub enum StatusUpdateError {
    #[error("{kind} not found")]
    NotFound { kind: &'static str },

    #[error("Member not found")]
    MemberNotFound,

    /// 不正な操作名（例: "refund"）
    #[error("{0}")]
    UnknownAction(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error("Repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Member service error")]
    MemberServiceError(#[source] Box<dyn std::error::Error + Send + Sync>),
}
