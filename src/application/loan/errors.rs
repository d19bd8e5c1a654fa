use crate::application::commit::CommitError;
use crate::domain::LoanTransitionError;
use thiserror::Error;

/// 貸出管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// 会員が存在しない
    #[error("Member not found")]
    MemberNotFound,

    /// 書籍が貸出不可
    #[error("Book is not available for loan")]
    BookNotAvailable,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// 状態遷移の誤り（メッセージはそのまま利用者に見せられる）
    #[error(transparent)]
    Transition(#[from] LoanTransitionError),

    /// 保存の失敗
    #[error(transparent)]
    Commit(#[from] CommitError),

    /// 検索の失敗
    #[error("Loan repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// MemberServiceのエラー
    #[error("Member service error")]
    MemberServiceError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// BookServiceのエラー
    #[error("Book service error")]
    BookServiceError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
