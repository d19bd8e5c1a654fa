use crate::application::commit::CommitError;
use crate::application::errors::StatusUpdateError;
use crate::application::loan::LoanApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Loan(LoanApplicationError),
    StatusUpdate(StatusUpdateError),
    BadRequest(String),
}

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError::Loan(err)
    }
}

impl From<StatusUpdateError> for ApiError {
    fn from(err: StatusUpdateError) -> Self {
        ApiError::StatusUpdate(err)
    }
}

type Mapped = (StatusCode, &'static str, String);

/// 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
fn internal(error_type: &'static str, err: &dyn std::error::Error) -> Mapped {
    tracing::error!(error = %err, source = ?err.source(), "{}", error_type);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_type,
        "An unexpected error occurred".to_string(),
    )
}

fn map_commit_error(err: &CommitError) -> Mapped {
    if err.is_stale() {
        // 409 Conflict - 並行更新
        return (
            StatusCode::CONFLICT,
            "CONCURRENT_MODIFICATION",
            "The record was modified by someone else. Reload and try again.".to_string(),
        );
    }
    internal("PERSISTENCE_ERROR", err)
}

fn map_loan_error(err: &LoanApplicationError) -> Mapped {
    match err {
        // 404 Not Found
        LoanApplicationError::LoanNotFound => (
            StatusCode::NOT_FOUND,
            "LOAN_NOT_FOUND",
            "Loan not found".to_string(),
        ),

        // 422 Unprocessable Entity - ビジネスルール違反
        LoanApplicationError::MemberNotFound => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "MEMBER_NOT_FOUND",
            "Member not found".to_string(),
        ),
        LoanApplicationError::BookNotAvailable => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "BOOK_NOT_AVAILABLE",
            "Book is not available for loan".to_string(),
        ),
        LoanApplicationError::Transition(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_TRANSITION",
            e.to_string(),
        ),

        LoanApplicationError::Commit(e) => map_commit_error(e),

        // 500 Internal Server Error
        LoanApplicationError::RepositoryError(e) => internal("REPOSITORY_ERROR", e.as_ref()),
        LoanApplicationError::MemberServiceError(e) => {
            internal("MEMBER_SERVICE_ERROR", e.as_ref())
        }
        LoanApplicationError::BookServiceError(e) => internal("BOOK_SERVICE_ERROR", e.as_ref()),
    }
}

fn map_status_update_error(err: &StatusUpdateError) -> Mapped {
    match err {
        StatusUpdateError::NotFound { kind } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{} not found", kind),
        ),
        StatusUpdateError::MemberNotFound => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "MEMBER_NOT_FOUND",
            "Member not found".to_string(),
        ),
        StatusUpdateError::UnknownAction(msg) => {
            (StatusCode::BAD_REQUEST, "UNKNOWN_ACTION", msg.clone())
        }
        StatusUpdateError::Transition(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_TRANSITION",
            e.to_string(),
        ),
        StatusUpdateError::Commit(e) => map_commit_error(e),
        StatusUpdateError::RepositoryError(e) => internal("REPOSITORY_ERROR", e.as_ref()),
        StatusUpdateError::MemberServiceError(e) => internal("MEMBER_SERVICE_ERROR", e.as_ref()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::Loan(e) => map_loan_error(e),
            ApiError::StatusUpdate(e) => map_status_update_error(e),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
