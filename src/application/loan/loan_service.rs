use crate::application::commit::{CommitContext, CommitPipeline};
use crate::domain::{
    commands::*,
    loan::{self, Loan, LoanStatus},
    value_objects::*,
};
use crate::ports::*;
use std::sync::Arc;

use super::errors::{LoanApplicationError, Result};

/// 貸出のコミットパイプライン
pub type LoanPipeline = CommitPipeline<Loan, dyn LoanRepository>;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、各サービス関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub loan_pipeline: Arc<LoanPipeline>,
    pub member_service: Arc<dyn MemberService>,
    pub book_service: Arc<dyn BookService>,
    pub notification_service: Arc<dyn NotificationService>,
    pub clock: Arc<dyn Clock>,
}

impl ServiceDependencies {
    pub fn loan_repository(&self) -> &Arc<dyn LoanRepository> {
        self.loan_pipeline.store()
    }
}

/// 貸出を読み込むヘルパー関数
///
/// 戻り値は (遷移前のスナップショット, 書き換え用のコピー)。
async fn load_loan(deps: &ServiceDependencies, loan_id: LoanId) -> Result<(Loan, Loan)> {
    let loan = deps
        .loan_repository()
        .get_by_id(loan_id)
        .await
        .map_err(LoanApplicationError::RepositoryError)?
        .ok_or(LoanApplicationError::LoanNotFound)?;
    Ok((loan.clone(), loan))
}

/// 貸出を申請する
///
/// ビジネスルール：
/// - 会員が存在すること
/// - 書籍が貸出可能であること
///
/// 申請者は会員本人のため、監査上の職員は記録しない。
pub async fn request_loan(deps: &ServiceDependencies, cmd: RequestLoan) -> Result<Loan> {
    let member_exists = deps
        .member_service
        .exists(cmd.member_id)
        .await
        .map_err(LoanApplicationError::MemberServiceError)?;
    if !member_exists {
        return Err(LoanApplicationError::MemberNotFound);
    }

    let is_available = deps
        .book_service
        .is_available_for_loan(cmd.book_id)
        .await
        .map_err(LoanApplicationError::BookServiceError)?;
    if !is_available {
        return Err(LoanApplicationError::BookNotAvailable);
    }

    let now = deps.clock.now();
    let loan = loan::request_loan(cmd.book_id, cmd.member_id, now);
    deps.loan_pipeline
        .create(&loan, &CommitContext::system(now))
        .await?;

    tracing::info!(loan_id = %loan.loan_id, member_id = %loan.member_id, book_id = %loan.book_id, "loan requested");
    Ok(loan)
}

/// 貸出申請を承認する
///
/// 返却期限が指定されていれば同時に設定する。
pub async fn approve_loan(deps: &ServiceDependencies, cmd: ApproveLoan) -> Result<Loan> {
    let (before, mut loan) = load_loan(deps, cmd.loan_id).await?;
    let now = deps.clock.now();

    loan::approve(&mut loan, cmd.staff_id, now)?;
    if let Some(due_date) = cmd.due_date {
        loan::assign_due_date(&mut loan, due_date, now)?;
    }

    deps.loan_pipeline
        .commit(&before, &mut loan, &CommitContext::by(cmd.staff_id, now))
        .await?;

    tracing::info!(loan_id = %loan.loan_id, staff_id = %cmd.staff_id, "loan approved");
    Ok(loan)
}

/// 貸出申請を却下する
pub async fn reject_loan(deps: &ServiceDependencies, cmd: RejectLoan) -> Result<Loan> {
    let (before, mut loan) = load_loan(deps, cmd.loan_id).await?;
    let now = deps.clock.now();

    loan::reject(&mut loan, cmd.reason.as_deref(), now)?;
    deps.loan_pipeline
        .commit(&before, &mut loan, &CommitContext::by(cmd.staff_id, now))
        .await?;

    tracing::info!(loan_id = %loan.loan_id, staff_id = %cmd.staff_id, "loan rejected");
    Ok(loan)
}

/// 貸出を開始する
///
/// 返却期限が指定されていれば先に設定してから開始する。
pub async fn activate_loan(deps: &ServiceDependencies, cmd: ActivateLoan) -> Result<Loan> {
    let (before, mut loan) = load_loan(deps, cmd.loan_id).await?;
    let now = deps.clock.now();

    if let Some(due_date) = cmd.due_date {
        loan::assign_due_date(&mut loan, due_date, now)?;
    }
    loan::activate(&mut loan, now)?;

    deps.loan_pipeline
        .commit(&before, &mut loan, &CommitContext::by(cmd.staff_id, now))
        .await?;

    tracing::info!(loan_id = %loan.loan_id, due_date = ?loan.due_date, "loan activated");
    Ok(loan)
}

/// 書籍の返却を記録する（延滞中でも受け付ける）
pub async fn return_loan(deps: &ServiceDependencies, cmd: ReturnLoan) -> Result<Loan> {
    let (before, mut loan) = load_loan(deps, cmd.loan_id).await?;
    let now = deps.clock.now();

    let change = loan::mark_returned(&mut loan, now)?;
    deps.loan_pipeline
        .commit(&before, &mut loan, &CommitContext::by(cmd.staff_id, now))
        .await?;

    tracing::info!(
        loan_id = %loan.loan_id,
        was_overdue = change.from == LoanStatus::Overdue,
        "loan returned"
    );
    Ok(loan)
}

/// 貸出を取得する
///
/// 期限を過ぎていても読み込み時にOverdueへは遷移させない。延滞検出バッチだけが遷移させる。
pub async fn get_loan(deps: &ServiceDependencies, loan_id: LoanId) -> Result<Loan> {
    deps.loan_repository()
        .get_by_id(loan_id)
        .await
        .map_err(LoanApplicationError::RepositoryError)?
        .ok_or(LoanApplicationError::LoanNotFound)
}

/// 会員の貸出一覧（新しい申請順）。ステータスで絞り込める。
pub async fn list_member_loans(
    deps: &ServiceDependencies,
    member_id: MemberId,
    status: Option<LoanStatus>,
) -> Result<Vec<Loan>> {
    let loans = deps
        .loan_repository()
        .find_by_member_id(member_id)
        .await
        .map_err(LoanApplicationError::RepositoryError)?;

    Ok(loans
        .into_iter()
        .filter(|loan| status.is_none_or(|s| loan.status == s))
        .collect())
}
