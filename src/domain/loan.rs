use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{
    BookId, ChangeSet, Entity, LoanAction, LoanId, LoanTransitionError, MemberId, StaffId,
    StatusChange,
};

/// 却下理由が指定されなかった場合の既定文言
pub const DEFAULT_REJECTION_REASON: &str = "No reason was provided.";

/// 貸出ステータス
///
/// 状態遷移グラフ：
/// - Requested → Approved → Active → Returned
/// - Requested → Cancelled
/// - Active → Overdue → Returned
///
/// Returned と Cancelled は終端状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// 貸出申請中
    Requested,
    /// 承認済み（未開始）
    Approved,
    /// 貸出中
    Active,
    /// 延滞中
    Overdue,
    /// 返却済み
    Returned,
    /// 却下・取消
    Cancelled,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Requested => "requested",
            LoanStatus::Approved => "approved",
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
            LoanStatus::Cancelled => "cancelled",
        }
    }

    /// 終端状態か（これ以上遷移しない）
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Returned | LoanStatus::Cancelled)
    }

    /// 状態遷移グラフ上で `next` へ遷移できるか
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (*self, next),
            (Requested, Approved)
                | (Requested, Cancelled)
                | (Approved, Active)
                | (Active, Returned)
                | (Active, Overdue)
                | (Overdue, Returned)
        )
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(LoanStatus::Requested),
            "approved" => Ok(LoanStatus::Approved),
            "active" => Ok(LoanStatus::Active),
            "overdue" => Ok(LoanStatus::Overdue),
            "returned" => Ok(LoanStatus::Returned),
            "cancelled" => Ok(LoanStatus::Cancelled),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// Loan集約 - 1冊の書籍の1回の貸出
///
/// 遷移関数はこの構造体をその場で書き換える。
/// 永続化は呼び出し側（コミットパイプライン）の責務。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    // 識別子
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ）
    pub book_id: BookId,
    pub member_id: MemberId,

    // 貸出管理の責務
    pub status: LoanStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<StaffId>,
    pub loan_start_date: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub returned_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,

    // 永続化の管理情報
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Loan {
    type Id = LoanId;
    type Status = LoanStatus;

    const KIND: &'static str = "loan";

    fn id(&self) -> LoanId {
        self.loan_id
    }

    fn uuid(&self) -> Uuid {
        self.loan_id.value()
    }

    fn status(&self) -> LoanStatus {
        self.status
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn diff(before: &Self, after: &Self) -> ChangeSet<LoanStatus> {
        let mut changes = ChangeSet::new();
        changes.record_status(before.status, after.status);
        changes.record("approved_at", &before.approved_at, &after.approved_at);
        changes.record("approved_by", &before.approved_by, &after.approved_by);
        changes.record(
            "loan_start_date",
            &before.loan_start_date,
            &after.loan_start_date,
        );
        changes.record("due_date", &before.due_date, &after.due_date);
        changes.record("returned_at", &before.returned_at, &after.returned_at);
        changes.record("notes", &before.notes, &after.notes);
        changes
    }
}

/// 純粋関数：貸出を申請する
///
/// 状態はRequested。返却期限は承認・開始時に職員が決める。
pub fn request_loan(book_id: BookId, member_id: MemberId, requested_at: DateTime<Utc>) -> Loan {
    Loan {
        loan_id: LoanId::new(),
        book_id,
        member_id,
        status: LoanStatus::Requested,
        requested_at,
        approved_at: None,
        approved_by: None,
        loan_start_date: None,
        due_date: None,
        returned_at: None,
        notes: None,
        version: 0,
        updated_at: requested_at,
    }
}

fn transition(
    loan: &mut Loan,
    action: LoanAction,
    next: LoanStatus,
    now: DateTime<Utc>,
) -> Result<StatusChange<LoanStatus>, LoanTransitionError> {
    if !loan.status.can_transition_to(next) {
        return Err(LoanTransitionError::InvalidTransition {
            action,
            from: loan.status,
        });
    }

    let change = StatusChange::new(loan.status, next);
    loan.status = next;
    loan.updated_at = now;
    Ok(change)
}

/// 貸出を承認する
///
/// Requested からのみ可能。承認日時と承認した職員を記録する。
pub fn approve(
    loan: &mut Loan,
    actor: StaffId,
    now: DateTime<Utc>,
) -> Result<StatusChange<LoanStatus>, LoanTransitionError> {
    let change = transition(loan, LoanAction::Approve, LoanStatus::Approved, now)?;
    loan.approved_at = Some(now);
    loan.approved_by = Some(actor);
    Ok(change)
}

/// 貸出申請を却下する
///
/// Requested からのみ可能。理由は notes に保存し、未指定（空白のみを含む）なら既定文言を使う。
pub fn reject(
    loan: &mut Loan,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<StatusChange<LoanStatus>, LoanTransitionError> {
    let change = transition(loan, LoanAction::Reject, LoanStatus::Cancelled, now)?;
    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REJECTION_REASON);
    loan.notes = Some(reason.to_string());
    Ok(change)
}

/// 返却期限を設定する
///
/// 貸出開始前（Requested / Approved）のみ変更可能。
pub fn assign_due_date(
    loan: &mut Loan,
    due_date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(), LoanTransitionError> {
    if !matches!(loan.status, LoanStatus::Requested | LoanStatus::Approved) {
        return Err(LoanTransitionError::InvalidTransition {
            action: LoanAction::AssignDueDate,
            from: loan.status,
        });
    }
    loan.due_date = Some(due_date);
    loan.updated_at = now;
    Ok(())
}

/// 貸出を開始する
///
/// 返却期限の有無を状態より先に確認する。
/// loan_start_date が未設定の場合のみ now を設定する。
pub fn activate(
    loan: &mut Loan,
    now: DateTime<Utc>,
) -> Result<StatusChange<LoanStatus>, LoanTransitionError> {
    if loan.due_date.is_none() {
        return Err(LoanTransitionError::MissingDueDate);
    }
    let change = transition(loan, LoanAction::Activate, LoanStatus::Active, now)?;
    if loan.loan_start_date.is_none() {
        loan.loan_start_date = Some(now);
    }
    Ok(change)
}

/// 書籍の返却を記録する
///
/// Active / Overdue から可能（延滞していても返却は受け付ける）。
pub fn mark_returned(
    loan: &mut Loan,
    now: DateTime<Utc>,
) -> Result<StatusChange<LoanStatus>, LoanTransitionError> {
    let change = transition(loan, LoanAction::Return, LoanStatus::Returned, now)?;
    loan.returned_at = Some(now);
    Ok(change)
}

/// 延滞状態にする
///
/// Active かつ as_of が返却期限より後の場合のみ可能。
/// 時計を持たないため自動では起きない。延滞検出バッチが明示的に呼ぶ。
pub fn mark_overdue(
    loan: &mut Loan,
    as_of: NaiveDate,
    now: DateTime<Utc>,
) -> Result<StatusChange<LoanStatus>, LoanTransitionError> {
    if loan.status != LoanStatus::Active {
        return Err(LoanTransitionError::InvalidTransition {
            action: LoanAction::MarkOverdue,
            from: loan.status,
        });
    }
    let due_date = loan.due_date.ok_or(LoanTransitionError::MissingDueDate)?;
    if as_of <= due_date {
        return Err(LoanTransitionError::NotYetDue { due_date, as_of });
    }
    transition(loan, LoanAction::MarkOverdue, LoanStatus::Overdue, now)
}

/// 純粋関数：返却期限までの日数（期限当日は0、過ぎていれば負）
pub fn days_until_due(loan: &Loan, today: NaiveDate) -> Option<i64> {
    loan.due_date.map(|due| (due - today).num_days())
}

/// 純粋関数：延滞判定
///
/// 貸出中（Active）で返却期限を過ぎているかを判定する。既にOverdueのものは対象外。
pub fn is_overdue(loan: &Loan, today: NaiveDate) -> bool {
    loan.status == LoanStatus::Active && loan.due_date.is_some_and(|due| today > due)
}
