use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use super::loan::LoanStatus;

/// 貸出に対する操作（エラーメッセージ用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Approve,
    Reject,
    AssignDueDate,
    Activate,
    Return,
    MarkOverdue,
}

impl LoanAction {
    /// 操作を受け付ける状態の説明
    pub fn expected_state(&self) -> &'static str {
        match self {
            LoanAction::Approve | LoanAction::Reject => "pending",
            LoanAction::AssignDueDate => "pending or approved",
            LoanAction::Activate => "approved",
            LoanAction::Return => "active or overdue",
            LoanAction::MarkOverdue => "active",
        }
    }
}

impl fmt::Display for LoanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            LoanAction::Approve => "approve",
            LoanAction::Reject => "reject",
            LoanAction::AssignDueDate => "set the due date of",
            LoanAction::Activate => "activate",
            LoanAction::Return => "return",
            LoanAction::MarkOverdue => "mark as overdue",
        };
        f.write_str(verb)
    }
}

/// 貸出の状態遷移エラー
///
/// 呼び出し側の使い方の誤りを表すため、リトライせずにそのまま返す。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanTransitionError {
    /// 状態遷移グラフにない遷移
    #[error("cannot {action} a loan that is not {} (current status: {from})", .action.expected_state())]
    InvalidTransition { action: LoanAction, from: LoanStatus },

    /// 返却期限が未設定のまま貸出開始しようとした
    #[error("cannot activate a loan without a due date")]
    MissingDueDate,

    /// 返却期限をまだ過ぎていない
    #[error("loan is not overdue yet: due {due_date}, checked as of {as_of}")]
    NotYetDue { due_date: NaiveDate, as_of: NaiveDate },
}

/// 予約・注文の状態遷移エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move {kind} from {from} to {to}")]
pub struct TransitionError {
    pub kind: &'static str,
    pub from: String,
    pub to: String,
}

impl TransitionError {
    pub fn new(kind: &'static str, from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self {
            kind,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
