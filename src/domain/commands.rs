use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, MemberId, StaffId};

/// コマンド：貸出を申請する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLoan {
    pub book_id: BookId,
    pub member_id: MemberId,
}

/// コマンド：貸出申請を承認する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveLoan {
    pub loan_id: LoanId,
    pub staff_id: StaffId,
    /// 承認と同時に返却期限を決める場合に指定
    pub due_date: Option<NaiveDate>,
}

/// コマンド：貸出申請を却下する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectLoan {
    pub loan_id: LoanId,
    pub staff_id: StaffId,
    pub reason: Option<String>,
}

/// コマンド：貸出を開始する（書籍の受け渡し）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateLoan {
    pub loan_id: LoanId,
    pub staff_id: StaffId,
    pub due_date: Option<NaiveDate>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub staff_id: StaffId,
}
