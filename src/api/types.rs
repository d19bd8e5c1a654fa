use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::loan::ReminderReport;
use crate::domain::{
    commands::*,
    loan::{Loan, LoanStatus},
    order::Order,
    reservation::Reservation,
    value_objects::*,
};

// ============================================================================
// Loans
// ============================================================================

/// POST /loans のリクエストボディ
#[derive(Debug, Deserialize, Serialize)]
pub struct RequestLoanRequest {
    pub book_id: Uuid,
    pub member_id: Uuid,
}

impl RequestLoanRequest {
    pub fn to_command(&self) -> RequestLoan {
        RequestLoan {
            book_id: BookId::from_uuid(self.book_id),
            member_id: MemberId::from_uuid(self.member_id),
        }
    }
}

/// POST /loans/:id/approve
#[derive(Debug, Deserialize, Serialize)]
pub struct ApproveLoanRequest {
    pub staff_id: Uuid,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// POST /loans/:id/reject
#[derive(Debug, Deserialize, Serialize)]
pub struct RejectLoanRequest {
    pub staff_id: Uuid,
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /loans/:id/activate
#[derive(Debug, Deserialize, Serialize)]
pub struct ActivateLoanRequest {
    pub staff_id: Uuid,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// POST /loans/:id/return
#[derive(Debug, Deserialize, Serialize)]
pub struct ReturnLoanRequest {
    pub staff_id: Uuid,
}

/// 貸出一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    /// 会員IDでフィルタリング（必須）
    pub member_id: Option<Uuid>,
    /// ステータスでフィルタリング
    pub status: Option<String>,
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub status: LoanStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub loan_start_date: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub returned_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            loan_id: loan.loan_id.value(),
            book_id: loan.book_id.value(),
            member_id: loan.member_id.value(),
            status: loan.status,
            requested_at: loan.requested_at,
            approved_at: loan.approved_at,
            approved_by: loan.approved_by.map(|s| s.value()),
            loan_start_date: loan.loan_start_date,
            due_date: loan.due_date,
            returned_at: loan.returned_at,
            notes: loan.notes,
            updated_at: loan.updated_at,
        }
    }
}

// ============================================================================
// Reservations and orders
// ============================================================================

/// POST /reservations
#[derive(Debug, Deserialize, Serialize)]
pub struct PlaceReservationRequest {
    pub book_id: Uuid,
    pub member_id: Uuid,
}

/// 予約・注文のステータス操作のリクエストボディ（省略可）
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StatusActionRequest {
    #[serde(default)]
    pub staff_id: Option<Uuid>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub reservation_id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub status: String,
    pub reserved_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            reservation_id: reservation.reservation_id.value(),
            book_id: reservation.book_id.value(),
            member_id: reservation.member_id.value(),
            status: reservation.status.as_str().to_string(),
            reserved_at: reservation.reserved_at,
            notes: reservation.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub member_id: Uuid,
    pub status: String,
    pub total_cents: i64,
    pub notes: Option<String>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id.value(),
            member_id: order.member_id.value(),
            status: order.status.as_str().to_string(),
            total_cents: order.total_cents,
            notes: order.notes,
        }
    }
}

// ============================================================================
// Admin
// ============================================================================

/// POST /admin/loan-reminders
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReminderRunRequest {
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReminderRunResponse {
    pub reminders_sent: usize,
    pub loans_transitioned: usize,
    pub failures: usize,
    pub dry_run: bool,
}

impl ReminderRunResponse {
    pub fn new(report: ReminderReport, dry_run: bool) -> Self {
        Self {
            reminders_sent: report.reminders_sent,
            loans_transitioned: report.loans_transitioned,
            failures: report.failures,
            dry_run,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// ステータスクエリパラメータのパースとバリデーション
pub fn parse_status_filter(status: &str) -> Result<LoanStatus, String> {
    status.parse::<LoanStatus>()
}
