use crate::domain::{loan::Loan, order::Order, reservation::Reservation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::member_service::Recipient;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 通知テンプレートの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LoanRequestReceived,
    NewLoanRequest,
    LoanApproved,
    LoanRejected,
    LoanStarted,
    LoanReturned,
    LoanOverdue,
    LoanDueSoon,
    ReservationReceived,
    ReservationConfirmed,
    ReservationReady,
    ReservationCancelled,
    OrderReceived,
    OrderPaid,
    OrderShipped,
    OrderDelivered,
    OrderCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LoanRequestReceived => "loan_request_received",
            NotificationKind::NewLoanRequest => "new_loan_request",
            NotificationKind::LoanApproved => "loan_approved",
            NotificationKind::LoanRejected => "loan_rejected",
            NotificationKind::LoanStarted => "loan_started",
            NotificationKind::LoanReturned => "loan_returned",
            NotificationKind::LoanOverdue => "loan_overdue",
            NotificationKind::LoanDueSoon => "loan_due_soon",
            NotificationKind::ReservationReceived => "reservation_received",
            NotificationKind::ReservationConfirmed => "reservation_confirmed",
            NotificationKind::ReservationReady => "reservation_ready",
            NotificationKind::ReservationCancelled => "reservation_cancelled",
            NotificationKind::OrderReceived => "order_received",
            NotificationKind::OrderPaid => "order_paid",
            NotificationKind::OrderShipped => "order_shipped",
            NotificationKind::OrderDelivered => "order_delivered",
            NotificationKind::OrderCancelled => "order_cancelled",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 通知サービスポート
///
/// 会員・管理者への通知配信メカニズムを抽象化する。
/// テンプレートごとに1メソッド。失敗は呼び出し側で記録され、他の通知には影響しない。
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 貸出申請の受付を借り手に通知する
    async fn send_loan_request_received(
        &self,
        to: &Recipient,
        loan: &Loan,
        book_title: &str,
    ) -> Result<()>;

    /// 新しい貸出申請を管理者に通知する
    async fn send_new_loan_request(
        &self,
        admin: &Recipient,
        loan: &Loan,
        book_title: &str,
        borrower_name: &str,
    ) -> Result<()>;

    async fn send_loan_approved(&self, to: &Recipient, loan: &Loan, book_title: &str)
    -> Result<()>;

    async fn send_loan_rejected(
        &self,
        to: &Recipient,
        loan: &Loan,
        book_title: &str,
        reason: &str,
    ) -> Result<()>;

    async fn send_loan_started(&self, to: &Recipient, loan: &Loan, book_title: &str)
    -> Result<()>;

    async fn send_loan_returned(
        &self,
        to: &Recipient,
        loan: &Loan,
        book_title: &str,
    ) -> Result<()>;

    async fn send_loan_overdue(&self, to: &Recipient, loan: &Loan, book_title: &str)
    -> Result<()>;

    /// 返却期限が近いことを通知する
    ///
    /// `days_remaining` は期限当日なら0。
    async fn send_due_soon_reminder(
        &self,
        to: &Recipient,
        loan: &Loan,
        book_title: &str,
        days_remaining: i64,
    ) -> Result<()>;

    async fn send_reservation_received(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        book_title: &str,
    ) -> Result<()>;

    async fn send_reservation_confirmed(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        book_title: &str,
    ) -> Result<()>;

    /// 予約した書籍の受け取り準備ができたことを通知する
    async fn send_reservation_ready(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        book_title: &str,
    ) -> Result<()>;

    async fn send_reservation_cancelled(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        book_title: &str,
        reason: &str,
    ) -> Result<()>;

    async fn send_order_received(&self, to: &Recipient, order: &Order) -> Result<()>;

    async fn send_order_paid(&self, to: &Recipient, order: &Order) -> Result<()>;

    async fn send_order_shipped(&self, to: &Recipient, order: &Order) -> Result<()>;

    async fn send_order_delivered(&self, to: &Recipient, order: &Order) -> Result<()>;

    async fn send_order_cancelled(&self, to: &Recipient, order: &Order, reason: &str)
    -> Result<()>;
}
