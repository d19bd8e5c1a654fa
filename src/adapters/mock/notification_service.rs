use crate::domain::{loan::Loan, order::Order, reservation::Reservation};
use crate::ports::member_service::Recipient;
use crate::ports::notification_service::{
    NotificationKind, NotificationService as NotificationServiceTrait, Result,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

/// A notification captured by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub kind: NotificationKind,
    pub email: String,
    pub entity_id: Uuid,
    /// Reason or days remaining, depending on the kind
    pub detail: Option<String>,
}

/// Mock implementation of NotificationService
///
/// Records every successful send instead of delivering it.
/// Sends to selected addresses can be made to fail.
pub struct NotificationService {
    sent: Mutex<Vec<SentNotification>>,
    failing_recipients: Mutex<HashSet<String>>,
}

impl NotificationService {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_recipients: Mutex::new(HashSet::new()),
        }
    }

    /// Make every send to `email` fail
    pub fn fail_for(&self, email: &str) {
        self.failing_recipients
            .lock()
            .unwrap()
            .insert(email.to_string());
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_of_kind(&self, kind: NotificationKind) -> Vec<SentNotification> {
        self.sent()
            .into_iter()
            .filter(|n| n.kind == kind)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn record(
        &self,
        kind: NotificationKind,
        to: &Recipient,
        entity_id: Uuid,
        detail: Option<String>,
    ) -> Result<()> {
        if self.failing_recipients.lock().unwrap().contains(&to.email) {
            return Err(format!("mailbox unavailable: {}", to.email).into());
        }
        tracing::debug!(%kind, email = %to.email, %entity_id, "mock notification recorded");
        self.sent.lock().unwrap().push(SentNotification {
            kind,
            email: to.email.clone(),
            entity_id,
            detail,
        });
        Ok(())
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationServiceTrait for NotificationService {
    async fn send_loan_request_received(
        &self,
        to: &Recipient,
        loan: &Loan,
        _book_title: &str,
    ) -> Result<()> {
        self.record(
            NotificationKind::LoanRequestReceived,
            to,
            loan.loan_id.value(),
            None,
        )
    }

    async fn send_new_loan_request(
        &self,
        admin: &Recipient,
        loan: &Loan,
        _book_title: &str,
        borrower_name: &str,
    ) -> Result<()> {
        self.record(
            NotificationKind::NewLoanRequest,
            admin,
            loan.loan_id.value(),
            Some(borrower_name.to_string()),
        )
    }

    async fn send_loan_approved(&self, to: &Recipient, loan: &Loan, _book_title: &str) -> Result<()> {
        self.record(NotificationKind::LoanApproved, to, loan.loan_id.value(), None)
    }

    async fn send_loan_rejected(
        &self,
        to: &Recipient,
        loan: &Loan,
        _book_title: &str,
        reason: &str,
    ) -> Result<()> {
        self.record(
            NotificationKind::LoanRejected,
            to,
            loan.loan_id.value(),
            Some(reason.to_string()),
        )
    }

    async fn send_loan_started(&self, to: &Recipient, loan: &Loan, _book_title: &str) -> Result<()> {
        self.record(NotificationKind::LoanStarted, to, loan.loan_id.value(), None)
    }

    async fn send_loan_returned(&self, to: &Recipient, loan: &Loan, _book_title: &str) -> Result<()> {
        self.record(NotificationKind::LoanReturned, to, loan.loan_id.value(), None)
    }

    async fn send_loan_overdue(&self, to: &Recipient, loan: &Loan, _book_title: &str) -> Result<()> {
        self.record(NotificationKind::LoanOverdue, to, loan.loan_id.value(), None)
    }

    async fn send_due_soon_reminder(
        &self,
        to: &Recipient,
        loan: &Loan,
        _book_title: &str,
        days_remaining: i64,
    ) -> Result<()> {
        self.record(
            NotificationKind::LoanDueSoon,
            to,
            loan.loan_id.value(),
            Some(days_remaining.to_string()),
        )
    }

    async fn send_reservation_received(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        _book_title: &str,
    ) -> Result<()> {
        self.record(
            NotificationKind::ReservationReceived,
            to,
            reservation.reservation_id.value(),
            None,
        )
    }

    async fn send_reservation_confirmed(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        _book_title: &str,
    ) -> Result<()> {
        self.record(
            NotificationKind::ReservationConfirmed,
            to,
            reservation.reservation_id.value(),
            None,
        )
    }

    async fn send_reservation_ready(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        _book_title: &str,
    ) -> Result<()> {
        self.record(
            NotificationKind::ReservationReady,
            to,
            reservation.reservation_id.value(),
            None,
        )
    }

    async fn send_reservation_cancelled(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        _book_title: &str,
        reason: &str,
    ) -> Result<()> {
        self.record(
            NotificationKind::ReservationCancelled,
            to,
            reservation.reservation_id.value(),
            Some(reason.to_string()),
        )
    }

    async fn send_order_received(&self, to: &Recipient, order: &Order) -> Result<()> {
        self.record(NotificationKind::OrderReceived, to, order.order_id.value(), None)
    }

    async fn send_order_paid(&self, to: &Recipient, order: &Order) -> Result<()> {
        self.record(NotificationKind::OrderPaid, to, order.order_id.value(), None)
    }

    async fn send_order_shipped(&self, to: &Recipient, order: &Order) -> Result<()> {
        self.record(NotificationKind::OrderShipped, to, order.order_id.value(), None)
    }

    async fn send_order_delivered(&self, to: &Recipient, order: &Order) -> Result<()> {
        self.record(NotificationKind::OrderDelivered, to, order.order_id.value(), None)
    }

    async fn send_order_cancelled(&self, to: &Recipient, order: &Order, reason: &str) -> Result<()> {
        self.record(
            NotificationKind::OrderCancelled,
            to,
            order.order_id.value(),
            Some(reason.to_string()),
        )
    }
}
