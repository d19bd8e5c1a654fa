//! Email delivery of loan, reservation and order notifications over SMTP

use crate::config::EmailConfig;
use crate::domain::{loan::Loan, order::Order, reservation::Reservation};
use crate::ports::member_service::Recipient;
use crate::ports::notification_service::{
    NotificationKind, NotificationService as NotificationServiceTrait, Result,
};
use async_trait::async_trait;
use lettre::{
    Address, Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

/// A rendered email
struct Email {
    subject: String,
    body: String,
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

fn render_loan(kind: NotificationKind, to: &Recipient, loan: &Loan, title: &str) -> Email {
    let due = loan
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "to be decided".to_string());
    let (subject, line) = match kind {
        NotificationKind::LoanRequestReceived => (
            format!("We received your request for \"{}\"", title),
            "Your loan request has been received and is waiting for review.".to_string(),
        ),
        NotificationKind::LoanApproved => (
            format!("Your loan of \"{}\" was approved", title),
            format!("Your loan request was approved. Due date: {}.", due),
        ),
        NotificationKind::LoanStarted => (
            format!("Your loan of \"{}\" has started", title),
            format!("Enjoy your book. Please return it by {}.", due),
        ),
        NotificationKind::LoanReturned => (
            format!("Thank you for returning \"{}\"", title),
            "We have recorded the return of your book.".to_string(),
        ),
        NotificationKind::LoanOverdue => (
            format!("\"{}\" is overdue", title),
            format!("Your loan was due on {}. Please return the book as soon as possible.", due),
        ),
        _ => (
            format!("Update on your loan of \"{}\"", title),
            format!("Your loan is now {}.", loan.status),
        ),
    };
    Email {
        subject,
        body: format!("Hello {},\n\n{}\n", to.display_name, line),
    }
}

fn render_reservation(
    kind: NotificationKind,
    to: &Recipient,
    reservation: &Reservation,
    title: &str,
    reason: Option<&str>,
) -> Email {
    let (subject, line) = match kind {
        NotificationKind::ReservationReceived => (
            format!("Reservation received for \"{}\"", title),
            "We will let you know when it is confirmed.".to_string(),
        ),
        NotificationKind::ReservationConfirmed => (
            format!("Reservation confirmed for \"{}\"", title),
            "Your place in the queue is confirmed.".to_string(),
        ),
        NotificationKind::ReservationReady => (
            format!("\"{}\" is ready for pickup", title),
            "Your reserved book is waiting for you at the desk.".to_string(),
        ),
        NotificationKind::ReservationCancelled => (
            format!("Reservation cancelled for \"{}\"", title),
            format!("Reason: {}", reason.unwrap_or("none given")),
        ),
        _ => (
            format!("Update on your reservation of \"{}\"", title),
            format!("Your reservation is now {}.", reservation.status),
        ),
    };
    Email {
        subject,
        body: format!("Hello {},\n\n{}\n", to.display_name, line),
    }
}

fn render_order(kind: NotificationKind, to: &Recipient, order: &Order, reason: Option<&str>) -> Email {
    let reference = order.order_id.to_string();
    let (subject, line) = match kind {
        NotificationKind::OrderReceived => (
            format!("Order {} received", reference),
            format!("Total: {}", format_cents(order.total_cents)),
        ),
        NotificationKind::OrderPaid => (
            format!("Payment received for order {}", reference),
            "We are preparing your order.".to_string(),
        ),
        NotificationKind::OrderShipped => (
            format!("Order {} has shipped", reference),
            "Your order is on its way.".to_string(),
        ),
        NotificationKind::OrderDelivered => (
            format!("Order {} delivered", reference),
            "Your order has been delivered.".to_string(),
        ),
        NotificationKind::OrderCancelled => (
            format!("Order {} cancelled", reference),
            format!("Reason: {}", reason.unwrap_or("none given")),
        ),
        _ => (
            format!("Update on order {}", reference),
            format!("Your order is now {}.", order.status),
        ),
    };
    Email {
        subject,
        body: format!("Hello {},\n\n{}\n", to.display_name, line),
    }
}

/// SMTP implementation of NotificationService
///
/// `lettre`'s SMTP transport is blocking, so every send runs on the blocking pool.
#[derive(Clone)]
pub struct NotificationService {
    config: EmailConfig,
}

impl NotificationService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, to: &Recipient, email: &Email) -> Result<Message> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Rusty Library");
        let from = Mailbox::new(
            Some(from_name.to_string()),
            self.config.smtp_from.parse::<Address>()?,
        );
        let to = Mailbox::new(Some(to.display_name.clone()), to.email.parse::<Address>()?);

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?)
    }

    fn build_transport(&self) -> Result<SmtpTransport> {
        let builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };
        Ok(builder.build())
    }

    async fn deliver(&self, kind: NotificationKind, to: &Recipient, email: Email) -> Result<()> {
        if !self.config.enabled {
            tracing::info!(%kind, email = %to.email, subject = %email.subject, "email disabled, not sending");
            return Ok(());
        }

        let message = self.build_message(to, &email)?;
        let transport = self.build_transport()?;
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;

        tracing::info!(%kind, email = %to.email, "email sent");
        Ok(())
    }
}

#[async_trait]
impl NotificationServiceTrait for NotificationService {
    async fn send_loan_request_received(&self, to: &Recipient, loan: &Loan, book_title: &str) -> Result<()> {
        let kind = NotificationKind::LoanRequestReceived;
        self.deliver(kind, to, render_loan(kind, to, loan, book_title)).await
    }

    async fn send_new_loan_request(
        &self,
        admin: &Recipient,
        loan: &Loan,
        book_title: &str,
        borrower_name: &str,
    ) -> Result<()> {
        let email = Email {
            subject: format!("New loan request: \"{}\"", book_title),
            body: format!(
                "Hello {},\n\n{} asked to borrow \"{}\" (loan {}). Please review the request.\n",
                admin.display_name, borrower_name, book_title, loan.loan_id
            ),
        };
        self.deliver(NotificationKind::NewLoanRequest, admin, email).await
    }

    async fn send_loan_approved(&self, to: &Recipient, loan: &Loan, book_title: &str) -> Result<()> {
        let kind = NotificationKind::LoanApproved;
        self.deliver(kind, to, render_loan(kind, to, loan, book_title)).await
    }

    async fn send_loan_rejected(
        &self,
        to: &Recipient,
        _loan: &Loan,
        book_title: &str,
        reason: &str,
    ) -> Result<()> {
        let email = Email {
            subject: format!("Your loan request for \"{}\" was declined", book_title),
            body: format!(
                "Hello {},\n\nUnfortunately your request could not be accepted.\nReason: {}\n",
                to.display_name, reason
            ),
        };
        self.deliver(NotificationKind::LoanRejected, to, email).await
    }

    async fn send_loan_started(&self, to: &Recipient, loan: &Loan, book_title: &str) -> Result<()> {
        let kind = NotificationKind::LoanStarted;
        self.deliver(kind, to, render_loan(kind, to, loan, book_title)).await
    }

    async fn send_loan_returned(&self, to: &Recipient, loan: &Loan, book_title: &str) -> Result<()> {
        let kind = NotificationKind::LoanReturned;
        self.deliver(kind, to, render_loan(kind, to, loan, book_title)).await
    }

    async fn send_loan_overdue(&self, to: &Recipient, loan: &Loan, book_title: &str) -> Result<()> {
        let kind = NotificationKind::LoanOverdue;
        self.deliver(kind, to, render_loan(kind, to, loan, book_title)).await
    }

    async fn send_due_soon_reminder(
        &self,
        to: &Recipient,
        _loan: &Loan,
        book_title: &str,
        days_remaining: i64,
    ) -> Result<()> {
        let when = match days_remaining {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {} days", n),
        };
        let email = Email {
            subject: format!("\"{}\" is due {}", book_title, when),
            body: format!(
                "Hello {},\n\nA friendly reminder that \"{}\" is due {}.\n",
                to.display_name, book_title, when
            ),
        };
        self.deliver(NotificationKind::LoanDueSoon, to, email).await
    }

    async fn send_reservation_received(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        book_title: &str,
    ) -> Result<()> {
        let kind = NotificationKind::ReservationReceived;
        self.deliver(kind, to, render_reservation(kind, to, reservation, book_title, None))
            .await
    }

    async fn send_reservation_confirmed(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        book_title: &str,
    ) -> Result<()> {
        let kind = NotificationKind::ReservationConfirmed;
        self.deliver(kind, to, render_reservation(kind, to, reservation, book_title, None))
            .await
    }

    async fn send_reservation_ready(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        book_title: &str,
    ) -> Result<()> {
        let kind = NotificationKind::ReservationReady;
        self.deliver(kind, to, render_reservation(kind, to, reservation, book_title, None))
            .await
    }

    async fn send_reservation_cancelled(
        &self,
        to: &Recipient,
        reservation: &Reservation,
        book_title: &str,
        reason: &str,
    ) -> Result<()> {
        let kind = NotificationKind::ReservationCancelled;
        let email = render_reservation(kind, to, reservation, book_title, Some(reason));
        self.deliver(kind, to, email).await
    }

    async fn send_order_received(&self, to: &Recipient, order: &Order) -> Result<()> {
        let kind = NotificationKind::OrderReceived;
        self.deliver(kind, to, render_order(kind, to, order, None)).await
    }

    async fn send_order_paid(&self, to: &Recipient, order: &Order) -> Result<()> {
        let kind = NotificationKind::OrderPaid;
        self.deliver(kind, to, render_order(kind, to, order, None)).await
    }

    async fn send_order_shipped(&self, to: &Recipient, order: &Order) -> Result<()> {
        let kind = NotificationKind::OrderShipped;
        self.deliver(kind, to, render_order(kind, to, order, None)).await
    }

    async fn send_order_delivered(&self, to: &Recipient, order: &Order) -> Result<()> {
        let kind = NotificationKind::OrderDelivered;
        self.deliver(kind, to, render_order(kind, to, order, None)).await
    }

    async fn send_order_cancelled(&self, to: &Recipient, order: &Order, reason: &str) -> Result<()> {
        let kind = NotificationKind::OrderCancelled;
        self.deliver(kind, to, render_order(kind, to, order, Some(reason)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookId, MemberId, loan};
    use chrono::{NaiveDate, Utc};

    fn recipient() -> Recipient {
        Recipient {
            member_id: MemberId::new(),
            display_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn test_overdue_email_mentions_due_date() {
        let mut loan = loan::request_loan(BookId::new(), MemberId::new(), Utc::now());
        loan.due_date = NaiveDate::from_ymd_opt(2025, 3, 9);

        let email = render_loan(NotificationKind::LoanOverdue, &recipient(), &loan, "Dune");

        assert_eq!(email.subject, "\"Dune\" is overdue");
        assert!(email.body.contains("2025-03-09"));
        assert!(email.body.starts_with("Hello Ada"));
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(2_450), "24.50");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-5), "-0.05");
        assert_eq!(format_cents(-2_450), "-24.50");
    }

    #[test]
    fn test_message_accepts_display_name_with_comma() {
        let service = NotificationService::new(EmailConfig {
            smtp_from_name: Some("Library, Main Branch".to_string()),
            ..EmailConfig::default()
        });
        let to = Recipient {
            display_name: "Yamada, Hanako".to_string(),
            ..recipient()
        };
        let email = Email {
            subject: "Hello".to_string(),
            body: "Body".to_string(),
        };

        let message = service.build_message(&to, &email).unwrap();

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Yamada"));
        assert!(formatted.contains("<ada@example.com>"));
    }

    #[test]
    fn test_message_rejects_invalid_address() {
        let service = NotificationService::new(EmailConfig::default());
        let to = Recipient {
            email: "not-an-address".to_string(),
            ..recipient()
        };
        let email = Email {
            subject: "Hello".to_string(),
            body: "Body".to_string(),
        };

        assert!(service.build_message(&to, &email).is_err());
    }

    #[tokio::test]
    async fn test_disabled_service_does_not_connect() {
        let service = NotificationService::new(EmailConfig::default());
        let loan = loan::request_loan(BookId::new(), MemberId::new(), Utc::now());

        let result = service
            .send_loan_request_received(&recipient(), &loan, "Dune")
            .await;

        assert!(result.is_ok());
    }
}
