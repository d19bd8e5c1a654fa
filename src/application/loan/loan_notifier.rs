use crate::application::commit::{CommitContext, CommitObserver};
use crate::application::delivery::{lookup_contact, lookup_title, report_delivery};
use crate::domain::{
    ChangeSet,
    loan::{DEFAULT_REJECTION_REASON, Loan, LoanStatus},
};
use crate::ports::*;
use async_trait::async_trait;
use std::sync::Arc;

/// 貸出のステータス遷移に応じて通知を送るオブザーバー
///
/// 遷移後のステータスで送る通知を決める：
/// - Approved → 承認
/// - Cancelled（Requested から）→ 却下（理由は notes、なければ既定文言）
/// - Active → 貸出開始
/// - Returned → 返却
/// - Overdue → 延滞
///
/// 新規作成時は借り手に受付通知、管理者全員に新規申請通知を送る。
/// 各通知は独立して送信し、失敗は記録するだけで再送しない。貸出は変更しない。
pub struct LoanNotifier {
    member_service: Arc<dyn MemberService>,
    book_service: Arc<dyn BookService>,
    notification_service: Arc<dyn NotificationService>,
}

impl LoanNotifier {
    pub fn new(
        member_service: Arc<dyn MemberService>,
        book_service: Arc<dyn BookService>,
        notification_service: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            member_service,
            book_service,
            notification_service,
        }
    }

    async fn borrower(&self, loan: &Loan) -> Option<Recipient> {
        lookup_contact(self.member_service.as_ref(), loan.member_id).await
    }

    async fn title(&self, loan: &Loan) -> String {
        lookup_title(self.book_service.as_ref(), loan.book_id).await
    }

    async fn notify_created(&self, loan: &Loan) {
        let title = self.title(loan).await;
        let borrower = self.borrower(loan).await;

        if let Some(to) = &borrower {
            let result = self
                .notification_service
                .send_loan_request_received(to, loan, &title)
                .await;
            report_delivery(
                NotificationKind::LoanRequestReceived,
                &to.email,
                loan.loan_id,
                result,
            );
        }

        let admins = match self.member_service.list_administrators().await {
            Ok(admins) => admins,
            Err(e) => {
                tracing::warn!(loan_id = %loan.loan_id, error = %e, "failed to list administrators");
                return;
            }
        };
        let borrower_name = borrower
            .as_ref()
            .map(|b| b.display_name.as_str())
            .unwrap_or("A member");
        for admin in &admins {
            let result = self
                .notification_service
                .send_new_loan_request(admin, loan, &title, borrower_name)
                .await;
            report_delivery(
                NotificationKind::NewLoanRequest,
                &admin.email,
                loan.loan_id,
                result,
            );
        }
    }

    async fn notify_transition(&self, loan: &Loan, from: LoanStatus, to_status: LoanStatus) {
        let kind = match (from, to_status) {
            (_, LoanStatus::Approved) => NotificationKind::LoanApproved,
            (LoanStatus::Requested, LoanStatus::Cancelled) => NotificationKind::LoanRejected,
            (_, LoanStatus::Active) => NotificationKind::LoanStarted,
            (_, LoanStatus::Returned) => NotificationKind::LoanReturned,
            (_, LoanStatus::Overdue) => NotificationKind::LoanOverdue,
            _ => return,
        };

        let Some(to) = self.borrower(loan).await else {
            return;
        };
        let title = self.title(loan).await;
        let sender = &self.notification_service;

        let result = match kind {
            NotificationKind::LoanApproved => sender.send_loan_approved(&to, loan, &title).await,
            NotificationKind::LoanRejected => {
                let reason = loan.notes.as_deref().unwrap_or(DEFAULT_REJECTION_REASON);
                sender.send_loan_rejected(&to, loan, &title, reason).await
            }
            NotificationKind::LoanStarted => sender.send_loan_started(&to, loan, &title).await,
            NotificationKind::LoanReturned => sender.send_loan_returned(&to, loan, &title).await,
            _ => sender.send_loan_overdue(&to, loan, &title).await,
        };
        report_delivery(kind, &to.email, loan.loan_id, result);
    }
}

#[async_trait]
impl CommitObserver<Loan> for LoanNotifier {
    async fn on_created(&self, loan: &Loan, _ctx: &CommitContext) {
        if loan.status == LoanStatus::Requested {
            self.notify_created(loan).await;
        }
    }

    async fn on_committed(&self, loan: &Loan, changes: &ChangeSet<LoanStatus>, _ctx: &CommitContext) {
        if let Some(change) = changes.status_change() {
            self.notify_transition(loan, change.from, change.to).await;
        }
    }
}
