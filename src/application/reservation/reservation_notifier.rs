use crate::application::commit::{CommitContext, CommitObserver};
use crate::application::delivery::{lookup_contact, lookup_title, report_delivery};
use crate::domain::{
    ChangeSet,
    loan::DEFAULT_REJECTION_REASON,
    reservation::{Reservation, ReservationStatus},
};
use crate::ports::*;
use async_trait::async_trait;
use std::sync::Arc;

/// 予約のステータス遷移に応じて会員へ通知する
///
/// Completed（受け取り済み）では通知しない。
pub struct ReservationNotifier {
    member_service: Arc<dyn MemberService>,
    book_service: Arc<dyn BookService>,
    notification_service: Arc<dyn NotificationService>,
}

impl ReservationNotifier {
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

    async fn notify(&self, kind: NotificationKind, reservation: &Reservation) {
        let Some(to) = lookup_contact(self.member_service.as_ref(), reservation.member_id).await
        else {
            return;
        };
        let title = lookup_title(self.book_service.as_ref(), reservation.book_id).await;
        let sender = &self.notification_service;

        let result = match kind {
            NotificationKind::ReservationReceived => {
                sender.send_reservation_received(&to, reservation, &title).await
            }
            NotificationKind::ReservationConfirmed => {
                sender.send_reservation_confirmed(&to, reservation, &title).await
            }
            NotificationKind::ReservationReady => {
                sender.send_reservation_ready(&to, reservation, &title).await
            }
            _ => {
                let reason = reservation
                    .notes
                    .as_deref()
                    .unwrap_or(DEFAULT_REJECTION_REASON);
                sender
                    .send_reservation_cancelled(&to, reservation, &title, reason)
                    .await
            }
        };
        report_delivery(kind, &to.email, reservation.reservation_id, result);
    }
}

#[async_trait]
impl CommitObserver<Reservation> for ReservationNotifier {
    async fn on_created(&self, reservation: &Reservation, _ctx: &CommitContext) {
        self.notify(NotificationKind::ReservationReceived, reservation)
            .await;
    }

    async fn on_committed(
        &self,
        reservation: &Reservation,
        changes: &ChangeSet<ReservationStatus>,
        _ctx: &CommitContext,
    ) {
        let kind = match changes.status_change().map(|c| c.to) {
            Some(ReservationStatus::Confirmed) => NotificationKind::ReservationConfirmed,
            Some(ReservationStatus::Ready) => NotificationKind::ReservationReady,
            Some(ReservationStatus::Cancelled) => NotificationKind::ReservationCancelled,
            _ => return,
        };
        self.notify(kind, reservation).await;
    }
}
