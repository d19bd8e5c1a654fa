use crate::application::commit::{CommitContext, CommitObserver};
use crate::application::delivery::{lookup_contact, report_delivery};
use crate::domain::{
    ChangeSet,
    loan::DEFAULT_REJECTION_REASON,
    order::{Order, OrderStatus},
};
use crate::ports::*;
use async_trait::async_trait;
use std::sync::Arc;

/// 注文のステータス遷移に応じて会員へ通知する
pub struct OrderNotifier {
    member_service: Arc<dyn MemberService>,
    notification_service: Arc<dyn NotificationService>,
}

impl OrderNotifier {
    pub fn new(
        member_service: Arc<dyn MemberService>,
        notification_service: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            member_service,
            notification_service,
        }
    }

    async fn notify(&self, kind: NotificationKind, order: &Order) {
        let Some(to) = lookup_contact(self.member_service.as_ref(), order.member_id).await else {
            return;
        };
        let sender = &self.notification_service;

        let result = match kind {
            NotificationKind::OrderReceived => sender.send_order_received(&to, order).await,
            NotificationKind::OrderPaid => sender.send_order_paid(&to, order).await,
            NotificationKind::OrderShipped => sender.send_order_shipped(&to, order).await,
            NotificationKind::OrderDelivered => sender.send_order_delivered(&to, order).await,
            _ => {
                let reason = order.notes.as_deref().unwrap_or(DEFAULT_REJECTION_REASON);
                sender.send_order_cancelled(&to, order, reason).await
            }
        };
        report_delivery(kind, &to.email, order.order_id, result);
    }
}

#[async_trait]
impl CommitObserver<Order> for OrderNotifier {
    async fn on_created(&self, order: &Order, _ctx: &CommitContext) {
        self.notify(NotificationKind::OrderReceived, order).await;
    }

    async fn on_committed(&self, order: &Order, changes: &ChangeSet<OrderStatus>, _ctx: &CommitContext) {
        let kind = match changes.status_change().map(|c| c.to) {
            Some(OrderStatus::Paid) => NotificationKind::OrderPaid,
            Some(OrderStatus::Shipped) => NotificationKind::OrderShipped,
            Some(OrderStatus::Delivered) => NotificationKind::OrderDelivered,
            Some(OrderStatus::Cancelled) => NotificationKind::OrderCancelled,
            _ => return,
        };
        self.notify(kind, order).await;
    }
}
