use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{ChangeSet, Entity, MemberId, OrderId, StatusChange, TransitionError};

/// 注文ステータス
///
/// Pending → Paid → Shipped → Delivered。Pending / Paid のうちは取消できる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (*self, next),
            (Pending, Paid) | (Paid, Shipped) | (Shipped, Delivered) | (Pending | Paid, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

/// 注文（書店側）
///
/// 作成は決済フロー側で行われる。ここではステータス管理だけを扱う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub member_id: MemberId,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Order {
    type Id = OrderId;
    type Status = OrderStatus;

    const KIND: &'static str = "order";

    fn id(&self) -> OrderId {
        self.order_id
    }

    fn uuid(&self) -> Uuid {
        self.order_id.value()
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn diff(before: &Self, after: &Self) -> ChangeSet<OrderStatus> {
        let mut changes = ChangeSet::new();
        changes.record_status(before.status, after.status);
        changes.record("total_cents", &before.total_cents, &after.total_cents);
        changes.record("notes", &before.notes, &after.notes);
        changes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    MarkPaid,
    Ship,
    Deliver,
    Cancel,
}

impl OrderAction {
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderAction::MarkPaid => OrderStatus::Paid,
            OrderAction::Ship => OrderStatus::Shipped,
            OrderAction::Deliver => OrderStatus::Delivered,
            OrderAction::Cancel => OrderStatus::Cancelled,
        }
    }
}

impl std::str::FromStr for OrderAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pay" => Ok(OrderAction::MarkPaid),
            "ship" => Ok(OrderAction::Ship),
            "deliver" => Ok(OrderAction::Deliver),
            "cancel" => Ok(OrderAction::Cancel),
            _ => Err(format!("Invalid order action: {}", s)),
        }
    }
}

pub fn apply_action(
    order: &mut Order,
    action: OrderAction,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<StatusChange<OrderStatus>, TransitionError> {
    let next = action.target();
    if !order.status.can_transition_to(next) {
        return Err(TransitionError::new(Order::KIND, order.status, next));
    }

    let change = StatusChange::new(order.status, next);
    order.status = next;
    order.updated_at = now;
    if action == OrderAction::Cancel {
        order.notes = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
    }
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_order() -> Order {
        let now = Utc::now();
        Order {
            order_id: OrderId::new(),
            member_id: MemberId::new(),
            status: OrderStatus::Pending,
            placed_at: now,
            total_cents: 2_450,
            notes: None,
            version: 0,
            updated_at: now,
        }
    }

    #[test]
    fn test_order_fulfilment_path() {
        let mut order = pending_order();
        for action in [OrderAction::MarkPaid, OrderAction::Ship, OrderAction::Deliver] {
            apply_action(&mut order, action, None, Utc::now()).unwrap();
        }
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_shipped_order_cannot_be_cancelled() {
        let mut order = pending_order();
        apply_action(&mut order, OrderAction::MarkPaid, None, Utc::now()).unwrap();
        apply_action(&mut order, OrderAction::Ship, None, Utc::now()).unwrap();

        let err = apply_action(&mut order, OrderAction::Cancel, None, Utc::now()).unwrap_err();

        assert_eq!(err.to_string(), "cannot move order from shipped to cancelled");
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("pay".parse::<OrderAction>().unwrap(), OrderAction::MarkPaid);
        assert!("refund".parse::<OrderAction>().is_err());
    }
}
