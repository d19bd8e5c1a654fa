use crate::application::commit::{CommitContext, CommitPipeline};
use crate::application::errors::StatusUpdateError;
use crate::domain::{
    order::{self, Order, OrderAction},
    value_objects::*,
};
use crate::ports::*;
use std::sync::Arc;

pub type OrderPipeline = CommitPipeline<Order, dyn EntityStore<Order>>;

/// 注文の作成は決済フロー側の責務のため、ここでは読み込みと遷移だけを扱う
#[derive(Clone)]
pub struct OrderDependencies {
    pub pipeline: Arc<OrderPipeline>,
    pub clock: Arc<dyn Clock>,
}

/// 注文のステータスを更新する
pub async fn update_order(
    deps: &OrderDependencies,
    order_id: OrderId,
    action: OrderAction,
    actor: Option<StaffId>,
    reason: Option<&str>,
) -> Result<Order, StatusUpdateError> {
    let before = deps
        .pipeline
        .store()
        .get_by_id(order_id)
        .await
        .map_err(StatusUpdateError::RepositoryError)?
        .ok_or(StatusUpdateError::NotFound { kind: "order" })?;

    let mut updated = before.clone();
    let now = deps.clock.now();
    order::apply_action(&mut updated, action, reason, now)?;

    let ctx = CommitContext { actor, at: now };
    deps.pipeline.commit(&before, &mut updated, &ctx).await?;

    tracing::info!(%order_id, status = %updated.status, "order updated");
    Ok(updated)
}
