use crate::application::commit::{CommitContext, CommitPipeline};
use crate::application::errors::StatusUpdateError;
use crate::domain::{
    reservation::{self, Reservation, ReservationAction},
    value_objects::*,
};
use crate::ports::*;
use std::sync::Arc;

pub type ReservationPipeline = CommitPipeline<Reservation, dyn EntityStore<Reservation>>;

#[derive(Clone)]
pub struct ReservationDependencies {
    pub pipeline: Arc<ReservationPipeline>,
    pub member_service: Arc<dyn MemberService>,
    pub clock: Arc<dyn Clock>,
}

/// 予約を受け付ける
pub async fn place_reservation(
    deps: &ReservationDependencies,
    book_id: BookId,
    member_id: MemberId,
) -> Result<Reservation, StatusUpdateError> {
    let member_exists = deps
        .member_service
        .exists(member_id)
        .await
        .map_err(StatusUpdateError::MemberServiceError)?;
    if !member_exists {
        return Err(StatusUpdateError::MemberNotFound);
    }

    let now = deps.clock.now();
    let reservation = reservation::place_reservation(book_id, member_id, now);
    deps.pipeline
        .create(&reservation, &CommitContext::system(now))
        .await?;

    tracing::info!(reservation_id = %reservation.reservation_id, %book_id, %member_id, "reservation placed");
    Ok(reservation)
}

/// 予約のステータスを更新する
///
/// `reason` は取消のときだけ使われる。
pub async fn update_reservation(
    deps: &ReservationDependencies,
    reservation_id: ReservationId,
    action: ReservationAction,
    actor: Option<StaffId>,
    reason: Option<&str>,
) -> Result<Reservation, StatusUpdateError> {
    let before = deps
        .pipeline
        .store()
        .get_by_id(reservation_id)
        .await
        .map_err(StatusUpdateError::RepositoryError)?
        .ok_or(StatusUpdateError::NotFound {
            kind: "reservation",
        })?;

    let mut updated = before.clone();
    let now = deps.clock.now();
    reservation::apply_action(&mut updated, action, reason, now)?;

    let ctx = CommitContext { actor, at: now };
    deps.pipeline.commit(&before, &mut updated, &ctx).await?;

    tracing::info!(%reservation_id, status = %updated.status, "reservation updated");
    Ok(updated)
}
