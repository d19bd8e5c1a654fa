use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{BookId, ChangeSet, Entity, MemberId, ReservationId, StatusChange, TransitionError};

/// 予約ステータス
///
/// Pending → Confirmed → Ready → Completed。終端以外からは Cancelled へ遷移できる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    /// 取り置き済み（受け取り可能）
    Ready,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Ready => "ready",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Confirmed, Ready)
                | (Ready, Completed)
                | (Pending | Confirmed | Ready, Cancelled)
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "ready" => Ok(ReservationStatus::Ready),
            "completed" => Ok(ReservationStatus::Completed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(format!("Invalid reservation status: {}", s)),
        }
    }
}

/// 予約 - 貸出中の書籍の順番待ち
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub book_id: BookId,
    pub member_id: MemberId,
    pub status: ReservationStatus,
    pub reserved_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Reservation {
    type Id = ReservationId;
    type Status = ReservationStatus;

    const KIND: &'static str = "reservation";

    fn id(&self) -> ReservationId {
        self.reservation_id
    }

    fn uuid(&self) -> Uuid {
        self.reservation_id.value()
    }

    fn status(&self) -> ReservationStatus {
        self.status
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn diff(before: &Self, after: &Self) -> ChangeSet<ReservationStatus> {
        let mut changes = ChangeSet::new();
        changes.record_status(before.status, after.status);
        changes.record("notes", &before.notes, &after.notes);
        changes
    }
}

/// 予約への操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationAction {
    Confirm,
    MarkReady,
    Complete,
    Cancel,
}

impl ReservationAction {
    pub fn target(&self) -> ReservationStatus {
        match self {
            ReservationAction::Confirm => ReservationStatus::Confirmed,
            ReservationAction::MarkReady => ReservationStatus::Ready,
            ReservationAction::Complete => ReservationStatus::Completed,
            ReservationAction::Cancel => ReservationStatus::Cancelled,
        }
    }
}

impl std::str::FromStr for ReservationAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirm" => Ok(ReservationAction::Confirm),
            "ready" => Ok(ReservationAction::MarkReady),
            "complete" => Ok(ReservationAction::Complete),
            "cancel" => Ok(ReservationAction::Cancel),
            _ => Err(format!("Invalid reservation action: {}", s)),
        }
    }
}

pub fn place_reservation(
    book_id: BookId,
    member_id: MemberId,
    reserved_at: DateTime<Utc>,
) -> Reservation {
    Reservation {
        reservation_id: ReservationId::new(),
        book_id,
        member_id,
        status: ReservationStatus::Pending,
        reserved_at,
        notes: None,
        version: 0,
        updated_at: reserved_at,
    }
}

/// 予約に操作を適用する
///
/// 取消の場合のみ reason を notes に残す。
pub fn apply_action(
    reservation: &mut Reservation,
    action: ReservationAction,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<StatusChange<ReservationStatus>, TransitionError> {
    let next = action.target();
    if !reservation.status.can_transition_to(next) {
        return Err(TransitionError::new(
            Reservation::KIND,
            reservation.status,
            next,
        ));
    }

    let change = StatusChange::new(reservation.status, next);
    reservation.status = next;
    reservation.updated_at = now;
    if action == ReservationAction::Cancel {
        reservation.notes = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
    }
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_reservation_is_pending() {
        let reservation = place_reservation(BookId::new(), MemberId::new(), Utc::now());
        assert_eq!(reservation.status, ReservationStatus::Pending);
    }

    #[test]
    fn test_happy_path() {
        let mut reservation = place_reservation(BookId::new(), MemberId::new(), Utc::now());
        for action in [
            ReservationAction::Confirm,
            ReservationAction::MarkReady,
            ReservationAction::Complete,
        ] {
            apply_action(&mut reservation, action, None, Utc::now()).unwrap();
        }
        assert_eq!(reservation.status, ReservationStatus::Completed);
    }

    #[test]
    fn test_cannot_skip_confirmation() {
        let mut reservation = place_reservation(BookId::new(), MemberId::new(), Utc::now());
        let err = apply_action(
            &mut reservation,
            ReservationAction::MarkReady,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot move reservation from pending to ready"
        );
    }

    #[test]
    fn test_cancel_keeps_reason() {
        let mut reservation = place_reservation(BookId::new(), MemberId::new(), Utc::now());
        apply_action(
            &mut reservation,
            ReservationAction::Cancel,
            Some("No longer needed"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(reservation.status, ReservationStatus::Cancelled);
        assert_eq!(reservation.notes.as_deref(), Some("No longer needed"));
    }

    #[test]
    fn test_completed_reservation_cannot_be_cancelled() {
        let mut reservation = place_reservation(BookId::new(), MemberId::new(), Utc::now());
        reservation.status = ReservationStatus::Completed;
        assert!(
            apply_action(&mut reservation, ReservationAction::Cancel, None, Utc::now()).is_err()
        );
    }
}
