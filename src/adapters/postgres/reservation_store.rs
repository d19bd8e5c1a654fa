use crate::domain::{
    reservation::{Reservation, ReservationStatus},
    value_objects::{BookId, MemberId, ReservationId},
};
use crate::ports::entity_store::{EntityStore, Result, StaleEntityError};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

fn map_row_to_reservation(row: &PgRow) -> Result<Reservation> {
    let status_str: &str = row.get("status");
    let status = ReservationStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(Reservation {
        reservation_id: ReservationId::from_uuid(row.get("reservation_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        member_id: MemberId::from_uuid(row.get("member_id")),
        status,
        reserved_at: row.get("reserved_at"),
        notes: row.get("notes"),
        version: row.get("version"),
        updated_at: row.get("updated_at"),
    })
}

/// 予約のPostgreSQL実装
pub struct ReservationStore {
    pool: PgPool,
}

impl ReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<Reservation> for ReservationStore {
    async fn insert(&self, reservation: &Reservation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reservations (
                reservation_id, book_id, member_id, status, reserved_at, notes, version, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation.reservation_id.value())
        .bind(reservation.book_id.value())
        .bind(reservation.member_id.value())
        .bind(reservation.status.as_str())
        .bind(reservation.reserved_at)
        .bind(&reservation.notes)
        .bind(reservation.version)
        .bind(reservation.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, reservation: &Reservation) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE reservations SET
                status = $2,
                notes = $3,
                updated_at = $4,
                version = version + 1
            WHERE reservation_id = $1 AND version = $5
            "#,
        )
        .bind(reservation.reservation_id.value())
        .bind(reservation.status.as_str())
        .bind(&reservation.notes)
        .bind(reservation.updated_at)
        .bind(reservation.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Box::new(StaleEntityError {
                kind: "reservation",
                id: reservation.reservation_id.to_string(),
                expected_version: reservation.version,
            }));
        }
        Ok(())
    }

    async fn get_by_id(&self, reservation_id: ReservationId) -> Result<Option<Reservation>> {
        let row = sqlx::query(
            r#"
            SELECT reservation_id, book_id, member_id, status, reserved_at, notes, version, updated_at
            FROM reservations
            WHERE reservation_id = $1
            "#,
        )
        .bind(reservation_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_reservation).transpose()
    }
}
