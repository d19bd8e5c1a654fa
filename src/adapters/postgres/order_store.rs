use crate::domain::{
    order::{Order, OrderStatus},
    value_objects::{MemberId, OrderId},
};
use crate::ports::entity_store::{EntityStore, Result, StaleEntityError};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

fn map_row_to_order(row: &PgRow) -> Result<Order> {
    let status_str: &str = row.get("status");
    let status = OrderStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(Order {
        order_id: OrderId::from_uuid(row.get("order_id")),
        member_id: MemberId::from_uuid(row.get("member_id")),
        status,
        placed_at: row.get("placed_at"),
        total_cents: row.get("total_cents"),
        notes: row.get("notes"),
        version: row.get("version"),
        updated_at: row.get("updated_at"),
    })
}

/// 注文のPostgreSQL実装
///
/// 行の作成は決済フロー側が行うが、テストやデータ移行のため insert も提供する。
pub struct OrderStore {
    pool: PgPool,
}

impl OrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<Order> for OrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, member_id, status, placed_at, total_cents, notes, version, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.order_id.value())
        .bind(order.member_id.value())
        .bind(order.status.as_str())
        .bind(order.placed_at)
        .bind(order.total_cents)
        .bind(&order.notes)
        .bind(order.version)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = $2,
                total_cents = $3,
                notes = $4,
                updated_at = $5,
                version = version + 1
            WHERE order_id = $1 AND version = $6
            "#,
        )
        .bind(order.order_id.value())
        .bind(order.status.as_str())
        .bind(order.total_cents)
        .bind(&order.notes)
        .bind(order.updated_at)
        .bind(order.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Box::new(StaleEntityError {
                kind: "order",
                id: order.order_id.to_string(),
                expected_version: order.version,
            }));
        }
        Ok(())
    }

    async fn get_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, member_id, status, placed_at, total_cents, notes, version, updated_at
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_order).transpose()
    }
}
