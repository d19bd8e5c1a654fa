use crate::domain::{
    loan::{Loan, LoanStatus},
    value_objects::{BookId, LoanId, MemberId, StaffId},
};
use crate::ports::entity_store::{EntityStore, Result, StaleEntityError};
use crate::ports::loan_repository::LoanRepository as LoanRepositoryTrait;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

const LOAN_COLUMNS: &str = r#"
    loan_id,
    book_id,
    member_id,
    status,
    requested_at,
    approved_at,
    approved_by,
    loan_start_date,
    due_date,
    returned_at,
    notes,
    version,
    updated_at
"#;

/// PostgreSQLの行データをLoanに変換する
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.get("status");
    let status = LoanStatus::from_str(status_str).map_err(invalid_data)?;

    let approved_by: Option<uuid::Uuid> = row.get("approved_by");

    Ok(Loan {
        loan_id: LoanId::from_uuid(row.get("loan_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        member_id: MemberId::from_uuid(row.get("member_id")),
        status,
        requested_at: row.get("requested_at"),
        approved_at: row.get("approved_at"),
        approved_by: approved_by.map(StaffId::from_uuid),
        loan_start_date: row.get("loan_start_date"),
        due_date: row.get("due_date"),
        returned_at: row.get("returned_at"),
        notes: row.get("notes"),
        version: row.get("version"),
        updated_at: row.get("updated_at"),
    })
}

/// LoanRepositoryのPostgreSQL実装
///
/// 更新は `WHERE version = $n` で楽観的ロックを行う。
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, where_clause: &str, binds: Vec<NaiveDate>) -> Result<Vec<Loan>> {
        let sql = format!(
            "SELECT {} FROM loans WHERE {} ORDER BY due_date ASC, requested_at ASC",
            LOAN_COLUMNS, where_clause
        );
        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = query.bind(bind);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_loan).collect()
    }
}

#[async_trait]
impl EntityStore<Loan> for LoanRepository {
    async fn insert(&self, loan: &Loan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                book_id,
                member_id,
                status,
                requested_at,
                approved_at,
                approved_by,
                loan_start_date,
                due_date,
                returned_at,
                notes,
                version,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.book_id.value())
        .bind(loan.member_id.value())
        .bind(loan.status.as_str())
        .bind(loan.requested_at)
        .bind(loan.approved_at)
        .bind(loan.approved_by.map(|s| s.value()))
        .bind(loan.loan_start_date)
        .bind(loan.due_date)
        .bind(loan.returned_at)
        .bind(&loan.notes)
        .bind(loan.version)
        .bind(loan.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// バージョンが一致する行だけを更新する
    ///
    /// 影響行数が0なら、他のトランザクションが先に更新したとみなす。
    async fn update(&self, loan: &Loan) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE loans SET
                status = $2,
                approved_at = $3,
                approved_by = $4,
                loan_start_date = $5,
                due_date = $6,
                returned_at = $7,
                notes = $8,
                updated_at = $9,
                version = version + 1
            WHERE loan_id = $1 AND version = $10
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.status.as_str())
        .bind(loan.approved_at)
        .bind(loan.approved_by.map(|s| s.value()))
        .bind(loan.loan_start_date)
        .bind(loan.due_date)
        .bind(loan.returned_at)
        .bind(&loan.notes)
        .bind(loan.updated_at)
        .bind(loan.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Box::new(StaleEntityError {
                kind: "loan",
                id: loan.loan_id.to_string(),
                expected_version: loan.version,
            }));
        }
        Ok(())
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let sql = format!("SELECT {} FROM loans WHERE loan_id = $1", LOAN_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(loan_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    /// status = 'active' の部分インデックス（due_date）を使用する
    async fn find_active_due_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Loan>> {
        self.fetch(
            "status = 'active' AND due_date BETWEEN $1 AND $2",
            vec![from, to],
        )
        .await
    }

    async fn find_active_due_before(&self, date: NaiveDate) -> Result<Vec<Loan>> {
        self.fetch("status = 'active' AND due_date < $1", vec![date])
            .await
    }

    async fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Loan>> {
        let sql = format!(
            "SELECT {} FROM loans WHERE member_id = $1 ORDER BY requested_at DESC",
            LOAN_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(member_id.value())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_loan).collect()
    }
}
