mod common;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rusty_library_loans::adapters::postgres::{PostgresActivityLog, PostgresLoanRepository};
use rusty_library_loans::domain::loan::{self, Loan, LoanStatus};
use rusty_library_loans::domain::value_objects::*;
use rusty_library_loans::ports::{
    ActivityAction, ActivityLog, ActivityRecord, EntityStore, LoanRepository, StaleEntityError,
};
use serial_test::serial;
use sqlx::PgPool;

/// PostgreSQLの時刻精度（マイクロ秒）に合わせて丸める
fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(dt.timestamp_micros()).expect("Invalid timestamp")
}

fn due(days_from_base: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2031, 5, 1).unwrap() + Days::new(days_from_base)
}

async fn cleanup(pool: &PgPool) {
    sqlx::query("TRUNCATE TABLE loans, activity_log")
        .execute(pool)
        .await
        .expect("Failed to truncate tables");
}

fn active_loan(due_date: NaiveDate) -> Loan {
    let now = truncate_to_micros(Utc::now());
    let mut loan = loan::request_loan(BookId::new(), MemberId::new(), now);
    loan::approve(&mut loan, StaffId::new(), now).unwrap();
    loan::assign_due_date(&mut loan, due_date, now).unwrap();
    loan::activate(&mut loan, now).unwrap();
    loan
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_insert_and_get_by_id() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let repository = PostgresLoanRepository::new(pool.clone());

    let loan = active_loan(due(7));
    repository.insert(&loan).await.unwrap();

    let fetched = repository.get_by_id(loan.loan_id).await.unwrap().unwrap();
    assert_eq!(fetched, loan);
    assert!(repository.get_by_id(LoanId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_update_checks_version() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let repository = PostgresLoanRepository::new(pool.clone());

    let loan = active_loan(due(0));
    repository.insert(&loan).await.unwrap();

    let mut overdue = loan.clone();
    loan::mark_overdue(&mut overdue, due(1), truncate_to_micros(Utc::now())).unwrap();
    repository.update(&overdue).await.unwrap();

    let stored = repository.get_by_id(loan.loan_id).await.unwrap().unwrap();
    assert_eq!(stored.status, LoanStatus::Overdue);
    assert_eq!(stored.version, 1);

    // 古いバージョンのままもう一度保存しようとする
    let err = repository.update(&overdue).await.unwrap_err();
    assert!(err.downcast_ref::<StaleEntityError>().is_some());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_due_date_queries_only_return_active_loans() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let repository = PostgresLoanRepository::new(pool.clone());

    let past_due = active_loan(due(0));
    let due_soon = active_loan(due(3));
    let later = active_loan(due(10));
    let mut returned = active_loan(due(2));
    loan::mark_returned(&mut returned, truncate_to_micros(Utc::now())).unwrap();
    for loan in [&past_due, &due_soon, &later, &returned] {
        repository.insert(loan).await.unwrap();
    }

    let between = repository
        .find_active_due_between(due(1), due(4))
        .await
        .unwrap();
    assert_eq!(
        between.iter().map(|l| l.loan_id).collect::<Vec<_>>(),
        vec![due_soon.loan_id]
    );

    let before = repository.find_active_due_before(due(1)).await.unwrap();
    assert_eq!(
        before.iter().map(|l| l.loan_id).collect::<Vec<_>>(),
        vec![past_due.loan_id]
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_activity_log_round_trip() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let log = PostgresActivityLog::new(pool.clone());
    let loan_id = LoanId::new();
    let staff_id = StaffId::new();

    let record = ActivityRecord {
        entity_kind: "loan".to_string(),
        entity_id: loan_id.value(),
        action: ActivityAction::Updated,
        changed_fields: vec!["approved_at".to_string(), "status".to_string()],
        old_status: Some("requested".to_string()),
        new_status: "approved".to_string(),
        actor: Some(staff_id),
        occurred_at: truncate_to_micros(Utc::now()),
    };
    log.append(record.clone()).await.unwrap();

    let records = log.list_for_entity("loan", loan_id.value()).await.unwrap();
    assert_eq!(records, vec![record]);
}
