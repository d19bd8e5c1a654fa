use chrono::{Days, NaiveDate};
use rusty_library_loans::application::loan::{
    LoanApplicationError, ReminderOptions, ReminderReport, find_due_soon_loans, run_loan_reminders,
};
use rusty_library_loans::domain::loan::{self, Loan, LoanStatus};
use rusty_library_loans::domain::value_objects::*;
use rusty_library_loans::ports::{ActivityAction, NotificationKind, Recipient};

mod common;

use common::{BORROWER_EMAIL, TestApp, today};

// ============================================================================
// テスト用ヘルパー
// ============================================================================

/// 返却期限つきの貸出中の貸出を直接保存する
fn seed_active_loan(app: &TestApp, member: &Recipient, due_date: NaiveDate) -> Loan {
    let now = app.clock_now();
    let mut loan = loan::request_loan(app.book_id, member.member_id, now);
    loan::approve(&mut loan, StaffId::new(), now).unwrap();
    loan::assign_due_date(&mut loan, due_date, now).unwrap();
    loan::activate(&mut loan, now).unwrap();
    app.loans.seed(loan.clone());
    loan
}

fn options(days: u32) -> ReminderOptions {
    ReminderOptions {
        days,
        dry_run: false,
    }
}

fn report(reminders_sent: usize, loans_transitioned: usize, failures: usize) -> ReminderReport {
    ReminderReport {
        reminders_sent,
        loans_transitioned,
        failures,
    }
}

// ============================================================================
// 返却期限前リマインダー
// ============================================================================

#[tokio::test]
async fn test_loan_due_in_two_days_gets_one_reminder() {
    let app = TestApp::new();
    let loan = seed_active_loan(&app, &app.borrower, today() + Days::new(2));

    let result = run_loan_reminders(&app.services.loans, options(3))
        .await
        .unwrap();

    assert_eq!(result, report(1, 0, 0));
    let reminders = app.notifications.sent_of_kind(NotificationKind::LoanDueSoon);
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].email, BORROWER_EMAIL);
    assert_eq!(reminders[0].entity_id, loan.loan_id.value());
    assert_eq!(reminders[0].detail.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_reminder_window_is_inclusive() {
    let app = TestApp::new();
    let due_today = seed_active_loan(&app, &app.borrower, today());
    let due_at_edge = seed_active_loan(&app, &app.borrower, today() + Days::new(3));
    seed_active_loan(&app, &app.borrower, today() + Days::new(4));

    let due_soon = find_due_soon_loans(&app.services.loans, today(), 3)
        .await
        .unwrap();

    let found: Vec<(LoanId, i64)> = due_soon
        .iter()
        .map(|d| (d.loan.loan_id, d.days_remaining))
        .collect();
    assert_eq!(
        found,
        vec![(due_today.loan_id, 0), (due_at_edge.loan_id, 3)]
    );
}

#[tokio::test]
async fn test_loans_not_active_are_ignored() {
    let app = TestApp::new();
    let now = app.clock_now();

    // 承認済みで返却期限だけ決まっている
    let mut approved = loan::request_loan(app.book_id, app.borrower.member_id, now);
    loan::approve(&mut approved, StaffId::new(), now).unwrap();
    loan::assign_due_date(&mut approved, today() - Days::new(2), now).unwrap();
    app.loans.seed(approved.clone());

    // 返却済み
    let mut returned = seed_active_loan(&app, &app.borrower, today() + Days::new(1));
    loan::mark_returned(&mut returned, now).unwrap();
    app.loans.seed(returned);

    let result = run_loan_reminders(&app.services.loans, options(3))
        .await
        .unwrap();

    assert_eq!(result, report(0, 0, 0));
    assert!(app.notifications.sent().is_empty());
    assert_eq!(
        app.loans.get(approved.loan_id).unwrap().status,
        LoanStatus::Approved
    );
}

// ============================================================================
// 延滞検出
// ============================================================================

#[tokio::test]
async fn test_loan_due_yesterday_becomes_overdue_with_one_notification() {
    let app = TestApp::new();
    let loan = seed_active_loan(&app, &app.borrower, today() - Days::new(1));

    let result = run_loan_reminders(&app.services.loans, options(3))
        .await
        .unwrap();

    assert_eq!(result, report(0, 1, 0));
    let stored = app.loans.get(loan.loan_id).unwrap();
    assert_eq!(stored.status, LoanStatus::Overdue);
    assert_eq!(stored.version, loan.version + 1);

    let sent = app.notifications.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::LoanOverdue);
    assert_eq!(sent[0].email, BORROWER_EMAIL);

    let records = app.activity_log.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, ActivityAction::Updated);
    assert_eq!(records[0].old_status.as_deref(), Some("active"));
    assert_eq!(records[0].new_status, "overdue");
    assert_eq!(records[0].actor, None);
}

#[tokio::test]
async fn test_loan_due_today_is_not_overdue() {
    let app = TestApp::new();
    let loan = seed_active_loan(&app, &app.borrower, today());

    let result = run_loan_reminders(&app.services.loans, options(3))
        .await
        .unwrap();

    assert_eq!(result, report(1, 0, 0));
    assert_eq!(app.loans.get(loan.loan_id).unwrap().status, LoanStatus::Active);
}

// ============================================================================
// dry run と再実行
// ============================================================================

#[tokio::test]
async fn test_dry_run_counts_without_side_effects() {
    let app = TestApp::new();
    let due_soon = seed_active_loan(&app, &app.borrower, today() + Days::new(1));
    let overdue = seed_active_loan(&app, &app.borrower, today() - Days::new(3));

    let result = run_loan_reminders(
        &app.services.loans,
        ReminderOptions {
            days: 3,
            dry_run: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(result, report(1, 1, 0));
    assert!(app.notifications.sent().is_empty());
    assert!(app.activity_log.records().is_empty());
    assert_eq!(app.loans.get(due_soon.loan_id).unwrap(), due_soon);
    assert_eq!(app.loans.get(overdue.loan_id).unwrap(), overdue);
}

#[tokio::test]
async fn test_rerun_sends_duplicate_reminders_but_transitions_once() {
    let app = TestApp::new();
    seed_active_loan(&app, &app.borrower, today() + Days::new(2));
    seed_active_loan(&app, &app.borrower, today() - Days::new(1));

    let first = run_loan_reminders(&app.services.loans, options(3))
        .await
        .unwrap();
    let second = run_loan_reminders(&app.services.loans, options(3))
        .await
        .unwrap();

    assert_eq!(first, report(1, 1, 0));
    assert_eq!(second, report(1, 0, 0));
    assert_eq!(
        app.notifications.sent_of_kind(NotificationKind::LoanDueSoon).len(),
        2
    );
    assert_eq!(
        app.notifications.sent_of_kind(NotificationKind::LoanOverdue).len(),
        1
    );
}

// ============================================================================
// 失敗時の振る舞い
// ============================================================================

#[tokio::test]
async fn test_failures_are_counted_and_run_continues() {
    let app = TestApp::new();
    let unreachable = app.add_member("Taro Suzuki", "taro@example.com");
    app.notifications.fail_for("taro@example.com");

    seed_active_loan(&app, &unreachable, today() + Days::new(1));
    seed_active_loan(&app, &app.borrower, today() + Days::new(2));
    let broken = seed_active_loan(&app, &app.borrower, today() - Days::new(2));
    let overdue = seed_active_loan(&app, &app.borrower, today() - Days::new(1));
    app.loans.fail_updates_for(broken.loan_id);

    let result = run_loan_reminders(&app.services.loans, options(3))
        .await
        .unwrap();

    assert_eq!(result, report(1, 1, 2));
    assert_eq!(app.loans.get(broken.loan_id).unwrap().status, LoanStatus::Active);
    assert_eq!(app.loans.get(overdue.loan_id).unwrap().status, LoanStatus::Overdue);

    let overdue_mails = app.notifications.sent_of_kind(NotificationKind::LoanOverdue);
    assert_eq!(overdue_mails.len(), 1);
    assert_eq!(overdue_mails[0].entity_id, overdue.loan_id.value());
}

#[tokio::test]
async fn test_overdue_mail_failure_still_transitions() {
    let app = TestApp::new();
    let loan = seed_active_loan(&app, &app.borrower, today() - Days::new(1));
    app.notifications.fail_for(BORROWER_EMAIL);

    let result = run_loan_reminders(&app.services.loans, options(3))
        .await
        .unwrap();

    assert_eq!(result, report(0, 1, 0));
    assert_eq!(app.loans.get(loan.loan_id).unwrap().status, LoanStatus::Overdue);
}

#[tokio::test]
async fn test_query_failure_fails_the_run() {
    let app = TestApp::new();
    seed_active_loan(&app, &app.borrower, today() + Days::new(1));
    app.loans.fail_queries();

    let result = run_loan_reminders(&app.services.loans, options(3)).await;

    assert!(matches!(
        result,
        Err(LoanApplicationError::RepositoryError(_))
    ));
    assert!(app.notifications.sent().is_empty());
}

#[tokio::test]
async fn test_dry_run_counts_candidates_that_would_fail_to_send() {
    let app = TestApp::new();
    app.notifications.fail_for(BORROWER_EMAIL);
    seed_active_loan(&app, &app.borrower, today() + Days::new(1));

    let dry_run = run_loan_reminders(
        &app.services.loans,
        ReminderOptions {
            days: 3,
            dry_run: true,
        },
    )
    .await
    .unwrap();
    let real = run_loan_reminders(&app.services.loans, options(3))
        .await
        .unwrap();

    assert_eq!(dry_run, report(1, 0, 0));
    assert_eq!(real, report(0, 0, 1));
}
