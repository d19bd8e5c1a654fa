use chrono::{Days, Duration};
use rusty_library_loans::application::commit::CommitContext;
use rusty_library_loans::application::loan::{
    LoanApplicationError, activate_loan, approve_loan, get_loan, list_member_loans, reject_loan,
    request_loan, return_loan,
};
use rusty_library_loans::domain::commands::*;
use rusty_library_loans::domain::loan::{self, DEFAULT_REJECTION_REASON, Loan, LoanStatus};
use rusty_library_loans::domain::value_objects::*;
use rusty_library_loans::domain::{LoanAction, LoanTransitionError};
use rusty_library_loans::ports::{ActivityAction, NotificationKind, Recipient};

mod common;

use common::{ADMIN_EMAIL, BORROWER_EMAIL, TestApp, today};

// ============================================================================
// テスト用ヘルパー
// ============================================================================

async fn requested_loan(app: &TestApp) -> Loan {
    request_loan(
        &app.services.loans,
        RequestLoan {
            book_id: app.book_id,
            member_id: app.borrower.member_id,
        },
    )
    .await
    .unwrap()
}

async fn active_loan(app: &TestApp, staff_id: StaffId) -> Loan {
    let loan = requested_loan(app).await;
    approve_loan(
        &app.services.loans,
        ApproveLoan {
            loan_id: loan.loan_id,
            staff_id,
            due_date: Some(today() + Days::new(14)),
        },
    )
    .await
    .unwrap();
    activate_loan(
        &app.services.loans,
        ActivateLoan {
            loan_id: loan.loan_id,
            staff_id,
            due_date: None,
        },
    )
    .await
    .unwrap()
}

// ============================================================================
// 申請
// ============================================================================

#[tokio::test]
async fn test_request_loan_notifies_borrower_and_admins() {
    let app = TestApp::new();

    let loan = requested_loan(&app).await;

    assert_eq!(loan.status, LoanStatus::Requested);
    assert_eq!(app.loans.get(loan.loan_id).unwrap().status, LoanStatus::Requested);

    let received = app
        .notifications
        .sent_of_kind(NotificationKind::LoanRequestReceived);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].email, BORROWER_EMAIL);
    assert_eq!(received[0].entity_id, loan.loan_id.value());

    let new_request = app.notifications.sent_of_kind(NotificationKind::NewLoanRequest);
    assert_eq!(new_request.len(), 1);
    assert_eq!(new_request[0].email, ADMIN_EMAIL);
    assert_eq!(new_request[0].detail.as_deref(), Some("Hanako Yamada"));
}

#[tokio::test]
async fn test_request_loan_for_unknown_member_fails() {
    let app = TestApp::new();

    let result = request_loan(
        &app.services.loans,
        RequestLoan {
            book_id: app.book_id,
            member_id: MemberId::new(),
        },
    )
    .await;

    assert!(matches!(result, Err(LoanApplicationError::MemberNotFound)));
    assert!(app.notifications.sent().is_empty());
}

#[tokio::test]
async fn test_request_loan_for_unavailable_book_fails() {
    let app = TestApp::new();
    app.books.mark_unavailable(app.book_id);

    let result = request_loan(
        &app.services.loans,
        RequestLoan {
            book_id: app.book_id,
            member_id: app.borrower.member_id,
        },
    )
    .await;

    assert!(matches!(result, Err(LoanApplicationError::BookNotAvailable)));
    assert!(app.activity_log.records().is_empty());
}

// ============================================================================
// 承認・却下
// ============================================================================

#[tokio::test]
async fn test_approve_sends_single_approved_notification() {
    let app = TestApp::new();
    let loan = requested_loan(&app).await;
    app.notifications.clear();
    let staff_id = StaffId::new();

    let approved = approve_loan(
        &app.services.loans,
        ApproveLoan {
            loan_id: loan.loan_id,
            staff_id,
            due_date: Some(today() + Days::new(14)),
        },
    )
    .await
    .unwrap();

    assert_eq!(approved.status, LoanStatus::Approved);
    assert_eq!(approved.approved_by, Some(staff_id));
    assert_eq!(approved.due_date, Some(today() + Days::new(14)));
    assert_eq!(approved.version, 1);

    let sent = app.notifications.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::LoanApproved);
    assert_eq!(sent[0].email, BORROWER_EMAIL);
}

#[tokio::test]
async fn test_reject_without_reason_sends_placeholder() {
    let app = TestApp::new();
    let loan = requested_loan(&app).await;

    let rejected = reject_loan(
        &app.services.loans,
        RejectLoan {
            loan_id: loan.loan_id,
            staff_id: StaffId::new(),
            reason: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(rejected.status, LoanStatus::Cancelled);
    let sent = app.notifications.sent_of_kind(NotificationKind::LoanRejected);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].detail.as_deref(), Some(DEFAULT_REJECTION_REASON));
}

#[tokio::test]
async fn test_reject_with_reason_forwards_reason() {
    let app = TestApp::new();
    let loan = requested_loan(&app).await;

    reject_loan(
        &app.services.loans,
        RejectLoan {
            loan_id: loan.loan_id,
            staff_id: StaffId::new(),
            reason: Some("Reference copy only".to_string()),
        },
    )
    .await
    .unwrap();

    let sent = app.notifications.sent_of_kind(NotificationKind::LoanRejected);
    assert_eq!(sent[0].detail.as_deref(), Some("Reference copy only"));
}

#[tokio::test]
async fn test_approve_twice_is_invalid_transition() {
    let app = TestApp::new();
    let loan = requested_loan(&app).await;
    let cmd = ApproveLoan {
        loan_id: loan.loan_id,
        staff_id: StaffId::new(),
        due_date: None,
    };
    approve_loan(&app.services.loans, cmd.clone()).await.unwrap();
    app.notifications.clear();

    let result = approve_loan(&app.services.loans, cmd).await;

    assert!(matches!(
        result,
        Err(LoanApplicationError::Transition(
            LoanTransitionError::InvalidTransition {
                action: LoanAction::Approve,
                from: LoanStatus::Approved,
            }
        ))
    ));
    assert!(app.notifications.sent().is_empty());
}

#[tokio::test]
async fn test_unknown_loan_is_not_found() {
    let app = TestApp::new();

    let result = approve_loan(
        &app.services.loans,
        ApproveLoan {
            loan_id: LoanId::new(),
            staff_id: StaffId::new(),
            due_date: None,
        },
    )
    .await;

    assert!(matches!(result, Err(LoanApplicationError::LoanNotFound)));
}

// ============================================================================
// 貸出開始・返却
// ============================================================================

#[tokio::test]
async fn test_activate_without_due_date_fails() {
    let app = TestApp::new();
    let loan = requested_loan(&app).await;
    let staff_id = StaffId::new();
    approve_loan(
        &app.services.loans,
        ApproveLoan {
            loan_id: loan.loan_id,
            staff_id,
            due_date: None,
        },
    )
    .await
    .unwrap();

    let result = activate_loan(
        &app.services.loans,
        ActivateLoan {
            loan_id: loan.loan_id,
            staff_id,
            due_date: None,
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(LoanApplicationError::Transition(
            LoanTransitionError::MissingDueDate
        ))
    ));
    assert_eq!(app.loans.get(loan.loan_id).unwrap().status, LoanStatus::Approved);
}

#[tokio::test]
async fn test_activate_with_due_date_in_command() {
    let app = TestApp::new();
    let loan = requested_loan(&app).await;
    let staff_id = StaffId::new();
    approve_loan(
        &app.services.loans,
        ApproveLoan {
            loan_id: loan.loan_id,
            staff_id,
            due_date: None,
        },
    )
    .await
    .unwrap();
    app.notifications.clear();

    let active = activate_loan(
        &app.services.loans,
        ActivateLoan {
            loan_id: loan.loan_id,
            staff_id,
            due_date: Some(today() + Days::new(7)),
        },
    )
    .await
    .unwrap();

    assert_eq!(active.status, LoanStatus::Active);
    assert_eq!(active.due_date, Some(today() + Days::new(7)));
    assert_eq!(active.loan_start_date, Some(app.clock_now()));
    assert_eq!(
        app.notifications.sent_of_kind(NotificationKind::LoanStarted).len(),
        1
    );
}

#[tokio::test]
async fn test_full_lifecycle_sends_one_notification_per_transition() {
    let app = TestApp::new();
    let staff_id = StaffId::new();
    let loan = active_loan(&app, staff_id).await;
    app.clock.advance(Duration::days(10));

    let returned = return_loan(
        &app.services.loans,
        ReturnLoan {
            loan_id: loan.loan_id,
            staff_id,
        },
    )
    .await
    .unwrap();

    assert_eq!(returned.status, LoanStatus::Returned);
    assert!(returned.returned_at.unwrap() >= returned.loan_start_date.unwrap());

    let kinds: Vec<NotificationKind> = app.notifications.sent().iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::LoanRequestReceived,
            NotificationKind::NewLoanRequest,
            NotificationKind::LoanApproved,
            NotificationKind::LoanStarted,
            NotificationKind::LoanReturned,
        ]
    );
}

#[tokio::test]
async fn test_overdue_loan_can_be_returned() {
    let app = TestApp::new();
    let staff_id = StaffId::new();
    let before = active_loan(&app, staff_id).await;

    // 延滞検出バッチ相当の遷移をパイプライン経由で行う
    let mut overdue = before.clone();
    let as_of = before.due_date.unwrap() + Days::new(1);
    loan::mark_overdue(&mut overdue, as_of, app.clock_now()).unwrap();
    app.services
        .loans
        .loan_pipeline
        .commit(&before, &mut overdue, &CommitContext::system(app.clock_now()))
        .await
        .unwrap();

    let returned = return_loan(
        &app.services.loans,
        ReturnLoan {
            loan_id: before.loan_id,
            staff_id,
        },
    )
    .await
    .unwrap();

    assert_eq!(returned.status, LoanStatus::Returned);
    assert_eq!(
        app.notifications.sent_of_kind(NotificationKind::LoanOverdue).len(),
        1
    );
    assert_eq!(
        app.notifications.sent_of_kind(NotificationKind::LoanReturned).len(),
        1
    );
}

// ============================================================================
// 読み込み
// ============================================================================

#[tokio::test]
async fn test_get_loan_past_due_stays_active() {
    let app = TestApp::new();
    let loan = active_loan(&app, StaffId::new()).await;
    app.clock.advance(Duration::days(30));

    let fetched = get_loan(&app.services.loans, loan.loan_id).await.unwrap();

    assert_eq!(fetched.status, LoanStatus::Active);
}

#[tokio::test]
async fn test_list_member_loans_filters_by_status() {
    let app = TestApp::new();
    let active = active_loan(&app, StaffId::new()).await;
    app.clock.advance(Duration::minutes(1));
    let pending = requested_loan(&app).await;

    let all = list_member_loans(&app.services.loans, app.borrower.member_id, None)
        .await
        .unwrap();
    let ids: Vec<LoanId> = all.iter().map(|l| l.loan_id).collect();
    assert_eq!(ids, vec![pending.loan_id, active.loan_id]);

    let only_active = list_member_loans(
        &app.services.loans,
        app.borrower.member_id,
        Some(LoanStatus::Active),
    )
    .await
    .unwrap();
    assert_eq!(only_active.len(), 1);
    assert_eq!(only_active[0].loan_id, active.loan_id);
}

// ============================================================================
// 失敗時の振る舞い
// ============================================================================

#[tokio::test]
async fn test_notification_failure_does_not_fail_transition() {
    let app = TestApp::new();
    let loan = requested_loan(&app).await;
    app.notifications.fail_for(BORROWER_EMAIL);
    app.notifications.clear();

    let approved = approve_loan(
        &app.services.loans,
        ApproveLoan {
            loan_id: loan.loan_id,
            staff_id: StaffId::new(),
            due_date: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(approved.status, LoanStatus::Approved);
    assert_eq!(app.loans.get(loan.loan_id).unwrap().status, LoanStatus::Approved);
    assert!(app.notifications.sent().is_empty());
    // 監査ログは通知の失敗と無関係に記録される
    assert_eq!(app.activity_log.records().len(), 2);
}

#[tokio::test]
async fn test_request_notifications_are_sent_independently() {
    let app = TestApp::new();
    for (name, email) in [
        ("Second Librarian", "second@example.com"),
        ("Third Librarian", "third@example.com"),
    ] {
        app.members.add_admin(Recipient {
            member_id: MemberId::new(),
            display_name: name.to_string(),
            email: email.to_string(),
        });
    }
    app.notifications.fail_for(BORROWER_EMAIL);
    app.notifications.fail_for("second@example.com");

    let loan = requested_loan(&app).await;

    assert_eq!(loan.status, LoanStatus::Requested);
    assert!(
        app.notifications
            .sent_of_kind(NotificationKind::LoanRequestReceived)
            .is_empty()
    );
    let admin_emails: Vec<String> = app
        .notifications
        .sent_of_kind(NotificationKind::NewLoanRequest)
        .into_iter()
        .map(|n| n.email)
        .collect();
    assert_eq!(admin_emails, vec![ADMIN_EMAIL, "third@example.com"]);
}

#[tokio::test]
async fn test_persistence_failure_sends_no_notification() {
    let app = TestApp::new();
    let loan = requested_loan(&app).await;
    app.loans.fail_updates_for(loan.loan_id);
    app.notifications.clear();

    let result = approve_loan(
        &app.services.loans,
        ApproveLoan {
            loan_id: loan.loan_id,
            staff_id: StaffId::new(),
            due_date: None,
        },
    )
    .await;

    match result {
        Err(LoanApplicationError::Commit(e)) => assert!(!e.is_stale()),
        other => panic!("expected commit error, got {:?}", other),
    }
    assert!(app.notifications.sent().is_empty());
    assert_eq!(app.loans.get(loan.loan_id).unwrap().status, LoanStatus::Requested);
}

#[tokio::test]
async fn test_stale_snapshot_is_rejected() {
    let app = TestApp::new();
    let loan = requested_loan(&app).await;

    // 別の職員が先に承認した
    approve_loan(
        &app.services.loans,
        ApproveLoan {
            loan_id: loan.loan_id,
            staff_id: StaffId::new(),
            due_date: None,
        },
    )
    .await
    .unwrap();

    let mut rejected = loan.clone();
    loan::reject(&mut rejected, Some("duplicate"), app.clock_now()).unwrap();
    let err = app
        .services
        .loans
        .loan_pipeline
        .commit(&loan, &mut rejected, &CommitContext::system(app.clock_now()))
        .await
        .unwrap_err();

    assert!(err.is_stale());
    assert_eq!(app.loans.get(loan.loan_id).unwrap().status, LoanStatus::Approved);
}

// ============================================================================
// 監査ログ
// ============================================================================

#[tokio::test]
async fn test_activity_log_records_actor_and_status_change() {
    let app = TestApp::new();
    let staff_id = StaffId::new();
    let loan = requested_loan(&app).await;
    approve_loan(
        &app.services.loans,
        ApproveLoan {
            loan_id: loan.loan_id,
            staff_id,
            due_date: Some(today() + Days::new(14)),
        },
    )
    .await
    .unwrap();

    let records = app.activity_log.records();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].action, ActivityAction::Created);
    assert_eq!(records[0].entity_kind, "loan");
    assert_eq!(records[0].new_status, "requested");
    assert_eq!(records[0].actor, None);

    assert_eq!(records[1].action, ActivityAction::Updated);
    assert_eq!(records[1].old_status.as_deref(), Some("requested"));
    assert_eq!(records[1].new_status, "approved");
    assert_eq!(records[1].actor, Some(staff_id));
    assert!(records[1].changed_fields.contains(&"due_date".to_string()));
    assert!(records[1].changed_fields.contains(&"approved_by".to_string()));
}
