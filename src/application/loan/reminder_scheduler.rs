use crate::application::commit::CommitContext;
use crate::application::delivery::{lookup_contact, lookup_title, report_delivery};
use crate::domain::loan::{self, Loan};
use crate::ports::NotificationKind;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::errors::{LoanApplicationError, Result};
use super::loan_service::ServiceDependencies;

/// 返却期限の何日前からリマインダーを送るか（既定値）
pub const DEFAULT_REMINDER_DAYS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOptions {
    pub days: u32,
    /// 件数だけ数え、状態の変更も送信もしない
    pub dry_run: bool,
}

impl Default for ReminderOptions {
    fn default() -> Self {
        Self {
            days: DEFAULT_REMINDER_DAYS,
            dry_run: false,
        }
    }
}

/// バッチの実行結果
///
/// `failures` は送信や保存に失敗してスキップした件数。失敗があってもバッチ全体は成功扱い。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderReport {
    /// 送信に成功したリマインダーの件数
    ///
    /// dry run では送信対象の件数を数える。送信がすべて成功した場合に限り、実際の実行と同じ値になる。
    pub reminders_sent: usize,
    pub loans_transitioned: usize,
    pub failures: usize,
}

/// 返却期限が近い貸出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueSoonLoan {
    pub loan: Loan,
    /// 期限当日は0
    pub days_remaining: i64,
}

/// 返却期限が `today` から `today + days` の間にある貸出中の貸出を抽出する
///
/// 1回の抽出で同じ貸出は1度しか現れない。
pub async fn find_due_soon_loans(
    deps: &ServiceDependencies,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<DueSoonLoan>> {
    let until = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    let loans = deps
        .loan_repository()
        .find_active_due_between(today, until)
        .await
        .map_err(LoanApplicationError::RepositoryError)?;

    let mut seen = HashSet::new();
    Ok(loans
        .into_iter()
        .filter(|loan| seen.insert(loan.loan_id))
        .filter_map(|loan| {
            let days_remaining = loan::days_until_due(&loan, today)?;
            Some(DueSoonLoan {
                loan,
                days_remaining,
            })
        })
        .collect())
}

/// 返却期限前のリマインダー送信と延滞検出を行うバッチ
///
/// 1. 期限が近い貸出にリマインダーを送る
/// 2. 期限を過ぎた貸出を Overdue に遷移させ、保存する
///
/// 延滞通知はコミットパイプラインのオブザーバー（LoanNotifier）が送るため、ここでは送らない。
/// 1件の失敗は記録して次へ進む。抽出クエリ自体の失敗はエラーとして返す。
///
/// 送信済みの記録は持たないため、同じ日に2回実行するとリマインダーも2回送られる。
pub async fn run_loan_reminders(
    deps: &ServiceDependencies,
    options: ReminderOptions,
) -> Result<ReminderReport> {
    let today = deps.clock.today();
    let mut report = ReminderReport::default();

    tracing::info!(%today, days = options.days, dry_run = options.dry_run, "loan reminder run started");

    // Step 1: 返却期限前リマインダー
    for due_soon in find_due_soon_loans(deps, today, options.days).await? {
        if options.dry_run {
            report.reminders_sent += 1;
            continue;
        }
        if send_reminder(deps, &due_soon).await {
            report.reminders_sent += 1;
        } else {
            report.failures += 1;
        }
    }

    // Step 2: 延滞検出
    let overdue = deps
        .loan_repository()
        .find_active_due_before(today)
        .await
        .map_err(LoanApplicationError::RepositoryError)?;

    for before in overdue {
        let mut loan = before.clone();
        let now = deps.clock.now();
        if let Err(e) = loan::mark_overdue(&mut loan, today, now) {
            tracing::warn!(loan_id = %loan.loan_id, error = %e, "skipping loan in overdue sweep");
            report.failures += 1;
            continue;
        }
        if options.dry_run {
            report.loans_transitioned += 1;
            continue;
        }

        match deps
            .loan_pipeline
            .commit(&before, &mut loan, &CommitContext::system(now))
            .await
        {
            Ok(_) => {
                tracing::info!(loan_id = %loan.loan_id, due_date = ?loan.due_date, "loan marked overdue");
                report.loans_transitioned += 1;
            }
            Err(e) => {
                tracing::warn!(loan_id = %loan.loan_id, error = %e, "failed to persist overdue loan");
                report.failures += 1;
            }
        }
    }

    tracing::info!(
        reminders_sent = report.reminders_sent,
        loans_transitioned = report.loans_transitioned,
        failures = report.failures,
        dry_run = options.dry_run,
        "loan reminder run finished"
    );
    Ok(report)
}

async fn send_reminder(deps: &ServiceDependencies, due_soon: &DueSoonLoan) -> bool {
    let loan = &due_soon.loan;
    let Some(to) = lookup_contact(deps.member_service.as_ref(), loan.member_id).await else {
        return false;
    };
    let title = lookup_title(deps.book_service.as_ref(), loan.book_id).await;

    let result = deps
        .notification_service
        .send_due_soon_reminder(&to, loan, &title, due_soon.days_remaining)
        .await;
    report_delivery(NotificationKind::LoanDueSoon, &to.email, loan.loan_id, result)
}
