//! 返却期限前リマインダーと延滞検出をその場で実行する運用コマンド
//!
//! 個別の送信・保存に失敗しても終了コードは0。起動できなかった場合だけ非0で終わる。

use anyhow::Context;
use clap::Parser;
use rusty_library_loans::{
    application::loan::{ReminderOptions, run_loan_reminders},
    bootstrap,
    config::AppConfig,
};

#[derive(Debug, Parser)]
#[command(
    name = "loan-reminders",
    version,
    about = "Send due-soon reminders and mark overdue loans"
)]
struct Args {
    /// Reminder window in days (defaults to reminders.days from the configuration)
    #[arg(long)]
    days: Option<u32>,

    /// Count what would happen without changing loans or sending email
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("loan-reminders error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load().context("failed to load configuration")?;
    bootstrap::init_tracing(&config.logging)?;

    let services = bootstrap::build_services(&config).await?;
    let options = ReminderOptions {
        days: args.days.unwrap_or(config.reminders.days),
        dry_run: args.dry_run,
    };

    let report = run_loan_reminders(&services.loans, options)
        .await
        .context("loan reminder run failed")?;

    let prefix = if options.dry_run { "[dry run] " } else { "" };
    println!("{prefix}reminders sent: {}", report.reminders_sent);
    println!("{prefix}loans marked overdue: {}", report.loans_transitioned);
    if report.failures > 0 {
        println!("{prefix}failures (see log): {}", report.failures);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::{CommandFactory, Parser};

    #[test]
    fn test_command_tree_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_days_and_dry_run() {
        let args = Args::try_parse_from(["loan-reminders", "--days", "5", "--dry-run"]).unwrap();
        assert_eq!(args.days, Some(5));
        assert!(args.dry_run);
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["loan-reminders"]).unwrap();
        assert_eq!(args.days, None);
        assert!(!args.dry_run);
    }
}
