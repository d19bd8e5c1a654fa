//! バイナリ共通の起動処理（ログ、DB接続、アダプターの組み立て）

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::adapters::{SystemClock, mock, postgres, smtp::SmtpNotificationService};
use crate::application::{self, Adapters, AppServices};
use crate::config::{AppConfig, LoggingConfig};
use crate::domain::{order::Order, reservation::Reservation};

/// tracing を初期化する
///
/// `RUST_LOG` が設定されていればそれを優先し、なければ設定ファイルのレベルを使う。
pub fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("invalid log filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to initialize tracing")?;
    Ok(())
}

/// DBへ接続し、設定に応じてマイグレーションを適用する
pub async fn connect_database(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;
    tracing::info!("connected to database");

    if config.database.run_migrations {
        postgres::run_migrations(&pool)
            .await
            .context("failed to run database migrations")?;
        tracing::info!("database migrations completed");
    }
    Ok(pool)
}

/// PostgreSQLとSMTPを使うアダプター一式
pub fn postgres_adapters(pool: PgPool, config: &AppConfig) -> Adapters {
    Adapters {
        loan_repository: Arc::new(postgres::PostgresLoanRepository::new(pool.clone())),
        reservation_store: Arc::new(postgres::PostgresReservationStore::new(pool.clone())),
        order_store: Arc::new(postgres::PostgresOrderStore::new(pool.clone())),
        member_service: Arc::new(postgres::PostgresMemberService::new(pool.clone())),
        book_service: Arc::new(postgres::PostgresBookService::new(pool.clone())),
        notification_service: Arc::new(SmtpNotificationService::new(config.email.clone())),
        activity_log: Arc::new(postgres::PostgresActivityLog::new(pool)),
        clock: Arc::new(SystemClock),
    }
}

/// インメモリのアダプター一式（DBなしでの動作確認用）
pub fn in_memory_adapters() -> Adapters {
    Adapters {
        loan_repository: Arc::new(mock::LoanRepository::new()),
        reservation_store: Arc::new(mock::EntityStore::<Reservation>::new()),
        order_store: Arc::new(mock::EntityStore::<Order>::new()),
        member_service: Arc::new(mock::MemberService::new()),
        book_service: Arc::new(mock::BookService::new()),
        notification_service: Arc::new(mock::NotificationService::new()),
        activity_log: Arc::new(mock::ActivityLog::new()),
        clock: Arc::new(SystemClock),
    }
}

/// 設定に従ってDBへ接続し、サービスを組み立てる
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let pool = connect_database(config).await?;
    Ok(application::wire(postgres_adapters(pool, config)))
}
