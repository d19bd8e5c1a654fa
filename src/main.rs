use anyhow::Context;
use clap::Parser;
use rusty_library_loans::{
    api::{AppState, create_router},
    application, bootstrap,
    config::AppConfig,
};
use std::sync::Arc;

/// Loan management HTTP server
#[derive(Debug, Parser)]
#[command(name = "rusty-library-loans", version)]
struct Args {
    /// Run with in-memory adapters instead of PostgreSQL (data is lost on exit)
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load().context("failed to load configuration")?;
    bootstrap::init_tracing(&config.logging)?;

    tracing::info!("starting rusty-library-loans v{}", env!("CARGO_PKG_VERSION"));

    let services = if args.in_memory {
        tracing::warn!("using in-memory adapters");
        application::wire(bootstrap::in_memory_adapters())
    } else {
        bootstrap::build_services(&config).await?
    };

    let app_state = Arc::new(AppState {
        services,
        reminder_days: config.reminders.days,
    });
    let app = create_router(app_state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
