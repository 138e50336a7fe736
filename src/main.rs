use actix::prelude::*;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod metrics;
mod reconciliation;
mod store;
mod utils;

use config::{Cli, Command, ServeSettings, StorageKind, StoreSettings};
use domain::order::{RandomDeliveryEstimator, SecureIdentifierGenerator};
use reconciliation::{DeliveryReconciler, ReconciliationScheduler, RunReconciliation};
use store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use utils::{is_valid_calendar_date, RetryConfig};

#[actix::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=order_tracking=trace
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_tracking=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(settings) => serve(&cli.store, settings).await,
        Command::ProcessDeliveries { date } => process_deliveries(&cli.store, date).await,
        Command::Migrate => migrate(&cli.store).await,
    }
}

async fn serve(store_settings: &StoreSettings, settings: ServeSettings) -> anyhow::Result<()> {
    tracing::info!("🚀 Starting order tracking service");

    let store = open_store(store_settings, true).await?;

    // === Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    // Metrics server runs on its own thread and system
    let registry = metrics.registry().clone();
    let health_store = store.clone();
    let metrics_port = settings.metrics_port;
    std::thread::spawn(move || {
        let system = actix_web::rt::System::new();
        if let Err(e) = system.block_on(metrics::start_metrics_server(registry, health_store, metrics_port)) {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    // === Reconciliation scheduler ===
    let reconciler = Arc::new(DeliveryReconciler::new(store.clone()).with_metrics(metrics.clone()));
    let scheduler = settings.reconcile_interval().map(|interval| {
        ReconciliationScheduler::new(reconciler.clone(), Some(interval)).start()
    });
    match &scheduler {
        // first tick only fires after a full interval
        Some(addr) => addr.do_send(RunReconciliation::today()),
        None => tracing::info!("RECONCILE_INTERVAL_SECS not set, scheduled reconciliation disabled"),
    }

    // === Order API ===
    let state = web::Data::new(
        api::AppState::new(
            store,
            Arc::new(SecureIdentifierGenerator::default()),
            Arc::new(RandomDeliveryEstimator::default()),
        )
        .with_metrics(metrics),
    );

    tracing::info!(
        "🌐 Order API listening on http://{}:{}/api/orders",
        settings.http_host,
        settings.http_port
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .bind((settings.http_host.as_str(), settings.http_port))
        .with_context(|| format!("Failed to bind {}:{}", settings.http_host, settings.http_port))?
        .run()
        .await?;

    tracing::info!("✅ Order tracking service stopped");
    Ok(())
}

async fn process_deliveries(store_settings: &StoreSettings, date: Option<String>) -> anyhow::Result<()> {
    let cutoff = match date {
        Some(date) => date,
        None => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            prompt_cutoff_date(&mut stdin.lock(), &mut stdout.lock())?
        }
    };

    let store = open_store(store_settings, false).await?;
    let reconciler = DeliveryReconciler::new(store);

    let report = reconciler.reconcile_delayed_deliveries(&cutoff).await?;
    println!("{}", report.message);

    Ok(())
}

async fn migrate(store_settings: &StoreSettings) -> anyhow::Result<()> {
    if store_settings.storage != StorageKind::Postgres {
        anyhow::bail!("migrate requires STORAGE=postgres");
    }

    open_store(store_settings, true).await?;
    tracing::info!("✅ Migrations applied");
    Ok(())
}

async fn open_store(settings: &StoreSettings, run_migrations: bool) -> anyhow::Result<Arc<dyn OrderStore>> {
    match settings.storage {
        StorageKind::Memory => {
            tracing::warn!("Using in-memory order store, orders are lost on exit");
            Ok(Arc::new(InMemoryOrderStore::new()))
        }
        StorageKind::Postgres => {
            let pool = store::connect_with_retry(
                settings.database_url()?,
                settings.db_max_connections,
                RetryConfig::default(),
            )
            .await
            .context("Failed to connect to PostgreSQL")?;

            let store = PostgresOrderStore::new(pool);
            if run_migrations {
                store.migrate().await.context("Failed to apply migrations")?;
            }
            tracing::info!("✅ Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
    }
}

/// Ask the operator for a cutoff date until a valid one is entered
fn prompt_cutoff_date<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> anyhow::Result<String> {
    loop {
        write!(output, "Enter the cutoff date (YYYY-MM-DD): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            anyhow::bail!("No cutoff date provided");
        }

        let date = line.trim();
        if date.is_empty() {
            writeln!(output, "Date can not be blank.")?;
        } else if !is_valid_calendar_date(date) {
            writeln!(output, "Date provided must match the defined format of YYYY-mm-dd")?;
        } else {
            return Ok(date.to_string());
        }
    }
}
