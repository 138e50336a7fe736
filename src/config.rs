use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;

// ============================================================================
// Configuration - command line flags with environment fallbacks
// ============================================================================
//
// Every flag can also be set through the environment (or a `.env` file,
// loaded before parsing).
//
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "order-tracking")]
#[command(about = "Order tracking API and delivery reconciliation", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreSettings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API, the metrics server and (optionally) the scheduler
    Serve(ServeSettings),

    /// Mark overdue processing orders as delayed, once
    ProcessDeliveries {
        /// Cutoff date (YYYY-MM-DD); prompted for when omitted
        #[arg(long)]
        date: Option<String>,
    },

    /// Apply database migrations
    Migrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    Postgres,
    Memory,
}

#[derive(Args, Debug, Clone)]
pub struct StoreSettings {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "STORAGE", value_enum, default_value_t = StorageKind::Postgres, global = true)]
    pub storage: StorageKind,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    pub db_max_connections: u32,
}

impl StoreSettings {
    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .context("DATABASE_URL must be set when STORAGE=postgres")
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeSettings {
    #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub http_host: String,

    #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
    pub http_port: u16,

    #[arg(long, env = "METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,

    /// Run reconciliation every N seconds against today's date
    #[arg(long, env = "RECONCILE_INTERVAL_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub reconcile_interval_secs: Option<u64>,
}

impl ServeSettings {
    pub fn reconcile_interval(&self) -> Option<Duration> {
        self.reconcile_interval_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_process_deliveries_with_date() {
        let cli = Cli::try_parse_from([
            "order-tracking",
            "--storage",
            "memory",
            "process-deliveries",
            "--date",
            "2024-08-01",
        ])
        .unwrap();

        assert_eq!(cli.store.storage, StorageKind::Memory);
        match cli.command {
            Command::ProcessDeliveries { date } => assert_eq!(date.as_deref(), Some("2024-08-01")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from([
            "order-tracking",
            "serve",
            "--http-port",
            "3000",
            "--reconcile-interval-secs",
            "60",
        ])
        .unwrap();

        match cli.command {
            Command::Serve(settings) => {
                assert_eq!(settings.http_port, 3000);
                assert_eq!(settings.reconcile_interval(), Some(Duration::from_secs(60)));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = Cli::try_parse_from(["order-tracking", "serve", "--reconcile-interval-secs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_database_url_required_for_postgres() {
        let settings = StoreSettings {
            database_url: Some("  ".into()),
            storage: StorageKind::Postgres,
            db_max_connections: 5,
        };
        assert!(settings.database_url().is_err());
    }
}
