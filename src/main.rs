use clap::Parser;
use miette::{IntoDiagnostic, Result};
use p2p_ledger::application::service::LedgerService;
use p2p_ledger::config::{DEFAULT_OUTCOME_RETENTION, EnqueuePolicy, LedgerConfig, PoolConfig};
use p2p_ledger::domain::account::Balance;
use p2p_ledger::interfaces::http::create_router;
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address the HTTP server listens on
    #[arg(long, env = "LEDGER_BIND", default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Concurrent verification tasks spawned per tick
    #[arg(long, env = "LEDGER_VERIFICATION_WORKERS", default_value_t = 2)]
    verification_workers: usize,

    /// Concurrent transfer tasks spawned per tick
    #[arg(long, env = "LEDGER_TRANSFER_WORKERS", default_value_t = 2)]
    transfer_workers: usize,

    /// Milliseconds between verification ticks
    #[arg(long, env = "LEDGER_VERIFICATION_TICK_MS", default_value_t = 10_000)]
    verification_tick_ms: u64,

    /// Milliseconds between transfer ticks
    #[arg(long, env = "LEDGER_TRANSFER_TICK_MS", default_value_t = 10_000)]
    transfer_tick_ms: u64,

    /// Capacity of each queue
    #[arg(long, env = "LEDGER_QUEUE_CAPACITY", default_value_t = 1000)]
    queue_capacity: usize,

    /// Credit granted to each new account
    #[arg(long, env = "LEDGER_STARTING_BALANCE", default_value = "1000")]
    starting_balance: Decimal,

    /// Deferrals allowed before a transfer from an unverified sender fails
    #[arg(long, env = "LEDGER_MAX_DEFERRALS", default_value_t = 100)]
    max_deferrals: u32,

    /// Behaviour of request handlers when a queue is full
    #[arg(long, env = "LEDGER_ENQUEUE_POLICY", value_enum, default_value_t = EnqueuePolicy::Block)]
    enqueue_policy: EnqueuePolicy,

    /// Completed or failed transfer outcomes kept for status lookups
    #[arg(long, env = "LEDGER_OUTCOME_RETENTION", default_value_t = DEFAULT_OUTCOME_RETENTION)]
    outcome_retention: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "LEDGER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LEDGER_LOG_JSON")]
    log_json: bool,
}

impl Cli {
    fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            verification: PoolConfig {
                fan_out: self.verification_workers,
                tick_interval: Duration::from_millis(self.verification_tick_ms),
                queue_capacity: self.queue_capacity,
            },
            transfer: PoolConfig {
                fan_out: self.transfer_workers,
                tick_interval: Duration::from_millis(self.transfer_tick_ms),
                queue_capacity: self.queue_capacity,
            },
            starting_balance: Balance::new(self.starting_balance),
            max_deferrals: self.max_deferrals,
            enqueue_policy: self.enqueue_policy,
            outcome_retention: self.outcome_retention,
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let service = LedgerService::new(cli.ledger_config()).into_diagnostic()?;
    let workers = service.start();

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .into_diagnostic()?;
    info!(address = %cli.bind, "listening");

    axum::serve(listener, create_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    workers.shutdown().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
