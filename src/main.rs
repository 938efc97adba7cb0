//! Athlete health-reporting service entry point.

use std::net::SocketAddr;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use athlete_health::api::{create_router, AppState};
use athlete_health::config::{Config, LogFormat};
use athlete_health::metrics;
use athlete_health::reports::ReportAnswers;
use athlete_health::service::ReportService;
use athlete_health::status::classify;
use athlete_health::utils::{build_store, shutdown_signal};

/// Athlete health-reporting service.
#[derive(Parser, Debug)]
#[command(name = "athlete-health")]
#[command(about = "Health report intake and athlete availability tracking")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Classify a set of report answers given as JSON and print the result.
    Classify {
        /// Answers object, e.g. '{"expected_outage":"7 days","missed_activity":"Competing Only"}'.
        answers: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration; `check-config` reports a load failure itself
    let config = Config::load();
    let mut log_config = config.as_ref().cloned().unwrap_or_default();
    log_config.verbose |= args.verbose;

    init_tracing(&log_config);

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config),
        Some(Command::Classify { answers }) => cmd_classify(&answers),
        Some(Command::Serve { port }) => cmd_serve(config?, port.or(args.port)).await,
        None => cmd_serve(config?, args.port).await,
    }
}

/// Install the tracing subscriber.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_new(config.log_directives()).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

/// Check configuration validity.
fn cmd_check_config(config: Result<Config, envy::Error>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("ATHLETE HEALTH - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match config {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Build the store
    print!("Building store... ");
    match build_store(&config) {
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Store construction failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Store Backend: {}", config.store_backend);
    if let Some(url) = &config.supabase_url {
        println!("  Database URL: {}", url);
    }
    println!(
        "  Database Key: {}",
        if config.supabase_key.is_some() { "present" } else { "absent" }
    );
    println!("  HTTP Timeout: {}ms", config.http_timeout_ms);
    println!("  Port: {}", config.port);
    println!("  Log Format: {}", config.log_format);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Classify answers without touching any store.
fn cmd_classify(raw: &str) -> anyhow::Result<()> {
    let answers: ReportAnswers = serde_json::from_str(raw)?;
    let classification = classify(&answers, Utc::now())?;

    println!("Status: {}", classification.status);
    match classification.outage_days {
        Some(days) => println!("Outage: {} days", days),
        None => println!("Outage: none"),
    }
    if let Some(date) = classification.injury_date {
        println!("Injury Date: {}", date.to_rfc3339());
    }
    if let Some(date) = classification.estimated_recovery_date {
        println!("Estimated Recovery: {}", date.to_rfc3339());
    }

    Ok(())
}

/// Run the HTTP service until a shutdown signal arrives.
async fn cmd_serve(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let port = port.unwrap_or(config.port);
    info!(
        backend = %config.store_backend,
        port,
        "Starting athlete health service"
    );

    let store = build_store(&config)?;
    let service = ReportService::new(store);

    let mut state = AppState::new(service);
    match metrics::install_prometheus() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Prometheus recorder not installed: {}", e),
    }

    // Initialize metrics
    metrics::init_metrics();

    if !state.service.ping().await {
        warn!("Store did not answer the startup probe; continuing");
    }

    let router = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
