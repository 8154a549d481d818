//! mooring-monitor - version 0.1.0
//!
//! Alert engine and ingest service for mooring radar distance and hook
//! tension streams. This is the main entry point that initializes the
//! server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod metrics;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_generate_testdata, command_replay};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR,
    DEFAULT_PORT, DEFAULT_TICK_INTERVAL_MS,
};
use handlers::{
    health_handler, history_handler, ingest_handler, locations_handler, metrics_handler,
    root_handler, status_handler,
};
use metrics::AlertMetrics;
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", args.log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Background task firing pending drift announcements between snapshots.
async fn run_tick_loop(state: SharedState, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let announced = state.tick_engines(Instant::now());
        if announced > 0 {
            debug!("Tick announced {} drift alerts", announced);
        }
    }
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        // Config generation writes defaults and needs no validation
        if let Commands::Config { output, format } = command {
            return command_config(output.clone(), format.clone());
        }

        let config = load_validated_config(&args)?;

        return match command {
            Commands::Check => command_check(&config),

            Commands::Replay {
                input,
                interval_ms,
                berth,
                format,
            } => {
                setup_logging(&args);
                command_replay(input, *interval_ms, berth.clone(), *format, &config)
            }

            Commands::GenerateTestdata {
                output,
                snapshots,
                berths,
                seed,
            } => command_generate_testdata(output, *snapshots, *berths, *seed),

            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&args);

    info!("Starting mooring-monitor");

    let bind_ip_str = config
        .bind
        .clone()
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let port = config.port.unwrap_or(DEFAULT_PORT);
    let tick_interval =
        Duration::from_millis(config.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS));

    info!(
        "Engine: history_len={}, consecutive_threshold={}, radar band {}, hook band {}, announce delay {} ms",
        config.engine.history_len,
        config.engine.consecutive_threshold,
        config.engine.radar_band,
        config.engine.hook_band,
        config.engine.announce_delay_ms
    );

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    let metrics = AlertMetrics::new(&registry)?;
    debug!("All metrics registered successfully");

    let enable_health = config.enable_health.unwrap_or(true);
    let enable_metrics = config.enable_metrics.unwrap_or(true);

    let state: SharedState = Arc::new(AppState::new(config, registry, metrics));

    let ticker = tokio::spawn(run_tick_loop(state.clone(), tick_interval));
    debug!("Drift announce ticker started every {:?}", tick_interval);

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/data/all", post(ingest_handler))
        .route("/locations", get(locations_handler))
        .route("/status/{location}", get(status_handler))
        .route("/history/{location}", get(history_handler));

    if enable_health {
        app = app.route("/health", get(health_handler));
    }
    if enable_metrics {
        app = app.route("/metrics", get(metrics_handler));
    }

    let app = app.with_state(state.clone());

    let listener = TcpListener::bind(addr).await?;
    info!("mooring-monitor listening on http://{}:{}", bind_ip_str, port);

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                ticker.abort();
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    ticker.abort();
    info!("mooring-monitor stopped gracefully");
    Ok(())
}
