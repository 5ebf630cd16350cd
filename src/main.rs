//! SHKE Portal server
//!
//! Serves the API key portal and the key-gated GitHub summarizer.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

use shke_portal::{
    config::{LogFormat, LogTarget, LoggingConfig},
    create_router, db,
    services::{GithubClient, OpenAiSummarizer, SupabaseAuthClient},
    AppConfig, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("SHKE Portal {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = AppConfig::load().context("Failed to load configuration")?;

    let _log_guard = init_logging(&config.logging);

    info!("SHKE Portal starting up");

    ensure_data_directory(&config)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    info!("Initializing credential store client: {}", config.supabase.url);
    let credentials = Arc::new(
        SupabaseAuthClient::new(&config.supabase)
            .context("Failed to initialize credential store client")?,
    );

    let github = Arc::new(
        GithubClient::new(&config.github).context("Failed to initialize GitHub client")?,
    );

    info!("Initializing summarizer with model {}", config.llm.model);
    let summarizer = Arc::new(
        OpenAiSummarizer::new(&config.llm).context("Failed to initialize summarizer")?,
    );

    let state = AppState {
        config: config.clone(),
        db,
        credentials,
        github,
        summarizer,
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console or file layer in the configured format
fn format_layer<W>(format: &LogFormat, writer: W) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer().json().with_target(true).with_writer(writer).boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(writer)
            .boxed(),
    }
}

/// Install the global subscriber; the returned guard must live until exit
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if matches!(config.target, LogTarget::Console | LogTarget::Both) {
        layers.push(format_layer(&config.format, std::io::stdout));
    }

    if matches!(config.target, LogTarget::File | LogTarget::Both) {
        if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                config.log_dir, e
            );
        }

        let file_appender = if config.daily_rotation {
            tracing_appender::rolling::daily(&config.log_dir, &config.log_prefix)
        } else {
            tracing_appender::rolling::never(&config.log_dir, &config.log_prefix)
        };
        let (writer, worker_guard) = tracing_appender::non_blocking(file_appender);
        layers.push(format_layer(&config.format, writer));
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    guard
}

/// Ensure the directory holding the SQLite file exists
fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    if let Some(path) = config.database.url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).context("Failed to create data directory")?;
                info!("Created data directory: {:?}", parent);
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"SHKE Portal {}

USAGE:
    shke-portal [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information

ENVIRONMENT:
    SHKE_CONFIG         Path to configuration file (default: config.yaml)
    DATABASE_URL        SQLite database URL
    JWT_SECRET          Session signing secret (at least 32 characters)
    SUPABASE_URL        Credential store project URL
    SUPABASE_ANON_KEY   Credential store public key
    OPENAI_API_KEY      Summarization provider key
    RUST_LOG            Log filter (overrides logging.level)

CONFIGURATION:
    The application looks for configuration files in the following order:
    1. Path specified by SHKE_CONFIG environment variable
    2. ./config.yaml
    3. ./config/config.yaml
    4. /etc/shke-portal/config.yaml"#,
        env!("CARGO_PKG_VERSION")
    );
}
