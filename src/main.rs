use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use teamcity_mcp::config::{AppConfig, EnvConfig, FileConfig, ENV_HELP};
use teamcity_mcp::server::{self, serve_stdio, ServerConfig, ServerState};
use teamcity_mcp::{McpDispatcher, TeamCityClient, TtlCache, VERSION};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Transport {
    Http,
    Stdio,
}

#[derive(Parser, Debug)]
#[command(version = VERSION, about = "MCP gateway for the TeamCity REST API")]
struct CliArgs {
    /// Transport to serve MCP on.
    #[clap(long, value_enum, default_value_t = Transport::Http)]
    pub transport: Transport,

    /// Optional TOML file overriding environment configuration.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Print the supported environment variables and exit.
    #[clap(long)]
    pub env_help: bool,
}

/// `LOG_LEVEL` drives the filter, `LOG_FORMAT` picks json (default) or
/// console output. Stdio mode logs to stderr since stdout carries frames.
fn init_logging(transport: Transport) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("LOG_LEVEL")
        .from_env_lossy();

    let writer = match transport {
        Transport::Stdio => BoxMakeWriter::new(std::io::stderr),
        Transport::Http => BoxMakeWriter::new(std::io::stdout),
    };
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(writer);
    let console = matches!(
        std::env::var("LOG_FORMAT").as_deref().map(str::trim),
        Ok("console")
    );

    let registry = tracing_subscriber::registry().with(filter);
    let result = if console {
        registry.with(fmt_layer).try_init()
    } else {
        registry.with(fmt_layer.json()).try_init()
    };
    result.context("Failed to initialize logging")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    if cli_args.env_help {
        print!("{}", ENV_HELP);
        return Ok(());
    }

    init_logging(cli_args.transport)?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration overrides from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&EnvConfig::from_env(), file_config)
        .context("Invalid configuration")?;

    info!(
        "Starting {} {} against {} (transport: {:?})",
        teamcity_mcp::SERVER_NAME,
        VERSION,
        app_config.teamcity.url,
        cli_args.transport
    );

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    let client = Arc::new(
        TeamCityClient::new(&app_config.teamcity).context("Failed to create TeamCity client")?,
    );
    let cache = Arc::new(TtlCache::new(app_config.cache_ttl));
    let shutdown_token = CancellationToken::new();
    let sweeper = cache.spawn_sweeper(shutdown_token.clone());

    let dispatcher = Arc::new(McpDispatcher::with_default_registry(
        client.clone(),
        cache,
        VERSION,
    ));

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    let result = match cli_args.transport {
        Transport::Http => {
            let state = ServerState::new(
                ServerConfig::from(&app_config),
                VERSION,
                dispatcher,
                client,
                shutdown_token.clone(),
            );
            server::run_server(state).await
        }
        Transport::Stdio => {
            serve_stdio(
                dispatcher,
                tokio::io::stdin(),
                tokio::io::stdout(),
                shutdown_token.clone(),
            )
            .await
        }
    };

    shutdown_token.cancel();
    if let Err(e) = sweeper.await {
        error!("Cache sweeper task failed: {}", e);
    }

    if let Err(e) = &result {
        error!("Server stopped with error: {:#}", e);
    }
    result
}
