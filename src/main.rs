//! # Judgment Search Gateway Main Driver
//!
//! ## Purpose
//! Main entry point for the gateway server. Loads configuration, initializes
//! logging and the collaborator clients, builds the asset mapping, and runs
//! the web server until shutdown.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Construct the search engine and object storage clients
//! 4. Build the asset mapping snapshot (asset domain only; search serves
//!    even when this fails)
//! 5. Start the web API server
//! 6. Handle shutdown signals gracefully

use clap::{Arg, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use judgment_search_gateway::{
    api::ApiServer,
    assets::AssetLocator,
    config::Config,
    engine::EngineClient,
    errors::{GatewayError, Result},
    gateway::SearchGateway,
    storage::ObjectStore,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("judgment-gateway-server")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Legal Search Team")
        .about("Search gateway for a legal judgment corpus")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("check-health")
                .long("check-health")
                .help("Probe the search engine collaborator and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");
    let mut config = Config::from_file(config_path)?;

    // Override port if specified
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let config = Arc::new(config);

    init_logging(&config)?;

    info!("Starting Judgment Search Gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    let engine = Arc::new(EngineClient::new(config.engine.clone())?);

    if matches.get_flag("check-health") {
        return run_health_check(&engine).await;
    }

    let app_state = initialize_components(config.clone(), engine).await?;

    let server = ApiServer::new(app_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server error: {}", e);
        }
    });

    info!(
        "Judgment Search Gateway started on {}:{}",
        config.server.host, config.server.port
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    info!("Judgment Search Gateway shut down");
    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let log_level: tracing::Level =
        config
            .logging
            .level
            .parse()
            .map_err(|_| GatewayError::Config {
                message: format!("Invalid log level: {}", config.logging.level),
            })?;
    let filter = tracing_subscriber::filter::LevelFilter::from_level(log_level);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);
    let fmt_layer = if config.logging.json_format {
        fmt_layer.json().with_filter(filter).boxed()
    } else {
        fmt_layer.with_filter(filter).boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).init();

    info!("Logging initialized with level: {}", config.logging.level);
    Ok(())
}

/// Initialize all application components.
///
/// The asset mapping and the search path are independent failure domains:
/// a failed mapping build disables asset resolution but never search.
async fn initialize_components(
    config: Arc<Config>,
    engine: Arc<EngineClient>,
) -> Result<AppState> {
    info!("Initializing application components...");

    if !engine.ping().await {
        warn!("Search engine did not respond to ping; continuing anyway");
    }

    let store = Arc::new(ObjectStore::new(config.storage.clone())?);

    let assets = match AssetLocator::build(store, &config.storage).await {
        Ok(locator) => Some(Arc::new(locator)),
        Err(e) => {
            error!("Asset mapping build failed, asset resolution disabled: {}", e);
            None
        }
    };

    let gateway = Arc::new(SearchGateway::new(config.clone(), engine, assets));

    info!("All components initialized");
    Ok(AppState { config, gateway })
}

/// Probe the search engine and exit with a status report
async fn run_health_check(engine: &EngineClient) -> Result<()> {
    if engine.ping().await {
        info!("Search engine is reachable");
        Ok(())
    } else {
        Err(GatewayError::SearchEngineUnavailable {
            details: "ping failed".to_string(),
        })
    }
}
