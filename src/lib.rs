pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve" | "daemon" | "-d" | "--daemon") => {
            run_server(config, prometheus_handle).await
        }

        Some("init" | "--init") => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }

        Some(other) => {
            println!("Unknown command: {other}");
            println!();
            print_help();
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.clone(), value.clone())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

fn print_help() {
    println!("Vitrine - Storefront platform backend");
    println!();
    println!("USAGE:");
    println!("  vitrine [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("  serve             Run the API server (default)");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure database, branding, email, etc.");
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Vitrine v{} starting...", env!("CARGO_PKG_VERSION"));

    if !config.server.enabled {
        anyhow::bail!("Server is disabled in config.toml");
    }

    if config.security.master_password.is_some() {
        tracing::warn!("Master-password override is configured");
    }

    let port = config.server.port;

    let shared = Arc::new(SharedState::new(config).await?);
    let api_state = api::create_app_state(shared, prometheus_handle).await;

    let app = api::router(api_state).await;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("API server running at http://0.0.0.0:{port}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    info!("Running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Stopped");

    Ok(())
}
