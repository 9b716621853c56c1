use anyhow::Context;
use itinera::{
    AppState, ConfigManager, Provider, TripRequestValidator, build_app,
    cli::{Cli, Commands, describe_config},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();

    if let Some(Commands::Config { full, validate }) = cli.command {
        let report = describe_config(&cli.config, full, validate)
            .with_context(|| format!("invalid configuration in {}", cli.config.display()))?;
        println!("{}", report);
        return Ok(());
    }

    let mut config_manager = ConfigManager::new(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let config = config_manager.config();

    init_tracing(&config.server.log_level, config.server.json_logs, cli.verbose);
    tracing::info!(config = %cli.config.display(), "Configuration loaded");

    if let Err(e) = config_manager.start_watching() {
        tracing::warn!("Config hot-reload disabled: {}", e);
    }

    let provider = Provider::from_config(&config.provider)?;
    tracing::info!(
        provider = provider.name(),
        model = provider.default_model(),
        "Model provider configured"
    );
    let llm = provider.create_client()?;

    let state = AppState {
        config_manager: Arc::new(config_manager),
        llm,
        validator: Arc::new(TripRequestValidator::new()?),
    };
    let app = build_app(state)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server.host / server.port")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

/// `RUST_LOG` wins over the configured level; `--verbose` forces debug.
fn init_tracing(log_level: &str, json: bool, verbose: bool) {
    let level = if verbose { "debug" } else { log_level };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
