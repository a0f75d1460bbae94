use clap::Parser;
use dify_wrapper::{build_router, AppState, SharedLogger, WrapperConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "dify-wrapper",
    about = "Simplified HTTP wrapper around the Dify conversational API",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Request log file path
    #[arg(long, default_value = "dify-wrapper.log")]
    log_file: PathBuf,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dify_wrapper=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        println!("  1. dify-wrapper.toml (current directory)");
        if cfg!(target_os = "macos") {
            println!("  2. ~/Library/Application Support/dify-wrapper/config.toml");
        } else {
            println!("  2. $XDG_CONFIG_HOME/dify-wrapper/config.toml");
            println!("     ~/.config/dify-wrapper/config.toml");
        }
        println!("  3. ~/.dify-wrapper.toml");
        println!("A config file is optional; defaults apply without one.");
        return Ok(());
    }

    let mut config = WrapperConfig::find_and_load(cli.config.as_deref())?;

    if let Some(port) = cli.port {
        config.port = port;
    }

    let logger = SharedLogger::new(&cli.log_file)?;

    // The API key is resolved per request, never validated at startup; only
    // report whether it is currently present.
    info!("dify-wrapper v{}", env!("CARGO_PKG_VERSION"));
    info!("  Base URL:       {}", config.effective_base_url());
    info!("  API key env:    {}", config.dify.api_key_env);
    info!(
        "  Key configured: {}",
        if config.api_key_configured() { "yes" } else { "no" }
    );
    info!("  Environment:    {}", config.environment_label());
    info!("  Port:           {}", config.port);
    info!("  Log file:       {}", cli.log_file.display());

    logger.info(
        "startup",
        format!(
            "Starting dify-wrapper base_url={} port={}",
            config.effective_base_url(),
            config.port
        ),
    );

    let client = reqwest::Client::new();

    let state = Arc::new(AppState {
        config: config.clone(),
        client,
        logger: logger.clone(),
    });

    let app = build_router(state);
    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Listening on http://{}", bind_addr);
    info!("  POST /chat         - chat relay");
    info!("  POST /completion   - completion relay");
    info!("  GET  /health       - health check");
    info!("  GET  /             - API documentation");

    axum::serve(listener, app).await?;

    Ok(())
}
