use std::sync::Arc;
use tracing::{error, info};

use supply_dash::web::server::WebServer;
use supply_dash::{Config, Dashboard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "supply_dash=info".into()),
        )
        .init();

    info!("📦 supply-dash v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "supply-dash.toml".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        let config = Config::load(&config_path)?;
        info!("Config loaded from {}", config_path);
        config
    } else {
        info!("No config at {}, using defaults", config_path);
        Config::default()
    };

    let config = Arc::new(config);
    let dashboard = Arc::new(Dashboard::new(config.clone()));

    // Startup imports (replaces a one-off import command)
    let import_dashboard = dashboard.clone();
    tokio::task::spawn_blocking(move || import_dashboard.import_startup_files()).await?;

    let summary = dashboard.summary();
    info!(
        "Store ready: {} suppliers, {} products, {} orders",
        summary.supplier_count, summary.product_count, summary.order_count
    );

    let web = WebServer::new(dashboard, config);
    if let Err(e) = web.run().await {
        error!("Web server error: {}", e);
        return Err(e);
    }
    Ok(())
}
