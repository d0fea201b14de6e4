//! Agricultural Model-Serving Gateway - Main Entry Point
//!
//! Usage: `agri-gateway [config.toml]`

use api::config::config_path;
use api::{init_logging, load_config, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config_path(std::env::args_os().nth(1).map(Into::into));
    let config = load_config(path.as_deref())?;
    init_logging(config.server.log_format)?;

    info!("=== Agri Gateway v{} ===", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &path {
        info!("Configuration from {}", path.display());
    }

    run_server(config).await
}
