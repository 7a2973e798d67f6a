use mcq_backend::{
    build_router,
    config::{get_config, init_config},
    error::Error,
    AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    init_config()?;
    let config = get_config()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))?;

    match config.local_backend() {
        Some((url, model)) => info!("Local backend configured: {} ({})", url, model),
        None => info!("Local backend not configured"),
    }
    info!(
        "Cloud backend credentials {}",
        if config.has_cloud_credentials() { "present" } else { "absent" }
    );

    let app_state = AppState::new(config)?;
    let app = build_router(app_state, config);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    info!("API endpoint: http://{}/api/mcq/generate", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
