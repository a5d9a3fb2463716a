use attendance_calendar::{AppState, Config, HttpRemote, Tracker, router};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    info!(
        remote = %config.remote_url,
        statuses = ?config.statuses.selectable(),
        multi_select = config.multi_select,
        "configuration loaded"
    );

    let state = AppState::new(
        Tracker::new(config.statuses.clone(), config.multi_select),
        HttpRemote::new(config.remote_url.clone()),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
