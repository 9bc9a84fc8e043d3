use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::info;

use review_roster::api;
use review_roster::config::Config;
use review_roster::db;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::initialize(&config.database_path)
        .await
        .context("failed to initialize database")?;
    info!("database ready at {}", config.database_path.display());

    let app = api::router(pool).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}
