use inkpost::{AppState, config::AppConfig, db, routes};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=info,tower_http=info".into()),
        )
        .init();

    let settings = AppConfig::load()?;

    let pool = db::setup_database(&settings).await?;
    let state = AppState::new(pool, settings.clone());
    if settings.media.serve {
        tokio::fs::create_dir_all(state.media.root()).await?;
    }
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    info!("Inkpost listening on http://{}", settings.server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
