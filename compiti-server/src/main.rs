use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ri-utilizziamo le funzioni e strutture definite in lib.rs
use compiti_server::{routes, AppState, Config};

fn init_tracing() {
    //   LOG_FORMAT - "text" (default) oppure "json"
    //   RUST_LOG   - filtro standard (default: "compiti_server=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "compiti_server=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // un eventuale .env nella directory corrente è facoltativo
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("read configuration")?;
    let addr = config.bind_addr()?;

    // Crea subito la directory dei database, così un errore di permessi emerge all'avvio
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("create data dir {:?}", config.data_dir))?;
    info!(data_dir = ?config.data_dir, static_dir = ?config.static_dir, "using directories");

    // Stato dell'applicazione condiviso e rotte
    let state = Arc::new(AppState::new(&config));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind tcp listener")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("server shutdown")?;

    Ok(())
}
