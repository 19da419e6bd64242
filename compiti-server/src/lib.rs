use anyhow::Context;
use axum::http::StatusCode;
use std::net::SocketAddr;
use std::path::PathBuf;

pub mod controllers;
pub mod identity;
pub mod routes;
pub mod store;

use store::StoreRouter;

/// Porta di default quando PORT non è impostata.
pub const DEFAULT_PORT: u16 = 5000;

/// Configurazione del server, letta dalle variabili d'ambiente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_host: String,
    pub port: u16,
    /// Directory che contiene un file SQLite per ogni utente.
    pub data_dir: PathBuf,
    /// Directory con la single page application già compilata (index.html + asset).
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("databases"),
            static_dir: PathBuf::from("dist"),
        }
    }
}

impl Config {
    /// Legge PORT, BIND_HOST, DATA_DIR e STATIC_DIR dall'ambiente.
    /// Le variabili non impostate prendono il valore di default.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Separata da from_env così i test non devono toccare l'ambiente del processo.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("parse PORT {:?}", port))?;
        }
        if let Some(host) = lookup("BIND_HOST") {
            config.bind_host = host;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    /// Indirizzo host:porta su cui mettersi in ascolto.
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let raw = format!("{}:{}", self.bind_host, self.port);
        raw.parse().with_context(|| format!("parse bind address {}", raw))
    }
}

/// Stato condiviso fra gli handler. Non contiene connessioni: ogni richiesta
/// apre e chiude il database del proprio utente tramite `stores`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub stores: StoreRouter,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            stores: StoreRouter::new(config.data_dir.clone()),
            static_dir: config.static_dir.clone(),
        }
    }
}

/// Controlla lo stato di salute: la directory dei database deve esistere (o essere creabile).
pub async fn health_with_stores(stores: &StoreRouter) -> StatusCode {
    match tokio::fs::create_dir_all(stores.data_dir()).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, data_dir = ?stores.data_dir(), "health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
