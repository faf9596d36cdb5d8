use anyhow::Context;
use config::AppConfig;
use state::AppState;
use tokio::net::TcpListener;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

mod config;
mod error;
mod handlers;
mod platform;
mod service;
mod state;
mod utils;


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init_timed();

    info!("Starting igfetch...");

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    info!("Initializing AppState...");
    let state = AppState::init(&config)
        .await
        .context("Failed to initialize application state")?;

    let app = handlers::router(state, &config.server.allowed_origins)?;

    let listener = TcpListener::bind(config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;

    info!("Listening on {}", config.server.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");

    Ok(())
}
