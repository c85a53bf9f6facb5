//! Port passage service

use std::future::IntoFuture;
use std::sync::Arc;

use port_passage::{
    api::{self, AppState},
    config::AppConfig,
    database::Database,
    errors::TrackerError,
};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), TrackerError> {
    #[cfg(feature = "dotenvy")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Defaults, then config/default.toml, then PORTPASSAGE__* environment variables
    let config = AppConfig::load()?;
    config.validate()?;

    let database = Database::connect(&config.database).await?;

    let listener = tokio::net::TcpListener::bind(config.server.bind_address).await?;
    info!("Listening on {}", config.server.bind_address);

    let state = Arc::new(AppState::new(database, config)?);
    let router = api::router(state);

    let shutdown_signal = signal::ctrl_c();

    tokio::select! {
        result = axum::serve(listener, router).into_future() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
            info!("Server completed");
        }
        _ = shutdown_signal => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}
