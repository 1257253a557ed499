use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use clinic_core::config::age_refresh_time_from_env_value;
use clinic_core::{AgeRefreshScheduler, CoreConfig};
use clinic_docstore::DocStore;

/// Main entry point for the clinic administration service.
///
/// Starts the REST server and the daily age-refresh scheduler against one
/// shared document store. The store handle is opened once here and reused by
/// every request and by the scheduler for the process lifetime.
///
/// # Environment Variables
/// - `CLINIC_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Document store root (default: "/clinic_data")
/// - `CLINIC_AGE_REFRESH_TIME`: Daily age-refresh time, HH:MM (default: "00:00")
///
/// # Returns
/// * `Ok(())` - If the server runs and shuts down cleanly
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINIC_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| "/clinic_data".into());
    let refresh_time =
        age_refresh_time_from_env_value(std::env::var("CLINIC_AGE_REFRESH_TIME").ok())?;
    let cfg = CoreConfig::new(PathBuf::from(data_dir), refresh_time);

    tracing::info!("++ Starting clinic REST on {}", rest_addr);
    tracing::info!("++ Using document store at {}", cfg.data_dir().display());

    let store = DocStore::open(cfg.data_dir().to_path_buf())?;
    let state = AppState::new(&store);

    // The scheduler owns its own lifecycle; it is started here and stopped
    // after the server exits.
    let scheduler =
        AgeRefreshScheduler::new(state.patients.clone(), cfg.age_refresh_time()).start();

    let app = api_rest::build_router(state);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
