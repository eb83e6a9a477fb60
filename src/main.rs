mod routes;
mod models;
mod history;
mod storage;
mod generator;
mod error;

use axum::{Router, routing::{post, get}};
use routes::{
    AppState, apply_preset, get_params, get_persisted_state, list_generations, list_options,
    list_presets, list_suggestions, redo_params, reuse_generation, run_generation, save_state,
    undo_params, update_params,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};
use tower_http::cors::{CorsLayer, Any};
use parking_lot::RwLock;

use crate::generator::{BusyFlag, SimulatedGenerator};
use crate::history::HistoryStore;
use crate::storage::{JsonFileStore, StateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let data_dir: PathBuf = std::env::var("ART_STUDIO_DATA_DIR")
        .unwrap_or_else(|_| "data".into())
        .into();
    tracing::info!("Using data directory: {}", data_dir.display());
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(data_dir));

    // Restore persisted state; absent or malformed entries simply skip.
    let history = match store.load_current() {
        Some(params) => {
            tracing::info!("Restored saved parameters (prompt: {:?})", params.prompt);
            HistoryStore::seeded(params)
        }
        None => HistoryStore::new(),
    };
    let completed = store.load_completed();
    tracing::info!("Restored {} completed generations", completed.len());

    let state = AppState {
        history: Arc::new(RwLock::new(history)),
        completed: Arc::new(RwLock::new(completed)),
        generator: Arc::new(SimulatedGenerator::from_env()),
        store,
        busy: BusyFlag::default(),
    };

    let app = Router::new()
        .route("/api/params", get(get_params).post(update_params))
        .route("/api/params/undo", post(undo_params))
        .route("/api/params/redo", post(redo_params))
        .route("/api/params/preset", post(apply_preset))
        .route("/api/presets", get(list_presets))
        .route("/api/suggestions", get(list_suggestions))
        .route("/api/options", get(list_options))
        .route("/api/generate", post(run_generation))
        .route("/api/generations", get(list_generations))
        .route("/api/generations/reuse", post(reuse_generation))
        .route("/api/state", get(get_persisted_state))
        .route("/api/state/save", post(save_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state);

    let port: u16 = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
    let addr = SocketAddr::from(([0,0,0,0], port));
    tracing::info!(%addr, "Starting server");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
