use axum::{Json, extract::{Query, State}};
use serde::{Serialize, Deserialize};
use std::sync::Arc;
use parking_lot::RwLock;
use uuid::Uuid;
use chrono::Utc;

use crate::error::ApiError;
use crate::generator::{BusyFlag, ImageGenerator};
use crate::history::HistoryStore;
use crate::models::{ApplyPresetRequest, Generation, Preset, ReuseRequest, UpdateParams};
use crate::storage::{push_capped, StateStore};

#[derive(Clone)]
pub struct AppState {
    pub history: Arc<RwLock<HistoryStore<Generation>>>,
    pub completed: Arc<RwLock<Vec<Generation>>>,
    pub generator: Arc<dyn ImageGenerator>,
    pub store: Arc<dyn StateStore>,
    pub busy: BusyFlag,
}

pub fn default_presets() -> Vec<Preset> {
    vec![
        Preset { name: "High Quality".into(), model: "Juggernaut".into(), resolution: "1024x1024".into(), style: "realism".into(), cfg_scale: 7.0, steps: 50 },
        Preset { name: "Fast Generation".into(), model: "Flux1.Dev".into(), resolution: "512x512".into(), style: "anime".into(), cfg_scale: 5.0, steps: 20 },
        Preset { name: "Creative".into(), model: "SdXL".into(), resolution: "768x768".into(), style: "fantasy".into(), cfg_scale: 9.0, steps: 40 },
    ]
}

pub fn prompt_suggestions() -> Vec<&'static str> {
    vec![
        "A cyberpunk cityscape at night with neon lights",
        "Medieval castle in a magical forest",
        "Astronaut floating in space with colorful nebula",
        "Steampunk airship flying over mountains",
    ]
}

/// Current snapshot plus everything the form needs to render its controls.
#[derive(Debug, Serialize)]
pub struct ParamsView {
    pub current: Generation,
    pub cursor: i64,
    pub can_undo: bool,
    pub can_redo: bool,
    pub complexity: f64,
}

fn view(history: &HistoryStore<Generation>) -> ParamsView {
    let current = history.current().cloned().unwrap_or_default();
    ParamsView {
        cursor: history.cursor_index(),
        can_undo: history.can_undo(),
        can_redo: history.can_redo(),
        complexity: current.complexity(),
        current,
    }
}

pub async fn get_params(State(state): State<AppState>) -> Json<ParamsView> {
    Json(view(&state.history.read()))
}

pub async fn update_params(State(state): State<AppState>, Json(body): Json<UpdateParams>) -> Json<ParamsView> {
    let mut history = state.history.write();
    let merged = history.current().cloned().unwrap_or_default().merged(&body);
    match body.edit_key.as_deref() {
        Some(key) => history.commit_coalesced(key, merged),
        None => history.commit(merged),
    }
    Json(view(&history))
}

pub async fn undo_params(State(state): State<AppState>) -> Json<ParamsView> {
    let mut history = state.history.write();
    history.undo();
    Json(view(&history))
}

pub async fn redo_params(State(state): State<AppState>) -> Json<ParamsView> {
    let mut history = state.history.write();
    history.redo();
    Json(view(&history))
}

pub async fn apply_preset(
    State(state): State<AppState>,
    Json(body): Json<ApplyPresetRequest>,
) -> Result<Json<ParamsView>, ApiError> {
    let preset = default_presets()
        .into_iter()
        .find(|p| p.name == body.name)
        .ok_or_else(|| ApiError::UnknownPreset(body.name.clone()))?;

    tracing::info!("🎛️ Applying preset: {}", preset.name);
    let mut history = state.history.write();
    let next = history.current().cloned().unwrap_or_default().with_preset(&preset);
    history.commit(next);
    Ok(Json(view(&history)))
}

pub async fn list_presets() -> Json<Vec<Preset>> {
    Json(default_presets())
}

pub async fn list_suggestions() -> Json<Vec<&'static str>> {
    Json(prompt_suggestions())
}

#[derive(Debug, Serialize)]
pub struct OptionsView {
    pub resolutions: Vec<&'static str>,
    pub models: Vec<&'static str>,
    pub samplers: Vec<&'static str>,
}

pub async fn list_options() -> Json<OptionsView> {
    Json(OptionsView {
        resolutions: vec!["512x512", "768x768", "1024x1024"],
        models: vec!["Flux1.Dev", "Juggernaut", "SdXL"],
        samplers: vec!["Euler a", "Euler", "Heun", "DPM2"],
    })
}

/// Runs the simulated generation for the current parameters: validates the
/// seed, claims the busy flag (one generation in flight at most), waits out
/// the simulated delay, then commits the completed snapshot and persists.
pub async fn run_generation(State(state): State<AppState>) -> Result<Json<Generation>, ApiError> {
    let current = state.history.read().current().cloned().unwrap_or_default();
    if !current.seed_is_valid() {
        return Err(ApiError::InvalidSeed);
    }
    let _guard = state.busy.try_acquire().ok_or(ApiError::GenerationInFlight)?;

    tracing::info!("🚀 Generating for prompt: {}", current.prompt);
    let preview = state.generator.generate_preview(&current).await;

    let completed = Generation {
        id: Some(Uuid::new_v4()),
        timestamp: Some(Utc::now()),
        preview: Some(preview),
        ..current
    };

    state.history.write().commit(completed.clone());
    {
        let mut list = state.completed.write();
        push_capped(&mut list, completed.clone());
    }
    persist(&state);

    tracing::info!("✅ Generation complete: {:?}", completed.id);
    Ok(Json(completed))
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

pub async fn list_generations(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Generation>> {
    let list = state.completed.read();
    let filtered = match query.q.as_deref().filter(|q| !q.is_empty()) {
        Some(q) => {
            let needle = q.to_lowercase();
            list.iter()
                .filter(|g| {
                    g.prompt.to_lowercase().contains(&needle)
                        || g.model.to_lowercase().contains(&needle)
                        || g.resolution.contains(q)
                })
                .cloned()
                .collect()
        }
        None => list.clone(),
    };
    Json(filtered)
}

/// Re-commits a past completed generation as the current snapshot.
pub async fn reuse_generation(
    State(state): State<AppState>,
    Json(body): Json<ReuseRequest>,
) -> Result<Json<ParamsView>, ApiError> {
    let reused = state
        .completed
        .read()
        .iter()
        .find(|g| g.id == Some(body.id))
        .cloned()
        .ok_or(ApiError::UnknownGeneration(body.id))?;

    tracing::info!("♻️ Reusing generation {}", body.id);
    let mut history = state.history.write();
    history.commit(reused);
    Ok(Json(view(&history)))
}

/// The two persisted entries as last written.
#[derive(Debug, Serialize)]
pub struct PersistedState {
    pub current: Option<Generation>,
    pub completed: Vec<Generation>,
}

pub async fn get_persisted_state(State(state): State<AppState>) -> Json<PersistedState> {
    Json(PersistedState {
        current: state.store.load_current(),
        completed: state.store.load_completed(),
    })
}

/// Explicit save of both entries; unlike the implicit post-generation save,
/// failures here surface to the caller.
pub async fn save_state(State(state): State<AppState>) -> Result<Json<PersistedState>, ApiError> {
    let current = state.history.read().current().cloned();
    if let Some(current) = &current {
        state.store.save_current(current)?;
    }
    let completed = state.completed.read().clone();
    state.store.save_completed(&completed)?;
    Ok(Json(PersistedState { current, completed }))
}

// Post-generation save. Persistence failures are logged and tolerated; the
// in-memory state is already consistent.
fn persist(state: &AppState) {
    if let Some(current) = state.history.read().current().cloned() {
        if let Err(e) = state.store.save_current(&current) {
            tracing::warn!("Failed to save current params: {}", e);
        }
    }
    let completed = state.completed.read().clone();
    if let Err(e) = state.store.save_completed(&completed) {
        tracing::warn!("Failed to save generation history: {}", e);
    }
}
