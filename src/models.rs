use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A full snapshot of the generation parameters at one point in edit history.
///
/// `id`, `timestamp` and `preview` stay unset while the snapshot is only an
/// edit; they are filled in when a simulated generation completes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Generation {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub prompt: String,
    pub resolution: String,
    pub model: String,
    pub style: String,
    pub cfg_scale: f64,
    pub steps: u32,
    #[serde(default)]
    pub seed: String,
    pub sampler: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preview: Option<String>,
}

impl Default for Generation {
    fn default() -> Self {
        Self {
            id: None,
            prompt: String::new(),
            resolution: "512x512".into(),
            model: "Flux1.Dev".into(),
            style: "realism".into(),
            cfg_scale: 7.0,
            steps: 30,
            seed: String::new(),
            sampler: "Euler a".into(),
            timestamp: None,
            preview: None,
        }
    }
}

impl Generation {
    /// The seed is the only validated input: empty, or all digits.
    pub fn seed_is_valid(&self) -> bool {
        self.seed.is_empty() || self.seed.chars().all(|c| c.is_ascii_digit())
    }

    /// Horizontal pixel count of the resolution, e.g. 768 for "768x768".
    pub fn resolution_px(&self) -> u32 {
        self.resolution
            .split('x')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(512)
    }

    /// Relative generation cost: (resolution / 512) * (steps / 30),
    /// rounded to two decimals.
    pub fn complexity(&self) -> f64 {
        let resolution_factor = f64::from(self.resolution_px()) / 512.0;
        let steps_factor = f64::from(self.steps) / 30.0;
        (resolution_factor * steps_factor * 100.0).round() / 100.0
    }

    /// Copy of this snapshot with the changed fields applied.
    pub fn merged(&self, update: &UpdateParams) -> Generation {
        let mut next = self.clone();
        if let Some(v) = &update.prompt { next.prompt = v.clone(); }
        if let Some(v) = &update.resolution { next.resolution = v.clone(); }
        if let Some(v) = &update.model { next.model = v.clone(); }
        if let Some(v) = &update.style { next.style = v.clone(); }
        if let Some(v) = update.cfg_scale { next.cfg_scale = v; }
        if let Some(v) = update.steps { next.steps = v; }
        if let Some(v) = &update.seed { next.seed = v.clone(); }
        if let Some(v) = &update.sampler { next.sampler = v.clone(); }
        next
    }

    /// Copy of this snapshot with a preset's parameter bundle applied.
    pub fn with_preset(&self, preset: &Preset) -> Generation {
        let mut next = self.clone();
        next.model = preset.model.clone();
        next.resolution = preset.resolution.clone();
        next.style = preset.style.clone();
        next.cfg_scale = preset.cfg_scale;
        next.steps = preset.steps;
        next
    }
}

/// Partial parameter update; `None` fields keep their current value.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct UpdateParams {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub cfg_scale: Option<f64>,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default)]
    pub sampler: Option<String>,
    /// When set, consecutive updates carrying the same key collapse into one
    /// history step (e.g. a typing burst in the prompt field).
    #[serde(default)]
    pub edit_key: Option<String>,
}

/// A named parameter bundle applied in one step.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Preset {
    pub name: String,
    pub model: String,
    pub resolution: String,
    pub style: String,
    pub cfg_scale: f64,
    pub steps: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApplyPresetRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ReuseRequest {
    pub id: Uuid,
}
