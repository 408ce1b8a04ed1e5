use serde::{Deserialize, Serialize};
use shared::{domain::EntityId, error::GestureError};

pub const DEFAULT_BLOCK_LABEL: &str = "audio";
pub const DEFAULT_MODEL_LABEL: &str = "model";
pub const DEFAULT_TRIGGER_EVENT: &str = "play-audio-trigger";

/// Per-instance tuning, static once a component is created. Every section
/// falls back to its defaults so partial files deserialize.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Entity that owns the drag lifecycle; the hosting entity when unset.
    pub target_eid: Option<EntityId>,
    pub sampler: SamplerConfig,
    pub arbiter: ArbiterConfig,
    pub rotation: RotationConfig,
    pub pinch: PinchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub deadzone_px: f64,
    pub velocity_window_ms: f64,
    pub max_speed_px_per_sec: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            deadzone_px: 0.0,
            velocity_window_ms: 100.0,
            max_speed_px_per_sec: 8000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    pub block_drag_label: String,
    pub model_label: String,
    pub trigger_event_name: String,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            block_drag_label: DEFAULT_BLOCK_LABEL.into(),
            model_label: DEFAULT_MODEL_LABEL.into(),
            trigger_event_name: DEFAULT_TRIGGER_EVENT.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub camera_eid: Option<EntityId>,
    pub radians_per_pixel: f64,
    pub drag_gain: f64,
    pub flick_threshold_px_per_sec: f64,
    /// Radians per second of spin per pixel per second of release speed.
    pub flick_impulse_gain: f64,
    pub min_flick_angular_vel: f64,
    pub history_lookback_frames: usize,
    pub decay_rate: f64,
    pub model_label: String,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            camera_eid: None,
            radians_per_pixel: 0.006,
            drag_gain: 1.0,
            flick_threshold_px_per_sec: 900.0,
            flick_impulse_gain: 0.006,
            min_flick_angular_vel: 0.8,
            history_lookback_frames: 3,
            decay_rate: 1.5,
            model_label: DEFAULT_MODEL_LABEL.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub model_label: String,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.25,
            max_scale: 4.0,
            model_label: DEFAULT_MODEL_LABEL.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    #[default]
    Technical,
    Analogy,
}

/// Narration content attached to one hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub base: String,
    pub mode: ContentMode,
    pub track_count: usize,
    pub trigger_event_name: String,
    pub allow_direct_touch: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base: "heatsink".into(),
            mode: ContentMode::Technical,
            track_count: 1,
            trigger_event_name: DEFAULT_TRIGGER_EVENT.into(),
            allow_direct_touch: false,
        }
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), GestureError> {
    if !value.is_finite() || value < 0.0 {
        return Err(GestureError::invalid_config(
            field,
            format!("expected a finite non-negative number, got {value}"),
        ));
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), GestureError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GestureError::invalid_config(
            field,
            format!("expected a finite positive number, got {value}"),
        ));
    }
    Ok(())
}

fn label(field: &'static str, value: &str) -> Result<(), GestureError> {
    if value.trim().is_empty() {
        return Err(GestureError::invalid_config(field, "label must not be empty"));
    }
    Ok(())
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        non_negative("deadzone_px", self.deadzone_px)?;
        positive("velocity_window_ms", self.velocity_window_ms)?;
        positive("max_speed_px_per_sec", self.max_speed_px_per_sec)
    }
}

impl ArbiterConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        label("block_drag_label", &self.block_drag_label)?;
        label("model_label", &self.model_label)?;
        label("trigger_event_name", &self.trigger_event_name)?;
        if self.block_drag_label == self.model_label {
            return Err(GestureError::invalid_config(
                "block_drag_label",
                "blocking and rotatable labels must differ",
            ));
        }
        Ok(())
    }
}

impl RotationConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        non_negative("radians_per_pixel", self.radians_per_pixel)?;
        non_negative("drag_gain", self.drag_gain)?;
        non_negative("flick_threshold_px_per_sec", self.flick_threshold_px_per_sec)?;
        non_negative("flick_impulse_gain", self.flick_impulse_gain)?;
        non_negative("min_flick_angular_vel", self.min_flick_angular_vel)?;
        non_negative("decay_rate", self.decay_rate)?;
        if self.history_lookback_frames == 0 {
            return Err(GestureError::invalid_config(
                "history_lookback_frames",
                "lookback must be at least one frame",
            ));
        }
        label("model_label", &self.model_label)
    }
}

impl PinchConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        positive("min_scale", self.min_scale)?;
        positive("max_scale", self.max_scale)?;
        if self.min_scale > self.max_scale {
            return Err(GestureError::invalid_config(
                "min_scale",
                format!("{} exceeds max_scale {}", self.min_scale, self.max_scale),
            ));
        }
        label("model_label", &self.model_label)
    }
}

impl ContentConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        label("base", &self.base)?;
        label("trigger_event_name", &self.trigger_event_name)?;
        if self.track_count == 0 {
            return Err(GestureError::invalid_config(
                "track_count",
                "content needs at least one track",
            ));
        }
        Ok(())
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        self.sampler.validate()?;
        self.arbiter.validate()?;
        self.rotation.validate()?;
        self.pinch.validate()
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
