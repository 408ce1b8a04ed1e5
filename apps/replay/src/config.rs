use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use gesture_core::GestureConfig;
use shared::domain::EntityId;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "gesture.toml";

/// Defaults, then `gesture.toml` (or the explicit `--config` file), then
/// `GESTURE__*` environment overrides. The result is validated.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<GestureConfig> {
    load_settings_with(explicit, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<GestureConfig> {
    let mut settings = match explicit {
        Some(path) => read_config_file(path)?,
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if fallback.exists() {
                read_config_file(&fallback)?
            } else {
                GestureConfig::default()
            }
        }
    };
    apply_env_overrides(&mut settings, env)?;
    settings
        .validate()
        .context("gesture configuration is invalid")?;
    Ok(settings)
}

fn read_config_file(path: &Path) -> anyhow::Result<GestureConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let settings = toml::from_str::<GestureConfig>(&raw)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded gesture config");
    Ok(settings)
}

fn parse_f64(key: &str, raw: &str) -> anyhow::Result<f64> {
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("{key} must be a number, got {raw:?}"))
}

fn apply_env_overrides(
    settings: &mut GestureConfig,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = env("GESTURE__DEADZONE_PX") {
        settings.sampler.deadzone_px = parse_f64("GESTURE__DEADZONE_PX", &v)?;
    }
    if let Some(v) = env("GESTURE__FLICK_THRESHOLD_PX_PER_SEC") {
        settings.rotation.flick_threshold_px_per_sec =
            parse_f64("GESTURE__FLICK_THRESHOLD_PX_PER_SEC", &v)?;
    }
    if let Some(v) = env("GESTURE__DECAY_RATE") {
        settings.rotation.decay_rate = parse_f64("GESTURE__DECAY_RATE", &v)?;
    }
    if let Some(v) = env("GESTURE__RADIANS_PER_PIXEL") {
        settings.rotation.radians_per_pixel = parse_f64("GESTURE__RADIANS_PER_PIXEL", &v)?;
    }
    if let Some(v) = env("GESTURE__CAMERA_EID") {
        let v = v.trim();
        if v.is_empty() || v == "0" {
            settings.rotation.camera_eid = None;
        } else {
            match v.parse::<i64>() {
                Ok(id) => settings.rotation.camera_eid = Some(EntityId(id)),
                Err(_) => bail!("GESTURE__CAMERA_EID must be an integer entity id, got {v:?}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
