use std::{fs, path::Path};

use anyhow::Context;
use gesture_core::ContentConfig;
use scene::SceneDescription;
use serde::{Deserialize, Serialize};
use shared::{domain::EntityId, protocol::TouchEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Design {
    #[default]
    Unified,
    Split,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotEntry {
    pub owner: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    pub owner: EntityId,
    #[serde(default)]
    pub config: ContentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Touch(TouchEvent),
    /// Frame delta in seconds.
    Tick(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub at_ms: f64,
    #[serde(flatten)]
    pub action: Action,
}

/// A recorded session: the scene, which components to host, and the timed
/// host input to feed them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub scene: SceneDescription,
    /// Entity hosting the input and rotation components.
    pub owner: EntityId,
    #[serde(default)]
    pub design: Design,
    #[serde(default)]
    pub pinch: bool,
    #[serde(default)]
    pub hotspots: Vec<HotspotEntry>,
    #[serde(default)]
    pub content: Vec<ContentEntry>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    /// Reads a script as TOML when the extension says so, JSON otherwise.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let script = if is_toml {
            toml::from_str(&raw).with_context(|| format!("parsing script {}", path.display()))?
        } else {
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing script {}", path.display()))?
        };
        Ok(script)
    }
}
