//! Drives a [`Script`] through the gesture runtime and collects what came out.

use anyhow::{bail, Context};
use gesture_core::{
    ContentStepper, DragBlocker, DragInputManager, GestureConfig, HotspotTapHandler,
    ManualClock, PinchScaler, RotationController, Runtime, UnifiedInputController,
};
use scene::{LabelIndex, SceneGraph, TransformStore};
use serde::Serialize;
use shared::{
    domain::{ComponentId, EntityId},
    error::ErrorReport,
    protocol::{Address, Event},
};
use tracing::{info, warn};

use crate::script::{Action, Design, Script};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputLine {
    Event {
        at_ms: f64,
        address: Address,
        event: Event,
    },
    Pose {
        entity: EntityId,
        /// `[x, y, z, w]`
        orientation: [f64; 4],
        scale: [f64; 3],
    },
    Content {
        entity: EntityId,
        played: Vec<String>,
    },
    Diagnostic(ErrorReport),
}

pub fn run(script: &Script, config: &GestureConfig) -> anyhow::Result<Vec<OutputLine>> {
    let graph = SceneGraph::from_description(&script.scene).context("building scene")?;
    if !graph.contains(script.owner) {
        bail!("owner entity {} is not part of the scene", script.owner);
    }

    let clock = ManualClock::new(0.0);
    let mut runtime = Runtime::new(graph, clock.clone());
    let owner = script.owner;
    let root = config.target_eid;

    match script.design {
        Design::Unified => {
            let controller = UnifiedInputController::new(
                runtime.bus(),
                owner,
                root,
                config.arbiter.clone(),
                config.sampler.clone(),
            );
            runtime.add(controller);
        }
        Design::Split => {
            let manager = DragInputManager::new(runtime.bus(), owner, root, config.sampler.clone());
            runtime.add(manager);
            runtime.add(DragBlocker::new(owner, root, config.arbiter.clone()));
        }
    }
    let rotation = RotationController::new(runtime.bus(), owner, config.rotation.clone());
    runtime.add(rotation);
    if script.pinch {
        let pinch = PinchScaler::new(runtime.bus(), owner, config.pinch.clone());
        runtime.add(pinch);
    }
    for hotspot in &script.hotspots {
        let label = hotspot
            .label
            .clone()
            .unwrap_or_else(|| config.arbiter.block_drag_label.clone());
        let handler = HotspotTapHandler::new(
            runtime.bus(),
            hotspot.owner,
            label,
            config.arbiter.trigger_event_name.clone(),
        );
        runtime.add(handler);
    }
    let mut steppers: Vec<(EntityId, ComponentId)> = Vec::new();
    for content in &script.content {
        content
            .config
            .validate()
            .with_context(|| format!("content config for entity {}", content.owner))?;
        let stepper = ContentStepper::new(runtime.bus(), content.owner, content.config.clone());
        steppers.push((content.owner, runtime.add(stepper)));
    }

    runtime.bus().enable_journal();
    info!(steps = script.steps.len(), design = ?script.design, "replaying script");

    let mut lines = Vec::new();
    let mut last_ms = f64::NEG_INFINITY;
    for step in &script.steps {
        if step.at_ms < last_ms {
            warn!(at_ms = step.at_ms, previous = last_ms, "step goes back in time");
        }
        last_ms = step.at_ms;
        clock.set(step.at_ms);
        match &step.action {
            Action::Touch(event) => runtime.handle_touch(event.clone()),
            Action::Tick(dt_secs) => runtime.tick(*dt_secs),
        }
        lines.extend(
            runtime
                .bus()
                .take_journal()
                .into_iter()
                .filter(|envelope| matches!(envelope.event, Event::Gesture(_)))
                .map(|envelope| OutputLine::Event {
                    at_ms: step.at_ms,
                    address: envelope.address,
                    event: envelope.event,
                }),
        );
    }

    for node in &script.scene.nodes {
        let scene = runtime.scene();
        let (Some(orientation), Some(scale)) = (scene.orientation(node.id), scene.scale(node.id))
        else {
            continue;
        };
        lines.push(OutputLine::Pose {
            entity: node.id,
            orientation: orientation.to_array(),
            scale: scale.to_array(),
        });
    }
    for (entity, id) in steppers {
        if let Some(stepper) = runtime.component::<ContentStepper>(id) {
            lines.push(OutputLine::Content {
                entity,
                played: stepper.played().to_vec(),
            });
        }
    }
    lines.extend(runtime.take_diagnostics().into_iter().map(OutputLine::Diagnostic));
    Ok(lines)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
