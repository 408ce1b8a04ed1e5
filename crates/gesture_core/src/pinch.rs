use std::any::Any;

use glam::DVec3;
use scene::TransformStore;
use shared::{
    domain::EntityId,
    error::GestureError,
    protocol::{Envelope, Event, EventKind, TouchEvent},
};
use tracing::debug;

use crate::{
    arbiter::find_descendant_with_label,
    bus::{EventBus, Interest, Subscription},
    config::PinchConfig,
    runtime::{Component, Context},
};

#[derive(Debug, Clone, Copy)]
struct PinchSession {
    start_distance: f64,
    base_scale: DVec3,
    target: EntityId,
}

/// Two-finger pinch to uniform scale of the model under `owner`, relative to
/// the scale it had when the pinch began.
pub struct PinchScaler {
    owner: EntityId,
    config: PinchConfig,
    session: Option<PinchSession>,
    subscription: Subscription,
}

fn valid_distance(distance: Option<f64>) -> Option<f64> {
    distance.filter(|d| d.is_finite() && *d > 0.0)
}

impl PinchScaler {
    pub fn new(bus: &EventBus, owner: EntityId, config: PinchConfig) -> Self {
        Self {
            owner,
            config,
            session: None,
            subscription: bus.subscribe([
                Interest::global(EventKind::PinchStart),
                Interest::global(EventKind::Pinch),
                Interest::global(EventKind::PinchEnd),
            ]),
        }
    }

    pub fn is_pinching(&self) -> bool {
        self.session.is_some()
    }

    fn on_start(&mut self, distance: Option<f64>, ctx: &mut Context<'_>) {
        let Some(start_distance) = valid_distance(distance) else {
            ctx.report("pinch", GestureError::malformed("pinch_start", "distance"));
            return;
        };
        let target = find_descendant_with_label(ctx.scene(), self.owner, &self.config.model_label)
            .unwrap_or(self.owner);
        let Some(base_scale) = ctx.scene().scale(target) else {
            ctx.report("pinch", GestureError::UnknownEntity(target));
            return;
        };
        debug!(owner = %self.owner, %target, start_distance, "pinch started");
        self.session = Some(PinchSession {
            start_distance,
            base_scale,
            target,
        });
    }

    fn on_pinch(&mut self, distance: Option<f64>, ctx: &mut Context<'_>) {
        let Some(session) = self.session else {
            return;
        };
        let Some(distance) = valid_distance(distance) else {
            ctx.report("pinch", GestureError::malformed("pinch", "distance"));
            return;
        };
        let scale = (session.base_scale * (distance / session.start_distance)).clamp(
            DVec3::splat(self.config.min_scale),
            DVec3::splat(self.config.max_scale),
        );
        if let Err(error) = ctx.scene_mut().set_scale(session.target, scale) {
            ctx.report("pinch", error);
        }
    }
}

impl Component for PinchScaler {
    fn name(&self) -> &'static str {
        "pinch"
    }

    fn subscription(&self) -> Option<&Subscription> {
        Some(&self.subscription)
    }

    fn handle(&mut self, envelope: &Envelope, ctx: &mut Context<'_>) {
        match envelope.event {
            Event::Touch(TouchEvent::PinchStart { distance }) => self.on_start(distance, ctx),
            Event::Touch(TouchEvent::Pinch { distance }) => self.on_pinch(distance, ctx),
            Event::Touch(TouchEvent::PinchEnd) => {
                if self.session.take().is_some() {
                    debug!(owner = %self.owner, "pinch ended");
                }
            }
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
