//! Unified input controller: one component that arbitrates each touch,
//! samples the drag, and dispatches either the rotation drag lifecycle or the
//! hotspot trigger. No second component has to observe the touch first.

use std::any::Any;

use shared::{
    domain::{EntityId, ScreenPoint},
    error::GestureError,
    protocol::{Address, Envelope, Event, EventKind, GestureEvent, TouchEvent},
};
use tracing::{debug, info};

use crate::{
    arbiter::{classify, is_same_or_descendant, Classification},
    broadcaster::DragStateBroadcaster,
    bus::{EventBus, Interest, Subscription},
    config::{ArbiterConfig, SamplerConfig},
    runtime::{Component, Context},
    sampler::{DragLifecycle, TouchSampler, VelocityEstimate},
};

const SOURCE: &str = "unified-input";

pub struct UnifiedInputController {
    owner: EntityId,
    root: EntityId,
    arbiter: ArbiterConfig,
    sampler: TouchSampler,
    broadcaster: DragStateBroadcaster,
    pending_hotspot: Option<EntityId>,
    subscription: Subscription,
}

impl UnifiedInputController {
    /// `root` is the subtree this controller arbitrates for; drag events and
    /// drag-state are addressed to it.
    pub fn new(
        bus: &EventBus,
        owner: EntityId,
        root: Option<EntityId>,
        arbiter: ArbiterConfig,
        sampler: SamplerConfig,
    ) -> Self {
        let root = root.unwrap_or(owner);
        let subscription = bus.subscribe([
            Interest::global(EventKind::TouchStart),
            Interest::global(EventKind::TouchMove),
            Interest::global(EventKind::TouchEnd),
        ]);
        Self {
            owner,
            root,
            arbiter,
            sampler: TouchSampler::new(sampler),
            broadcaster: DragStateBroadcaster::new(root),
            pending_hotspot: None,
            subscription,
        }
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn is_dragging(&self) -> bool {
        self.sampler.is_active()
    }

    pub fn pending_hotspot(&self) -> Option<EntityId> {
        self.pending_hotspot
    }

    fn on_touch_start(
        &mut self,
        target: Option<EntityId>,
        position: Option<ScreenPoint>,
        ctx: &mut Context<'_>,
    ) {
        // Any new press closes a drag whose release never arrived, before the
        // press itself is validated.
        if let Some(DragLifecycle::End { x, y, velocity }) = self.sampler.abandon() {
            debug!(root = %self.root, x, y, "touch start while dragging; closing stale drag");
            self.finish_drag(x, y, velocity, ctx);
        }
        self.pending_hotspot = None;

        let Some(hit) = target else {
            ctx.report(SOURCE, GestureError::malformed("screen_touch_start", "target"));
            return;
        };
        let Some(position) = position.filter(ScreenPoint::is_finite) else {
            ctx.report(SOURCE, GestureError::malformed("screen_touch_start", "position"));
            return;
        };

        let classification = match classify(ctx.scene(), hit, self.root, &self.arbiter) {
            Ok(classification) => classification,
            Err(GestureError::OutsideRoot { .. }) => {
                debug!(%hit, root = %self.root, "touch outside subtree ignored");
                return;
            }
            Err(error) => {
                ctx.report(SOURCE, error);
                return;
            }
        };
        debug!(%hit, root = %self.root, ?classification, "touch arbitrated");

        match classification {
            Classification::Hotspot(hotspot) => {
                self.pending_hotspot = Some(hotspot);
                self.broadcaster.publish(ctx, false);
            }
            Classification::Rotatable => {
                let now_ms = ctx.now_ms();
                let DragLifecycle::Start { x, y } =
                    self.sampler.pointer_down(position.x, position.y, now_ms)
                else {
                    return;
                };
                self.broadcaster.publish(ctx, true);
                ctx.dispatch(
                    Address::Global,
                    GestureEvent::DragStart {
                        target_eid: self.root,
                        x,
                        y,
                    },
                );
            }
            Classification::Unmatched => {}
        }
    }

    fn on_touch_move(&mut self, position: Option<ScreenPoint>, ctx: &mut Context<'_>) {
        if !self.sampler.is_active() {
            return;
        }
        let Some(position) = position.filter(ScreenPoint::is_finite) else {
            ctx.report(SOURCE, GestureError::malformed("screen_touch_move", "position"));
            return;
        };
        if let Some(DragLifecycle::Move {
            delta_x,
            delta_y,
            total_x,
            total_y,
            x,
            y,
        }) = self
            .sampler
            .pointer_move(position.x, position.y, ctx.now_ms())
        {
            ctx.dispatch(
                Address::Global,
                GestureEvent::Drag {
                    target_eid: self.root,
                    delta_x,
                    delta_y,
                    total_x,
                    total_y,
                    x,
                    y,
                },
            );
        }
    }

    fn on_touch_end(
        &mut self,
        target: Option<EntityId>,
        position: Option<ScreenPoint>,
        ctx: &mut Context<'_>,
    ) {
        if let Some(hotspot) = self.pending_hotspot.take() {
            if !self.sampler.is_active() {
                self.release_on_hotspot(hotspot, target, ctx);
            }
        }

        if !self.sampler.is_active() {
            return;
        }
        // A release without a usable position still ends the drag where the
        // pointer was last seen.
        let Some((x, y)) = position
            .filter(ScreenPoint::is_finite)
            .map(|point| (point.x, point.y))
            .or_else(|| self.sampler.last_position())
        else {
            return;
        };
        if let Some(DragLifecycle::End { x, y, velocity }) =
            self.sampler.pointer_up(x, y, ctx.now_ms())
        {
            info!(root = %self.root, speed = velocity.speed, "drag released");
            self.finish_drag(x, y, velocity, ctx);
        }
    }

    fn finish_drag(&self, x: f64, y: f64, velocity: VelocityEstimate, ctx: &Context<'_>) {
        ctx.dispatch(
            Address::Global,
            GestureEvent::DragEnd {
                target_eid: self.root,
                x,
                y,
                vx: Some(velocity.vx),
                vy: Some(velocity.vy),
                speed: Some(velocity.speed),
            },
        );
        self.broadcaster.publish(ctx, false);
    }

    /// Tap-to-activate fires on release, and only when the release still
    /// lands inside the hotspot that was pressed.
    fn release_on_hotspot(
        &self,
        hotspot: EntityId,
        target: Option<EntityId>,
        ctx: &mut Context<'_>,
    ) {
        let Some(hit) = target else {
            debug!(%hotspot, "release without target; hotspot tap dropped");
            return;
        };
        if !is_same_or_descendant(ctx.scene(), hit, hotspot) {
            debug!(%hotspot, %hit, "release left the hotspot");
            return;
        }
        info!(%hotspot, event = %self.arbiter.trigger_event_name, "hotspot activated");
        ctx.dispatch(
            Address::Entity(hotspot),
            GestureEvent::Trigger {
                name: self.arbiter.trigger_event_name.clone(),
                source_eid: self.owner,
            },
        );
    }
}

impl Component for UnifiedInputController {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn subscription(&self) -> Option<&Subscription> {
        Some(&self.subscription)
    }

    fn handle(&mut self, envelope: &Envelope, ctx: &mut Context<'_>) {
        let Event::Touch(event) = &envelope.event else {
            return;
        };
        match *event {
            TouchEvent::ScreenTouchStart { target, position } => {
                self.on_touch_start(target, position, ctx)
            }
            TouchEvent::ScreenTouchMove { position, .. } => self.on_touch_move(position, ctx),
            TouchEvent::ScreenTouchEnd { target, position } => {
                self.on_touch_end(target, position, ctx)
            }
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
