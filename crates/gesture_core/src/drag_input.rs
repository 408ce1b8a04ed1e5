//! Split input design: a sampler that turns every global touch into the drag
//! lifecycle for its target, and a blocker that vetoes it during the
//! touch-start gate phase. Both use the shared arbitration routine, so their
//! combined decisions match the unified controller.

use std::any::Any;

use shared::{
    domain::{EntityId, ScreenPoint},
    error::GestureError,
    protocol::{Address, Envelope, Event, EventKind, GestureEvent, TouchEvent},
};
use tracing::{debug, info};

use crate::{
    arbiter::{classify, Classification},
    broadcaster::DragStateBroadcaster,
    bus::{EventBus, Interest, Subscription},
    config::{ArbiterConfig, SamplerConfig},
    runtime::{Component, Context},
    sampler::{DragLifecycle, TouchSampler},
};

pub struct DragInputManager {
    target: EntityId,
    sampler: TouchSampler,
    broadcaster: DragStateBroadcaster,
    subscription: Subscription,
}

impl DragInputManager {
    pub fn new(
        bus: &EventBus,
        owner: EntityId,
        target: Option<EntityId>,
        config: SamplerConfig,
    ) -> Self {
        let target = target.unwrap_or(owner);
        Self {
            target,
            sampler: TouchSampler::new(config),
            broadcaster: DragStateBroadcaster::new(target),
            subscription: bus.subscribe([
                Interest::global(EventKind::TouchStart),
                Interest::global(EventKind::TouchMove),
                Interest::global(EventKind::TouchEnd),
            ]),
        }
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn is_dragging(&self) -> bool {
        self.sampler.is_active()
    }

    fn dispatch(&self, ctx: &Context<'_>, lifecycle: DragLifecycle) {
        let target_eid = self.target;
        let event = match lifecycle {
            DragLifecycle::Start { x, y } => GestureEvent::DragStart { target_eid, x, y },
            DragLifecycle::Move {
                delta_x,
                delta_y,
                total_x,
                total_y,
                x,
                y,
            } => GestureEvent::Drag {
                target_eid,
                delta_x,
                delta_y,
                total_x,
                total_y,
                x,
                y,
            },
            DragLifecycle::End { x, y, velocity } => GestureEvent::DragEnd {
                target_eid,
                x,
                y,
                vx: Some(velocity.vx),
                vy: Some(velocity.vy),
                speed: Some(velocity.speed),
            },
        };
        ctx.dispatch(Address::Global, event);
    }

    fn on_touch_start(&mut self, position: Option<ScreenPoint>, ctx: &mut Context<'_>) {
        // A press while dragging means the previous release was lost; close
        // that drag before deciding about this one.
        if let Some(lifecycle) = self.sampler.abandon() {
            debug!(target_eid = %self.target, "touch start while dragging; closing stale drag");
            self.dispatch(ctx, lifecycle);
            self.broadcaster.publish(ctx, false);
        }
        if ctx.is_vetoed(self.target) {
            debug!(target_eid = %self.target, "drag start vetoed");
            return;
        }
        let Some(position) = position.filter(ScreenPoint::is_finite) else {
            ctx.report("drag-input", GestureError::malformed("screen_touch_start", "position"));
            return;
        };
        let lifecycle = self
            .sampler
            .pointer_down(position.x, position.y, ctx.now_ms());
        self.broadcaster.publish(ctx, true);
        self.dispatch(ctx, lifecycle);
    }

    fn on_touch_move(&mut self, position: Option<ScreenPoint>, ctx: &mut Context<'_>) {
        if !self.sampler.is_active() {
            return;
        }
        let Some(position) = position.filter(ScreenPoint::is_finite) else {
            ctx.report("drag-input", GestureError::malformed("screen_touch_move", "position"));
            return;
        };
        if let Some(lifecycle) = self
            .sampler
            .pointer_move(position.x, position.y, ctx.now_ms())
        {
            self.dispatch(ctx, lifecycle);
        }
    }

    fn on_touch_end(&mut self, position: Option<ScreenPoint>, ctx: &mut Context<'_>) {
        let Some((x, y)) = position
            .filter(ScreenPoint::is_finite)
            .map(|point| (point.x, point.y))
            .or_else(|| self.sampler.last_position())
        else {
            return;
        };
        if let Some(lifecycle) = self.sampler.pointer_up(x, y, ctx.now_ms()) {
            info!(target_eid = %self.target, "drag released");
            self.dispatch(ctx, lifecycle);
            self.broadcaster.publish(ctx, false);
        }
    }
}

impl Component for DragInputManager {
    fn name(&self) -> &'static str {
        "drag-input"
    }

    fn subscription(&self) -> Option<&Subscription> {
        Some(&self.subscription)
    }

    fn handle(&mut self, envelope: &Envelope, ctx: &mut Context<'_>) {
        let Event::Touch(event) = &envelope.event else {
            return;
        };
        match *event {
            TouchEvent::ScreenTouchStart { position, .. } => self.on_touch_start(position, ctx),
            TouchEvent::ScreenTouchMove { position, .. } => self.on_touch_move(position, ctx),
            TouchEvent::ScreenTouchEnd { position, .. } => self.on_touch_end(position, ctx),
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Veto-only arbitration for the split design. It never starts a rotation;
/// it only stops the drag sampler for `root` from starting one.
pub struct DragBlocker {
    root: EntityId,
    config: ArbiterConfig,
    broadcaster: DragStateBroadcaster,
    last: Option<Classification>,
}

impl DragBlocker {
    pub fn new(owner: EntityId, root: Option<EntityId>, config: ArbiterConfig) -> Self {
        let root = root.unwrap_or(owner);
        Self {
            root,
            config,
            broadcaster: DragStateBroadcaster::new(root),
            last: None,
        }
    }

    /// Classification of the most recent touch start, if it could be made.
    pub fn last_classification(&self) -> Option<Classification> {
        self.last
    }
}

impl Component for DragBlocker {
    fn name(&self) -> &'static str {
        "drag-blocker"
    }

    fn subscription(&self) -> Option<&Subscription> {
        None
    }

    fn handle(&mut self, _envelope: &Envelope, _ctx: &mut Context<'_>) {}

    fn gate_touch_start(&mut self, event: &TouchEvent, ctx: &mut Context<'_>) {
        let TouchEvent::ScreenTouchStart { target, .. } = *event else {
            return;
        };
        self.last = None;
        let Some(hit) = target else {
            ctx.report("drag-blocker", GestureError::malformed("screen_touch_start", "target"));
            ctx.veto(self.root);
            return;
        };
        match classify(ctx.scene(), hit, self.root, &self.config) {
            Ok(Classification::Rotatable) => {
                self.last = Some(Classification::Rotatable);
            }
            Ok(classification) => {
                self.last = Some(classification);
                debug!(%hit, root = %self.root, ?classification, "drag blocked");
                ctx.veto(self.root);
                if let Classification::Hotspot(_) = classification {
                    self.broadcaster.publish(ctx, false);
                }
            }
            Err(GestureError::OutsideRoot { .. }) => {
                debug!(%hit, root = %self.root, "touch outside subtree blocked");
                ctx.veto(self.root);
            }
            Err(error) => {
                ctx.report("drag-blocker", error);
                ctx.veto(self.root);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "tests/drag_input_tests.rs"]
mod tests;
