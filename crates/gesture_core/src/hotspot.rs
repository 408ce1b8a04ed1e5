use std::any::Any;

use shared::{
    domain::EntityId,
    error::GestureError,
    protocol::{Address, Envelope, Event, EventKind, GestureEvent, TouchEvent},
};
use tracing::{debug, info};

use crate::{
    arbiter::{find_descendant_with_label, is_same_or_descendant},
    broadcaster::DragStateListener,
    bus::{EventBus, Interest, Subscription},
    config::{DEFAULT_BLOCK_LABEL, DEFAULT_TRIGGER_EVENT},
    runtime::{Component, Context},
};

/// Tap handler for the split design. Arms when a touch starts on its button
/// (the first descendant carrying the button label) and fires the trigger on
/// release unless the drag-state channel reports an active rotation.
pub struct HotspotTapHandler {
    owner: EntityId,
    button_label: String,
    trigger_event_name: String,
    armed: bool,
    drag_state: DragStateListener,
    subscription: Subscription,
}

impl HotspotTapHandler {
    pub fn new(
        bus: &EventBus,
        owner: EntityId,
        button_label: impl Into<String>,
        trigger_event_name: impl Into<String>,
    ) -> Self {
        Self {
            owner,
            button_label: button_label.into(),
            trigger_event_name: trigger_event_name.into(),
            armed: false,
            drag_state: DragStateListener::default(),
            subscription: bus.subscribe([
                Interest::global(EventKind::TouchStart),
                Interest::global(EventKind::TouchEnd),
                Interest::entity(owner, EventKind::DragState),
            ]),
        }
    }

    pub fn with_defaults(bus: &EventBus, owner: EntityId) -> Self {
        Self::new(bus, owner, DEFAULT_BLOCK_LABEL, DEFAULT_TRIGGER_EVENT)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn drag_active(&self) -> bool {
        self.drag_state.is_active()
    }

    fn button(&self, ctx: &Context<'_>) -> Option<EntityId> {
        find_descendant_with_label(ctx.scene(), self.owner, &self.button_label)
    }

    fn on_touch_start(&mut self, target: Option<EntityId>, ctx: &mut Context<'_>) {
        self.armed = false;
        let Some(hit) = target else {
            ctx.report("hotspot", GestureError::malformed("screen_touch_start", "target"));
            return;
        };
        let Some(button) = self.button(ctx) else {
            return;
        };
        if hit == self.owner || is_same_or_descendant(ctx.scene(), hit, button) {
            debug!(%hit, %button, "touch started on hotspot");
            self.armed = true;
        }
    }

    fn on_touch_end(&mut self, ctx: &mut Context<'_>) {
        if !std::mem::take(&mut self.armed) {
            return;
        }
        let Some(button) = self.button(ctx) else {
            return;
        };
        if self.drag_state.is_active() {
            debug!(%button, "hotspot tap cancelled by active rotation");
            return;
        }
        info!(%button, event = %self.trigger_event_name, "hotspot activated");
        ctx.dispatch(
            Address::Entity(button),
            GestureEvent::Trigger {
                name: self.trigger_event_name.clone(),
                source_eid: self.owner,
            },
        );
    }
}

impl Component for HotspotTapHandler {
    fn name(&self) -> &'static str {
        "hotspot"
    }

    fn subscription(&self) -> Option<&Subscription> {
        Some(&self.subscription)
    }

    fn handle(&mut self, envelope: &Envelope, ctx: &mut Context<'_>) {
        match &envelope.event {
            Event::Gesture(event) => {
                self.drag_state.observe(event);
            }
            Event::Touch(TouchEvent::ScreenTouchStart { target, .. }) => {
                self.on_touch_start(*target, ctx)
            }
            Event::Touch(TouchEvent::ScreenTouchEnd { .. }) => self.on_touch_end(ctx),
            Event::Touch(_) => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "tests/hotspot_tests.rs"]
mod tests;
