use std::{
    any::Any,
    collections::{HashSet, VecDeque},
};

use scene::Scene;
use shared::{
    domain::{ComponentId, EntityId},
    error::{ErrorReport, GestureError},
    protocol::{Address, Envelope, GestureEvent, TouchEvent},
};
use tracing::{debug, warn};

use crate::{
    bus::{EventBus, Subscription},
    clock::Clock,
};

const MAX_PUMP_ROUNDS: usize = 64;
const MAX_DIAGNOSTICS: usize = 256;

/// A gesture participant hosted by [`Runtime`]. Components register their bus
/// interests when constructed and release them when dropped.
pub trait Component: Any {
    fn name(&self) -> &'static str;

    fn subscription(&self) -> Option<&Subscription>;

    fn handle(&mut self, envelope: &Envelope, ctx: &mut Context<'_>);

    /// Runs for every component before a touch start is delivered to anyone,
    /// so vetoes are in place regardless of registration order.
    fn gate_touch_start(&mut self, _event: &TouchEvent, _ctx: &mut Context<'_>) {}

    fn tick(&mut self, _dt_secs: f64, _ctx: &mut Context<'_>) {}

    fn as_any(&self) -> &dyn Any;
}

/// Per-callback view of the runtime handed to components.
pub struct Context<'a> {
    scene: &'a mut dyn Scene,
    bus: &'a EventBus,
    now_ms: f64,
    vetoed: &'a mut HashSet<EntityId>,
    diagnostics: &'a mut VecDeque<ErrorReport>,
}

impl<'a> Context<'a> {
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn scene(&self) -> &(dyn Scene + 'a) {
        &*self.scene
    }

    pub fn scene_mut(&mut self) -> &mut (dyn Scene + 'a) {
        &mut *self.scene
    }

    pub fn dispatch(&self, address: Address, event: GestureEvent) {
        self.bus.publish(Envelope::new(address, event));
    }

    /// Blocks drag starts for `target` until the next touch start.
    pub fn veto(&mut self, target: EntityId) {
        self.vetoed.insert(target);
    }

    pub fn is_vetoed(&self, target: EntityId) -> bool {
        self.vetoed.contains(&target)
    }

    pub fn report(&mut self, source: &'static str, error: GestureError) {
        debug!(component = source, %error, "input dropped");
        if self.diagnostics.len() == MAX_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(ErrorReport::new(source, &error));
    }
}

struct Slot {
    id: ComponentId,
    component: Box<dyn Component>,
}

/// Frame-driven, single-threaded host for gesture components. Touch input and
/// frame ticks are delivered synchronously; every event a component publishes
/// is drained before the call returns.
pub struct Runtime<S> {
    scene: S,
    bus: EventBus,
    clock: Box<dyn Clock>,
    slots: Vec<Slot>,
    next_component: i64,
    vetoed: HashSet<EntityId>,
    diagnostics: VecDeque<ErrorReport>,
}

impl<S: Scene> Runtime<S> {
    pub fn new(scene: S, clock: impl Clock + 'static) -> Self {
        Self {
            scene,
            bus: EventBus::new(),
            clock: Box::new(clock),
            slots: Vec::new(),
            next_component: 0,
            vetoed: HashSet::new(),
            diagnostics: VecDeque::new(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn add(&mut self, component: impl Component) -> ComponentId {
        self.next_component += 1;
        let id = ComponentId(self.next_component);
        debug!(component = component.name(), id = id.0, "component attached");
        self.slots.push(Slot {
            id,
            component: Box::new(component),
        });
        id
    }

    /// Detaches and drops a component, releasing its subscriptions.
    pub fn remove(&mut self, id: ComponentId) -> bool {
        let Some(index) = self.slots.iter().position(|slot| slot.id == id) else {
            return false;
        };
        let slot = self.slots.remove(index);
        debug!(component = slot.component.name(), id = id.0, "component detached");
        true
    }

    pub fn component<C: Component>(&self, id: ComponentId) -> Option<&C> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .and_then(|slot| slot.component.as_any().downcast_ref::<C>())
    }

    pub fn handle_touch(&mut self, event: TouchEvent) {
        let now_ms = self.clock.now_ms();
        if matches!(event, TouchEvent::ScreenTouchStart { .. }) {
            self.vetoed.clear();
            for slot in self.slots.iter_mut() {
                let mut ctx = Context {
                    scene: &mut self.scene,
                    bus: &self.bus,
                    now_ms,
                    vetoed: &mut self.vetoed,
                    diagnostics: &mut self.diagnostics,
                };
                slot.component.gate_touch_start(&event, &mut ctx);
            }
        }
        self.bus.publish(Envelope::global(event));
        self.pump(now_ms);
    }

    /// Injects a core event as if another component had published it.
    pub fn dispatch(&mut self, address: Address, event: GestureEvent) {
        let now_ms = self.clock.now_ms();
        self.bus.publish(Envelope::new(address, event));
        self.pump(now_ms);
    }

    pub fn tick(&mut self, dt_secs: f64) {
        let now_ms = self.clock.now_ms();
        for slot in self.slots.iter_mut() {
            let mut ctx = Context {
                scene: &mut self.scene,
                bus: &self.bus,
                now_ms,
                vetoed: &mut self.vetoed,
                diagnostics: &mut self.diagnostics,
            };
            slot.component.tick(dt_secs, &mut ctx);
        }
        self.pump(now_ms);
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &ErrorReport> {
        self.diagnostics.iter()
    }

    pub fn take_diagnostics(&mut self) -> Vec<ErrorReport> {
        self.diagnostics.drain(..).collect()
    }

    fn pump(&mut self, now_ms: f64) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let mut delivered = 0usize;
            for slot in self.slots.iter_mut() {
                // Envelopes published while this round runs wait for the next.
                let queued = slot.component.subscription().map_or(0, Subscription::len);
                for _ in 0..queued {
                    let Some(envelope) = slot
                        .component
                        .subscription()
                        .and_then(Subscription::try_recv)
                    else {
                        break;
                    };
                    let mut ctx = Context {
                        scene: &mut self.scene,
                        bus: &self.bus,
                        now_ms,
                        vetoed: &mut self.vetoed,
                        diagnostics: &mut self.diagnostics,
                    };
                    slot.component.handle(&envelope, &mut ctx);
                    delivered += 1;
                }
            }
            if delivered == 0 {
                return;
            }
        }
        warn!(
            rounds = MAX_PUMP_ROUNDS,
            pending = self.bus.pending(),
            "event pump did not settle; remaining envelopes stay queued"
        );
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
