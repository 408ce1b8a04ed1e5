use shared::{
    domain::EntityId,
    protocol::{Address, GestureEvent},
};
use tracing::debug;

use crate::runtime::Context;

/// Publishes `drag-state` for one target whenever a drag becomes active or
/// inactive, including a vetoed start.
#[derive(Debug, Clone, Copy)]
pub struct DragStateBroadcaster {
    target: EntityId,
}

impl DragStateBroadcaster {
    pub fn new(target: EntityId) -> Self {
        Self { target }
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn publish(&self, ctx: &Context<'_>, active: bool) {
        debug!(target_eid = %self.target, active, "drag state");
        ctx.dispatch(Address::Entity(self.target), GestureEvent::DragState { active });
    }
}

/// Receiving side of the drag-state channel. Holders treat the last observed
/// value as the only truth about whether a rotation drag is in progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragStateListener {
    active: bool,
}

impl DragStateListener {
    pub fn observe(&mut self, event: &GestureEvent) -> bool {
        if let GestureEvent::DragState { active } = event {
            self.active = *active;
            return true;
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
