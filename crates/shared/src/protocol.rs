use serde::{Deserialize, Serialize};

use crate::domain::{EntityId, ScreenPoint};

/// Raw input delivered by the host runtime. Any field may be missing on a
/// given delivery; consumers drop such events instead of faulting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TouchEvent {
    ScreenTouchStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<EntityId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<ScreenPoint>,
    },
    ScreenTouchMove {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<EntityId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<ScreenPoint>,
    },
    ScreenTouchEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<EntityId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<ScreenPoint>,
    },
    PinchStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distance: Option<f64>,
    },
    Pinch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distance: Option<f64>,
    },
    PinchEnd,
}

impl TouchEvent {
    pub fn start(target: EntityId, x: f64, y: f64) -> Self {
        Self::ScreenTouchStart {
            target: Some(target),
            position: Some(ScreenPoint::new(x, y)),
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::ScreenTouchMove {
            target: None,
            position: Some(ScreenPoint::new(x, y)),
        }
    }

    pub fn end(target: Option<EntityId>, x: f64, y: f64) -> Self {
        Self::ScreenTouchEnd {
            target,
            position: Some(ScreenPoint::new(x, y)),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::ScreenTouchStart { .. } => EventKind::TouchStart,
            Self::ScreenTouchMove { .. } => EventKind::TouchMove,
            Self::ScreenTouchEnd { .. } => EventKind::TouchEnd,
            Self::PinchStart { .. } => EventKind::PinchStart,
            Self::Pinch { .. } => EventKind::Pinch,
            Self::PinchEnd => EventKind::PinchEnd,
        }
    }
}

/// Core-to-core and outbound notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all_fields = "camelCase"
)]
pub enum GestureEvent {
    #[serde(rename = "on-drag-start")]
    DragStart { target_eid: EntityId, x: f64, y: f64 },
    #[serde(rename = "on-drag")]
    Drag {
        target_eid: EntityId,
        delta_x: f64,
        delta_y: f64,
        total_x: f64,
        total_y: f64,
        x: f64,
        y: f64,
    },
    /// Release. Velocity fields are absent when the producer had no samples
    /// to estimate from; the rotation controller then derives its own.
    #[serde(rename = "on-drag-end")]
    DragEnd {
        target_eid: EntityId,
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vx: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vy: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed: Option<f64>,
    },
    #[serde(rename = "drag-state")]
    DragState { active: bool },
    #[serde(rename = "trigger")]
    Trigger { name: String, source_eid: EntityId },
}

impl GestureEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DragStart { .. } => EventKind::DragStart,
            Self::Drag { .. } => EventKind::Drag,
            Self::DragEnd { .. } => EventKind::DragEnd,
            Self::DragState { .. } => EventKind::DragState,
            Self::Trigger { .. } => EventKind::Trigger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TouchStart,
    TouchMove,
    TouchEnd,
    PinchStart,
    Pinch,
    PinchEnd,
    DragStart,
    Drag,
    DragEnd,
    DragState,
    Trigger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Event {
    Touch(TouchEvent),
    Gesture(GestureEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Touch(event) => event.kind(),
            Self::Gesture(event) => event.kind(),
        }
    }
}

impl From<TouchEvent> for Event {
    fn from(value: TouchEvent) -> Self {
        Self::Touch(value)
    }
}

impl From<GestureEvent> for Event {
    fn from(value: GestureEvent) -> Self {
        Self::Gesture(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Address {
    Global,
    Entity(EntityId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub address: Address,
    pub event: Event,
}

impl Envelope {
    pub fn new(address: Address, event: impl Into<Event>) -> Self {
        Self {
            address,
            event: event.into(),
        }
    }

    pub fn global(event: impl Into<Event>) -> Self {
        Self::new(Address::Global, event)
    }

    pub fn to_entity(entity: EntityId, event: impl Into<Event>) -> Self {
        Self::new(Address::Entity(entity), event)
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
