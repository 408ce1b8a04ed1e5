//! Drag-to-orientation mapping and inertial flick spin.
//!
//! While dragging, the target's orientation is always recomputed from the pose
//! captured at drag start and the net displacement, so the final pose depends
//! only on where the pointer ended up. Spin, having no reference pose,
//! integrates onto the live orientation every tick and decays exponentially.

use std::{any::Any, collections::VecDeque};

use glam::{DQuat, DVec3};
use scene::{Scene, TransformStore};
use shared::{
    domain::EntityId,
    error::GestureError,
    protocol::{Envelope, Event, EventKind, GestureEvent},
};
use tracing::{debug, info};

use crate::{
    arbiter::find_descendant_with_label,
    bus::{EventBus, Interest, Subscription},
    config::RotationConfig,
    runtime::{Component, Context},
    sampler::{PointerSample, VelocityEstimate},
};

const HISTORY_CAPACITY: usize = 10;
/// Spin below this angular velocity (rad/s) snaps to rest.
pub const SPIN_EPSILON: f64 = 0.01;
const MIN_DISPLACEMENT_PX: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    Idle,
    Dragging,
    Spinning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinState {
    pub angular_velocity: f64,
    pub axis: DVec3,
}

impl SpinState {
    pub const REST: Self = Self {
        angular_velocity: 0.0,
        axis: DVec3::Z,
    };

    pub fn is_spinning(&self) -> bool {
        self.angular_velocity > 0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    start: PointerSample,
    last: PointerSample,
    base_orientation: DQuat,
    target: EntityId,
}

pub struct RotationController {
    owner: EntityId,
    config: RotationConfig,
    subscription: Subscription,
    session: Option<DragSession>,
    spin: SpinState,
    history: VecDeque<PointerSample>,
}

impl RotationController {
    pub fn new(bus: &EventBus, owner: EntityId, config: RotationConfig) -> Self {
        let subscription = bus.subscribe([
            Interest::global(EventKind::DragStart),
            Interest::global(EventKind::Drag),
            Interest::global(EventKind::DragEnd),
        ]);
        Self {
            owner,
            config,
            subscription,
            session: None,
            spin: SpinState::REST,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn state(&self) -> RotationState {
        if self.session.is_some() {
            RotationState::Dragging
        } else if self.spin.is_spinning() {
            RotationState::Spinning
        } else {
            RotationState::Idle
        }
    }

    pub fn angular_velocity(&self) -> f64 {
        self.spin.angular_velocity
    }

    pub fn spin_axis(&self) -> DVec3 {
        self.spin.axis
    }

    pub fn spin(&self) -> SpinState {
        self.spin
    }

    /// The entity actually rotated: the first descendant carrying the model
    /// label, or the owner itself.
    pub fn resolve_target(&self, scene: &dyn Scene) -> EntityId {
        find_descendant_with_label(scene, self.owner, &self.config.model_label)
            .unwrap_or(self.owner)
    }

    fn accepts(&self, target_eid: EntityId, resolved: EntityId) -> bool {
        target_eid == self.owner || target_eid == resolved
    }

    fn camera_axes(&self, scene: &dyn Scene) -> (DVec3, DVec3) {
        let camera = self
            .config
            .camera_eid
            .and_then(|camera| scene.orientation(camera))
            .unwrap_or(DQuat::IDENTITY);
        (camera * DVec3::X, camera * DVec3::Y)
    }

    /// World-space axis for a screen-space direction: `dy * right + dx * up`.
    fn screen_axis(&self, scene: &dyn Scene, dx: f64, dy: f64) -> Option<DVec3> {
        let (right, up) = self.camera_axes(scene);
        (up * dx + right * dy).try_normalize()
    }

    fn on_drag_start(&mut self, target_eid: EntityId, x: f64, y: f64, ctx: &mut Context<'_>) {
        let resolved = self.resolve_target(ctx.scene());
        if !self.accepts(target_eid, resolved) {
            return;
        }
        let Some(base_orientation) = ctx.scene().orientation(resolved) else {
            ctx.report("rotation", GestureError::UnknownEntity(resolved));
            return;
        };
        if self.spin.is_spinning() {
            debug!(owner = %self.owner, "drag preempts spin");
        }
        self.spin = SpinState::REST;

        let sample = PointerSample::new(ctx.now_ms(), x, y);
        self.history.clear();
        self.history.push_back(sample);
        self.session = Some(DragSession {
            start: sample,
            last: sample,
            base_orientation,
            target: resolved,
        });
        info!(owner = %self.owner, target = %resolved, x, y, "rotation drag started");
    }

    fn on_drag(&mut self, target_eid: EntityId, x: f64, y: f64, ctx: &mut Context<'_>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if target_eid != self.owner && target_eid != session.target {
            return;
        }
        if !x.is_finite() || !y.is_finite() {
            ctx.report("rotation", GestureError::malformed("on-drag", "position"));
            return;
        }
        let sample = PointerSample::new(ctx.now_ms(), x, y);
        session.last = sample;
        let session = *session;

        self.history.push_back(sample);
        if self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }

        let dx = x - session.start.x;
        let dy = y - session.start.y;
        let pixels = dx.hypot(dy);
        if pixels <= MIN_DISPLACEMENT_PX {
            return;
        }
        let Some(axis) = self.screen_axis(ctx.scene(), dx, dy) else {
            return;
        };
        let angle = pixels * self.config.radians_per_pixel * self.config.drag_gain;
        let orientation =
            (DQuat::from_axis_angle(axis, angle) * session.base_orientation).normalize();
        if let Err(error) = ctx.scene_mut().set_orientation(session.target, orientation) {
            ctx.report("rotation", error);
        }
    }

    fn on_drag_end(
        &mut self,
        target_eid: EntityId,
        release: (Option<f64>, Option<f64>, Option<f64>),
        ctx: &mut Context<'_>,
    ) {
        let Some(session) = self.session else {
            return;
        };
        if target_eid != self.owner && target_eid != session.target {
            return;
        }
        self.session = None;

        let velocity = match release {
            (Some(vx), Some(vy), Some(speed))
                if vx.is_finite() && vy.is_finite() && speed.is_finite() =>
            {
                VelocityEstimate { vx, vy, speed }
            }
            _ => self.fallback_velocity(&session),
        };
        self.history.clear();
        self.seed_spin(velocity, ctx.scene());
    }

    /// Release velocity from buffered drag samples, for producers that did not
    /// supply one.
    fn fallback_velocity(&self, session: &DragSession) -> VelocityEstimate {
        let (from, to) = match self.history.len() {
            len if len >= 2 => {
                let lookback = self.config.history_lookback_frames.min(len - 1);
                (self.history[len - 1 - lookback], self.history[len - 1])
            }
            _ => (session.start, session.last),
        };
        let dt = (to.timestamp_ms - from.timestamp_ms) / 1000.0;
        if !dt.is_finite() || dt <= 0.0 {
            return VelocityEstimate::ZERO;
        }
        let vx = (to.x - from.x) / dt;
        let vy = (to.y - from.y) / dt;
        VelocityEstimate {
            vx,
            vy,
            speed: vx.hypot(vy),
        }
    }

    fn seed_spin(&mut self, velocity: VelocityEstimate, scene: &dyn Scene) {
        if velocity.speed < self.config.flick_threshold_px_per_sec {
            self.spin = SpinState::REST;
            debug!(owner = %self.owner, speed = velocity.speed, "release below flick threshold");
            return;
        }
        let Some(axis) = self.screen_axis(scene, velocity.vx, velocity.vy) else {
            self.spin = SpinState::REST;
            return;
        };
        let angular_velocity = (velocity.speed * self.config.flick_impulse_gain)
            .max(self.config.min_flick_angular_vel);
        self.spin = SpinState {
            angular_velocity,
            axis,
        };
        info!(owner = %self.owner, speed = velocity.speed, angular_velocity, "flick spin seeded");
    }

    fn advance_spin(&mut self, dt_secs: f64, ctx: &mut Context<'_>) {
        if self.session.is_some() || !self.spin.is_spinning() {
            return;
        }
        if !dt_secs.is_finite() || dt_secs <= 0.0 {
            return;
        }
        let target = self.resolve_target(ctx.scene());
        let Some(current) = ctx.scene().orientation(target) else {
            ctx.report("rotation", GestureError::UnknownEntity(target));
            self.spin = SpinState::REST;
            return;
        };
        let step = DQuat::from_axis_angle(self.spin.axis, self.spin.angular_velocity * dt_secs);
        if let Err(error) = ctx.scene_mut().set_orientation(target, (step * current).normalize()) {
            ctx.report("rotation", error);
        }

        self.spin.angular_velocity *= 0.1_f64.powf(dt_secs * self.config.decay_rate);
        if self.spin.angular_velocity < SPIN_EPSILON {
            self.spin.angular_velocity = 0.0;
            debug!(owner = %self.owner, "spin settled");
        }
    }
}

impl Component for RotationController {
    fn name(&self) -> &'static str {
        "rotation"
    }

    fn subscription(&self) -> Option<&Subscription> {
        Some(&self.subscription)
    }

    fn handle(&mut self, envelope: &Envelope, ctx: &mut Context<'_>) {
        let Event::Gesture(event) = &envelope.event else {
            return;
        };
        match *event {
            GestureEvent::DragStart { target_eid, x, y } => {
                self.on_drag_start(target_eid, x, y, ctx)
            }
            GestureEvent::Drag {
                target_eid, x, y, ..
            } => self.on_drag(target_eid, x, y, ctx),
            GestureEvent::DragEnd {
                target_eid,
                vx,
                vy,
                speed,
                ..
            } => self.on_drag_end(target_eid, (vx, vy, speed), ctx),
            _ => {}
        }
    }

    fn tick(&mut self, dt_secs: f64, ctx: &mut Context<'_>) {
        self.advance_spin(dt_secs, ctx);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "tests/rotation_tests.rs"]
mod tests;
