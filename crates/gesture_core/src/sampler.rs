//! Pointer down/move/up to drag lifecycle conversion with release-velocity
//! estimation over a trailing time window.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::SamplerConfig;

/// Extra history kept beyond the velocity window so a sample at or before the
/// window start survives until release.
const PRUNE_SLACK_MS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub timestamp_ms: f64,
    pub x: f64,
    pub y: f64,
}

impl PointerSample {
    pub fn new(timestamp_ms: f64, x: f64, y: f64) -> Self {
        Self { timestamp_ms, x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityEstimate {
    pub vx: f64,
    pub vy: f64,
    pub speed: f64,
}

impl VelocityEstimate {
    pub const ZERO: Self = Self {
        vx: 0.0,
        vy: 0.0,
        speed: 0.0,
    };

    /// Estimates release velocity from `history` (oldest first, ending with the
    /// release sample). The reference sample is the latest one at or before
    /// `release - window_ms`, or the oldest sample when none is that old.
    pub fn from_history(
        history: &VecDeque<PointerSample>,
        window_ms: f64,
        max_speed: f64,
    ) -> Self {
        let (Some(oldest), Some(release)) = (history.front(), history.back()) else {
            return Self::ZERO;
        };
        let window_start = release.timestamp_ms - window_ms;
        let reference = history
            .iter()
            .rev()
            .find(|sample| sample.timestamp_ms <= window_start)
            .unwrap_or(oldest);

        let dt = (release.timestamp_ms - reference.timestamp_ms) / 1000.0;
        if !dt.is_finite() || dt <= 0.0 {
            return Self::ZERO;
        }
        let vx = (release.x - reference.x) / dt;
        let vy = (release.y - reference.y) / dt;
        Self::clamped(vx, vy, max_speed)
    }

    /// Uniformly scales `(vx, vy)` so the speed does not exceed `max_speed`.
    pub fn clamped(vx: f64, vy: f64, max_speed: f64) -> Self {
        if !vx.is_finite() || !vy.is_finite() {
            return Self::ZERO;
        }
        let speed = vx.hypot(vy);
        if speed > max_speed && speed > 0.0 {
            let k = max_speed / speed;
            return Self {
                vx: vx * k,
                vy: vy * k,
                speed: max_speed,
            };
        }
        Self { vx, vy, speed }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragLifecycle {
    Start {
        x: f64,
        y: f64,
    },
    Move {
        delta_x: f64,
        delta_y: f64,
        total_x: f64,
        total_y: f64,
        x: f64,
        y: f64,
    },
    End {
        x: f64,
        y: f64,
        velocity: VelocityEstimate,
    },
}

#[derive(Debug, Clone, Copy)]
struct Anchor {
    start: PointerSample,
    last: PointerSample,
    escaped_deadzone: bool,
}

/// One pointer's drag lifecycle. Idle until `pointer_down`; `pointer_up` in
/// the idle state is ignored.
#[derive(Debug, Clone)]
pub struct TouchSampler {
    config: SamplerConfig,
    anchor: Option<Anchor>,
    history: VecDeque<PointerSample>,
}

impl TouchSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            anchor: None,
            history: VecDeque::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn last_position(&self) -> Option<(f64, f64)> {
        self.anchor.map(|anchor| (anchor.last.x, anchor.last.y))
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, now_ms: f64) -> DragLifecycle {
        let sample = PointerSample::new(now_ms, x, y);
        self.history.clear();
        self.history.push_back(sample);
        self.anchor = Some(Anchor {
            start: sample,
            last: sample,
            escaped_deadzone: self.config.deadzone_px <= 0.0,
        });
        DragLifecycle::Start { x, y }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, now_ms: f64) -> Option<DragLifecycle> {
        let deadzone = self.config.deadzone_px;
        let anchor = self.anchor.as_mut()?;
        let delta_x = x - anchor.last.x;
        let delta_y = y - anchor.last.y;
        let total_x = x - anchor.start.x;
        let total_y = y - anchor.start.y;
        let sample = PointerSample::new(now_ms, x, y);
        anchor.last = sample;
        if !anchor.escaped_deadzone && (total_x.abs() >= deadzone || total_y.abs() >= deadzone) {
            anchor.escaped_deadzone = true;
            debug!(total_x, total_y, "pointer left deadzone");
        }
        let emit = anchor.escaped_deadzone;

        self.history.push_back(sample);
        self.prune(now_ms);

        emit.then_some(DragLifecycle::Move {
            delta_x,
            delta_y,
            total_x,
            total_y,
            x,
            y,
        })
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, now_ms: f64) -> Option<DragLifecycle> {
        self.anchor.take()?;
        self.history.push_back(PointerSample::new(now_ms, x, y));
        let velocity = VelocityEstimate::from_history(
            &self.history,
            self.config.velocity_window_ms,
            self.config.max_speed_px_per_sec,
        );
        self.history.clear();
        Some(DragLifecycle::End { x, y, velocity })
    }

    /// Abandons the current gesture without producing an end event.
    pub fn cancel(&mut self) {
        self.anchor = None;
        self.history.clear();
    }

    /// Closes an interrupted gesture where the pointer was last seen. The end
    /// carries zero velocity so an abandoned drag never seeds a flick.
    pub fn abandon(&mut self) -> Option<DragLifecycle> {
        let (x, y) = self.last_position()?;
        self.cancel();
        Some(DragLifecycle::End {
            x,
            y,
            velocity: VelocityEstimate::ZERO,
        })
    }

    fn prune(&mut self, now_ms: f64) {
        let cutoff = now_ms - (self.config.velocity_window_ms + PRUNE_SLACK_MS);
        while self.history.len() > 1
            && self
                .history
                .front()
                .is_some_and(|sample| sample.timestamp_ms < cutoff)
        {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
#[path = "tests/sampler_tests.rs"]
mod tests;
