use gesture_core::{
    ArbiterConfig, Clock, DragBlocker, DragInputManager, ManualClock, RotationConfig,
    RotationController, RotationState, Runtime, SamplerConfig, UnifiedInputController,
};
use glam::{DQuat, DVec3};
use scene::{SceneGraph, TransformStore};
use shared::{
    domain::{ComponentId, EntityId},
    protocol::{Address, Event, GestureEvent, TouchEvent},
};

const ROOT: EntityId = EntityId(1);
const MODEL: EntityId = EntityId(2);
const CHASSIS: EntityId = EntityId(3);
const BAY: EntityId = EntityId(4);
const RACK: EntityId = EntityId(5);
const SPEAKER: EntityId = EntityId(6);
const SPEAKER_GRILLE: EntityId = EntityId(7);
const PEDESTAL: EntityId = EntityId(8);
const STRAY: EntityId = EntityId(9);

/// 1 root
/// ├── 2 "model"
/// │   └── 3 ── 4 ── 5
/// │            └── 6 "audio" (three levels below the model) ── 7
/// └── 8 pedestal
/// 9 stray, outside the root
fn tour_scene() -> SceneGraph {
    let mut graph = SceneGraph::new();
    graph.spawn(ROOT, None).expect("root");
    graph.spawn_labeled(MODEL, Some(ROOT), "model").expect("model");
    graph.spawn(CHASSIS, Some(MODEL)).expect("chassis");
    graph.spawn(BAY, Some(CHASSIS)).expect("bay");
    graph.spawn(RACK, Some(BAY)).expect("rack");
    graph
        .spawn_labeled(SPEAKER, Some(BAY), "audio")
        .expect("speaker");
    graph
        .spawn(SPEAKER_GRILLE, Some(SPEAKER))
        .expect("grille");
    graph.spawn(PEDESTAL, Some(ROOT)).expect("pedestal");
    graph.spawn(STRAY, None).expect("stray");
    graph
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Design {
    Unified,
    Split,
}

struct Rig {
    runtime: Runtime<SceneGraph>,
    clock: ManualClock,
    rotation: ComponentId,
}

impl Rig {
    fn new(design: Design) -> Self {
        let clock = ManualClock::new(0.0);
        let mut runtime = Runtime::new(tour_scene(), clock.clone());
        match design {
            Design::Unified => {
                let controller = UnifiedInputController::new(
                    runtime.bus(),
                    ROOT,
                    None,
                    ArbiterConfig::default(),
                    SamplerConfig::default(),
                );
                runtime.add(controller);
            }
            Design::Split => {
                let manager =
                    DragInputManager::new(runtime.bus(), ROOT, None, SamplerConfig::default());
                runtime.add(manager);
                runtime.add(DragBlocker::new(ROOT, None, ArbiterConfig::default()));
            }
        }
        let rotation = RotationController::new(runtime.bus(), ROOT, RotationConfig::default());
        let rotation = runtime.add(rotation);
        runtime.bus().enable_journal();
        Self {
            runtime,
            clock,
            rotation,
        }
    }

    fn rotation(&self) -> &RotationController {
        self.runtime
            .component::<RotationController>(self.rotation)
            .expect("rotation controller")
    }

    fn model_orientation(&self) -> DQuat {
        self.runtime
            .scene()
            .orientation(MODEL)
            .expect("model orientation")
    }

    fn at(&mut self, t_ms: f64, event: TouchEvent) {
        self.clock.set(t_ms);
        self.runtime.handle_touch(event);
    }

    /// Press on `hit`, move in `steps` evenly spaced moves to `(x, y)` over
    /// `duration_ms`, then release on `hit` at the same point.
    fn gesture(
        &mut self,
        hit: EntityId,
        from: (f64, f64),
        to: (f64, f64),
        duration_ms: f64,
        steps: usize,
    ) {
        let t0 = self.clock_now();
        self.at(t0, TouchEvent::start(hit, from.0, from.1));
        for step in 1..=steps {
            let f = step as f64 / steps as f64;
            self.at(
                t0 + duration_ms * f,
                TouchEvent::moved(from.0 + (to.0 - from.0) * f, from.1 + (to.1 - from.1) * f),
            );
        }
        self.at(t0 + duration_ms, TouchEvent::end(Some(hit), to.0, to.1));
    }

    fn clock_now(&self) -> f64 {
        self.clock.now_ms()
    }

    fn run_frames(&mut self, frames: usize, dt_secs: f64) {
        for _ in 0..frames {
            self.clock.advance(dt_secs * 1000.0);
            self.runtime.tick(dt_secs);
        }
    }

    fn gesture_events(&self) -> Vec<(Address, GestureEvent)> {
        self.runtime
            .bus()
            .take_journal()
            .into_iter()
            .filter_map(|envelope| match envelope.event {
                Event::Gesture(event) => Some((envelope.address, event)),
                Event::Touch(_) => None,
            })
            .collect()
    }
}

fn assert_quat_close(actual: DQuat, expected: DQuat) {
    assert!(
        actual.abs_diff_eq(expected, 1e-9) || actual.abs_diff_eq(-expected, 1e-9),
        "{actual:?} != {expected:?}"
    );
}

#[test]
fn slow_fifty_pixel_drag_rotates_once_and_never_spins() {
    for design in [Design::Unified, Design::Split] {
        let mut rig = Rig::new(design);
        // 50 px over one second: release speed is 50 px/s.
        rig.gesture(CHASSIS, (100.0, 100.0), (150.0, 100.0), 1000.0, 100);

        let release = rig
            .gesture_events()
            .into_iter()
            .find_map(|(_, event)| match event {
                GestureEvent::DragEnd { speed, .. } => speed,
                _ => None,
            })
            .expect("drag end with speed");
        assert!((release - 50.0).abs() < 1e-6, "{design:?}: speed {release}");

        let expected = DQuat::from_axis_angle(DVec3::Y, 50.0 * 0.006);
        assert_quat_close(rig.model_orientation(), expected);
        assert_eq!(rig.rotation().angular_velocity(), 0.0);

        rig.run_frames(120, 1.0 / 60.0);
        assert_quat_close(rig.model_orientation(), expected);
        assert_eq!(rig.rotation().state(), RotationState::Idle);
    }
}

#[test]
fn fast_flick_spins_until_a_new_press_stops_it() {
    let mut rig = Rig::new(Design::Unified);
    rig.gesture(MODEL, (0.0, 0.0), (300.0, 0.0), 100.0, 10);
    assert_eq!(rig.rotation().state(), RotationState::Spinning);
    let seeded = rig.rotation().angular_velocity();
    assert!(seeded >= 0.8);

    rig.run_frames(5, 1.0 / 60.0);
    assert!(rig.rotation().angular_velocity() < seeded);

    let now = rig.clock_now();
    rig.at(now, TouchEvent::start(CHASSIS, 10.0, 10.0));
    assert_eq!(rig.rotation().angular_velocity(), 0.0);
    let held = rig.model_orientation();
    rig.run_frames(10, 1.0 / 60.0);
    assert_eq!(rig.model_orientation(), held);

    let now = rig.clock_now();
    rig.at(now, TouchEvent::end(Some(CHASSIS), 10.0, 10.0));
    rig.run_frames(10, 1.0 / 60.0);
    assert_eq!(rig.model_orientation(), held);
    assert_eq!(rig.rotation().state(), RotationState::Idle);
}

#[test]
fn orientation_stays_unit_through_mixed_drags_and_spins() {
    let mut rig = Rig::new(Design::Unified);
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed % 10_000) as f64 / 10.0 - 500.0
    };

    for round in 0..40 {
        let from = (next(), next());
        let to = (next(), next());
        let duration = 20.0 + (round % 7) as f64 * 30.0;
        rig.gesture(MODEL, from, to, duration, 1 + round % 5);
        assert!((rig.model_orientation().length() - 1.0).abs() < 1e-9);
        rig.run_frames(1 + round % 13, 1.0 / 60.0);
        assert!((rig.model_orientation().length() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn flick_threshold_is_sharp() {
    let mut rig = Rig::new(Design::Unified);
    let release = |rig: &mut Rig, speed: f64| {
        rig.runtime.dispatch(
            Address::Global,
            GestureEvent::DragStart {
                target_eid: ROOT,
                x: 0.0,
                y: 0.0,
            },
        );
        rig.runtime.dispatch(
            Address::Global,
            GestureEvent::DragEnd {
                target_eid: ROOT,
                x: 0.0,
                y: 0.0,
                vx: Some(speed),
                vy: Some(0.0),
                speed: Some(speed),
            },
        );
    };

    release(&mut rig, 900.0 - 1e-9);
    assert_eq!(rig.rotation().angular_velocity(), 0.0);

    let speed = 900.0 + 1e-9;
    release(&mut rig, speed);
    assert_eq!(
        rig.rotation().angular_velocity(),
        (speed * 0.006_f64).max(0.8)
    );
}

#[test]
fn spin_decay_does_not_depend_on_frame_splitting() {
    let seed_spin = || {
        let mut rig = Rig::new(Design::Unified);
        rig.gesture(MODEL, (0.0, 0.0), (0.0, 400.0), 100.0, 8);
        rig
    };
    let mut whole = seed_spin();
    let mut halves = seed_spin();
    assert_eq!(
        whole.rotation().angular_velocity(),
        halves.rotation().angular_velocity()
    );

    whole.runtime.tick(0.05);
    halves.runtime.tick(0.025);
    halves.runtime.tick(0.025);

    let (a, b) = (
        whole.rotation().angular_velocity(),
        halves.rotation().angular_velocity(),
    );
    assert!((a - b).abs() < 1e-9, "{a} vs {b}");
}

#[test]
fn nested_hotspot_blocks_rotation_in_both_designs() {
    for design in [Design::Unified, Design::Split] {
        let mut rig = Rig::new(design);
        rig.gesture(SPEAKER_GRILLE, (0.0, 0.0), (120.0, 0.0), 100.0, 6);
        let events = rig.gesture_events();
        assert!(
            events
                .iter()
                .all(|(_, event)| !matches!(event, GestureEvent::DragStart { .. })),
            "{design:?}: {events:?}"
        );
        assert_eq!(rig.model_orientation(), DQuat::IDENTITY);
        assert_eq!(rig.rotation().state(), RotationState::Idle);
    }
}

#[test]
fn unmatched_touches_produce_no_events() {
    for design in [Design::Unified, Design::Split] {
        let mut rig = Rig::new(design);
        rig.gesture(PEDESTAL, (0.0, 0.0), (90.0, 40.0), 80.0, 4);
        rig.gesture(STRAY, (0.0, 0.0), (90.0, 40.0), 80.0, 4);
        rig.gesture(ROOT, (0.0, 0.0), (90.0, 40.0), 80.0, 4);
        assert!(rig.gesture_events().is_empty(), "{design:?}");
        assert_eq!(rig.model_orientation(), DQuat::IDENTITY);
    }
}

#[test]
fn unified_and_split_designs_agree() {
    let hits = [
        MODEL,
        CHASSIS,
        RACK,
        SPEAKER,
        SPEAKER_GRILLE,
        PEDESTAL,
        STRAY,
        ROOT,
    ];
    let mut unified = Rig::new(Design::Unified);
    let mut split = Rig::new(Design::Split);

    for (i, hit) in hits.into_iter().enumerate() {
        let offset = i as f64 * 17.0;
        for rig in [&mut unified, &mut split] {
            rig.gesture(hit, (offset, 0.0), (offset + 60.0, 25.0), 90.0, 5);
            rig.run_frames(3, 1.0 / 60.0);
        }
        let drag_events = |rig: &Rig| {
            rig.gesture_events()
                .into_iter()
                .filter(|(_, event)| !matches!(event, GestureEvent::Trigger { .. }))
                .collect::<Vec<_>>()
        };
        assert_eq!(drag_events(&unified), drag_events(&split), "hit {hit}");
        assert_quat_close(unified.model_orientation(), split.model_orientation());
    }
}

#[test]
fn lost_release_never_strands_the_rotation() {
    let restarts = [
        TouchEvent::start(PEDESTAL, 0.0, 0.0),
        TouchEvent::start(SPEAKER, 0.0, 0.0),
        TouchEvent::ScreenTouchStart {
            target: None,
            position: None,
        },
    ];
    for design in [Design::Unified, Design::Split] {
        for restart in restarts.clone() {
            let mut rig = Rig::new(design);
            rig.at(0.0, TouchEvent::start(CHASSIS, 100.0, 100.0));
            rig.at(16.0, TouchEvent::moved(140.0, 100.0));
            rig.at(32.0, TouchEvent::moved(180.0, 100.0));
            assert_eq!(rig.rotation().state(), RotationState::Dragging);

            rig.at(40.0, restart.clone());
            assert_eq!(
                rig.rotation().state(),
                RotationState::Idle,
                "{design:?} {restart:?}"
            );
            let moved = rig.model_orientation();
            rig.run_frames(30, 1.0 / 60.0);
            assert_quat_close(rig.model_orientation(), moved);

            let events = rig.gesture_events();
            let count = |is_kind: fn(&GestureEvent) -> bool| {
                events.iter().filter(|(_, event)| is_kind(event)).count()
            };
            assert_eq!(
                count(|event| matches!(event, GestureEvent::DragStart { .. })),
                count(|event| matches!(event, GestureEvent::DragEnd { .. })),
                "{design:?} {restart:?}: {events:?}"
            );
            let last_state = events.iter().rev().find_map(|(_, event)| match event {
                GestureEvent::DragState { active } => Some(*active),
                _ => None,
            });
            assert_eq!(last_state, Some(false), "{design:?} {restart:?}");
        }
    }
}
