use std::any::Any;

use shared::{
    domain::EntityId,
    protocol::{Envelope, Event, EventKind, GestureEvent, TouchEvent},
};
use tracing::{debug, info};

use crate::{
    bus::{EventBus, Interest, Subscription},
    config::{ContentConfig, ContentMode},
    runtime::{Component, Context},
};

/// Narration collaborator: each named trigger addressed to its entity advances
/// a step counter over the configured tracks, wrapping at the end.
pub struct ContentStepper {
    owner: EntityId,
    config: ContentConfig,
    index: usize,
    played: Vec<String>,
    subscription: Subscription,
}

impl ContentStepper {
    pub fn new(bus: &EventBus, owner: EntityId, config: ContentConfig) -> Self {
        Self {
            owner,
            config,
            index: 0,
            played: Vec::new(),
            subscription: bus.subscribe([
                Interest::entity(owner, EventKind::Trigger),
                Interest::global(EventKind::TouchStart),
            ]),
        }
    }

    /// Position of the track the next step will play.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Key of the track the next step will play, e.g. `heatsink-analogy-2`.
    pub fn current_track(&self) -> String {
        self.track_key(self.index)
    }

    pub fn played(&self) -> &[String] {
        &self.played
    }

    pub fn last_played(&self) -> Option<&str> {
        self.played.last().map(String::as_str)
    }

    fn track_key(&self, index: usize) -> String {
        let suffix = match self.config.mode {
            ContentMode::Technical => "",
            ContentMode::Analogy => "-analogy",
        };
        format!("{}{}-{}", self.config.base, suffix, index + 1)
    }

    pub fn step(&mut self) -> String {
        let track = self.current_track();
        info!(owner = %self.owner, %track, "playing narration track");
        self.index = (self.index + 1) % self.config.track_count.max(1);
        self.played.push(track.clone());
        track
    }
}

impl Component for ContentStepper {
    fn name(&self) -> &'static str {
        "content"
    }

    fn subscription(&self) -> Option<&Subscription> {
        Some(&self.subscription)
    }

    fn handle(&mut self, envelope: &Envelope, _ctx: &mut Context<'_>) {
        match &envelope.event {
            Event::Gesture(GestureEvent::Trigger { name, source_eid }) => {
                if *name != self.config.trigger_event_name {
                    debug!(owner = %self.owner, %name, "unrelated trigger ignored");
                    return;
                }
                debug!(owner = %self.owner, source = %source_eid, "content triggered");
                self.step();
            }
            Event::Touch(TouchEvent::ScreenTouchStart {
                target: Some(hit), ..
            }) if self.config.allow_direct_touch && *hit == self.owner => {
                self.step();
            }
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, runtime::Runtime};
    use scene::SceneGraph;
    use shared::{domain::ComponentId, protocol::Address};

    const FRAME: EntityId = EntityId(7);

    fn rig(config: ContentConfig) -> (Runtime<SceneGraph>, ComponentId) {
        let mut graph = SceneGraph::new();
        graph.spawn(FRAME, None).expect("frame");
        let mut runtime = Runtime::new(graph, ManualClock::new(0.0));
        let stepper = ContentStepper::new(runtime.bus(), FRAME, config);
        let id = runtime.add(stepper);
        (runtime, id)
    }

    fn trigger(runtime: &mut Runtime<SceneGraph>, name: &str) {
        runtime.dispatch(
            Address::Entity(FRAME),
            GestureEvent::Trigger {
                name: name.into(),
                source_eid: EntityId(1),
            },
        );
    }

    fn stepper(runtime: &Runtime<SceneGraph>, id: ComponentId) -> &ContentStepper {
        runtime.component::<ContentStepper>(id).expect("stepper")
    }

    #[test]
    fn triggers_cycle_through_tracks() {
        let (mut runtime, id) = rig(ContentConfig {
            base: "grace-hopper".into(),
            track_count: 3,
            ..ContentConfig::default()
        });
        for _ in 0..4 {
            trigger(&mut runtime, "play-audio-trigger");
        }
        assert_eq!(
            stepper(&runtime, id).played(),
            [
                "grace-hopper-1",
                "grace-hopper-2",
                "grace-hopper-3",
                "grace-hopper-1"
            ]
        );
        assert_eq!(stepper(&runtime, id).current_track(), "grace-hopper-2");
    }

    #[test]
    fn analogy_mode_marks_track_keys() {
        let (mut runtime, id) = rig(ContentConfig {
            mode: ContentMode::Analogy,
            track_count: 3,
            ..ContentConfig::default()
        });
        trigger(&mut runtime, "play-audio-trigger");
        assert_eq!(stepper(&runtime, id).last_played(), Some("heatsink-analogy-1"));
    }

    #[test]
    fn other_trigger_names_and_targets_are_ignored() {
        let (mut runtime, id) = rig(ContentConfig::default());
        trigger(&mut runtime, "show-credits");
        runtime.dispatch(
            Address::Entity(EntityId(99)),
            GestureEvent::Trigger {
                name: "play-audio-trigger".into(),
                source_eid: EntityId(1),
            },
        );
        assert!(stepper(&runtime, id).played().is_empty());
    }

    #[test]
    fn direct_touch_steps_only_when_allowed() {
        let (mut runtime, id) = rig(ContentConfig::default());
        runtime.handle_touch(TouchEvent::start(FRAME, 0.0, 0.0));
        assert!(stepper(&runtime, id).played().is_empty());

        let (mut runtime, id) = rig(ContentConfig {
            allow_direct_touch: true,
            ..ContentConfig::default()
        });
        runtime.handle_touch(TouchEvent::start(EntityId(3), 0.0, 0.0));
        runtime.handle_touch(TouchEvent::start(FRAME, 0.0, 0.0));
        assert_eq!(stepper(&runtime, id).played(), ["heatsink-1"]);
    }
}
