use super::*;

#[test]
fn touch_start_decodes_without_position() {
    let raw = r#"{"type":"screen_touch_start","payload":{"target":4}}"#;
    let event: TouchEvent = serde_json::from_str(raw).expect("decode");
    assert_eq!(
        event,
        TouchEvent::ScreenTouchStart {
            target: Some(EntityId(4)),
            position: None,
        }
    );
}

#[test]
fn drag_events_use_channel_names_and_camel_case_fields() {
    let event = GestureEvent::Drag {
        target_eid: EntityId(1),
        delta_x: 2.0,
        delta_y: 0.0,
        total_x: 12.0,
        total_y: 0.0,
        x: 112.0,
        y: 100.0,
    };
    let json = serde_json::to_value(&event).expect("encode");
    assert_eq!(json["type"], "on-drag");
    assert_eq!(json["payload"]["targetEid"], 1);
    assert_eq!(json["payload"]["totalX"], 12.0);
}

#[test]
fn drag_end_without_velocity_omits_fields() {
    let raw = r#"{"type":"on-drag-end","payload":{"targetEid":2,"x":5.0,"y":6.0}}"#;
    let event: GestureEvent = serde_json::from_str(raw).expect("decode");
    match event {
        GestureEvent::DragEnd { vx, vy, speed, .. } => {
            assert!(vx.is_none() && vy.is_none() && speed.is_none());
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn untagged_event_routes_touch_and_gesture_payloads() {
    let touch: Event =
        serde_json::from_str(r#"{"type":"pinch","payload":{"distance":80.0}}"#).expect("touch");
    assert_eq!(touch.kind(), EventKind::Pinch);

    let gesture: Event =
        serde_json::from_str(r#"{"type":"drag-state","payload":{"active":true}}"#)
            .expect("gesture");
    assert_eq!(gesture.kind(), EventKind::DragState);
}

#[test]
fn envelope_addresses_serialize_snake_case() {
    let envelope = Envelope::to_entity(EntityId(7), GestureEvent::DragState { active: false });
    let json = serde_json::to_value(&envelope).expect("encode");
    assert_eq!(json["address"]["entity"], 7);

    let global = Envelope::global(TouchEvent::PinchEnd);
    assert_eq!(serde_json::to_value(&global).expect("encode")["address"], "global");
}
