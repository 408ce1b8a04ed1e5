use super::*;

fn sample_graph() -> SceneGraph {
    let mut graph = SceneGraph::new();
    graph.spawn(EntityId(1), None).expect("root");
    graph
        .spawn_labeled(EntityId(2), Some(EntityId(1)), "model")
        .expect("model");
    graph
        .spawn_labeled(EntityId(3), Some(EntityId(2)), "audio")
        .expect("audio");
    graph
}

#[test]
fn spawn_links_parent_and_children() {
    let graph = sample_graph();
    assert_eq!(graph.parent(EntityId(3)), Some(EntityId(2)));
    assert_eq!(graph.children(EntityId(1)), vec![EntityId(2)]);
    assert_eq!(graph.label(EntityId(2)), Some("model"));
    assert!(!graph.has_label(EntityId(1)));
}

#[test]
fn spawn_under_unknown_parent_fails() {
    let mut graph = SceneGraph::new();
    let err = graph.spawn(EntityId(5), Some(EntityId(99))).unwrap_err();
    assert_eq!(err, GestureError::UnknownEntity(EntityId(99)));
    assert!(graph.is_empty());
}

#[test]
fn reparent_moves_child_between_parents() {
    let mut graph = sample_graph();
    graph
        .reparent(EntityId(3), Some(EntityId(1)))
        .expect("reparent");
    assert_eq!(graph.parent(EntityId(3)), Some(EntityId(1)));
    assert!(graph.children(EntityId(2)).is_empty());
    assert_eq!(graph.children(EntityId(1)), vec![EntityId(2), EntityId(3)]);
}

#[test]
fn reparent_allows_cycles() {
    let mut graph = sample_graph();
    graph
        .reparent(EntityId(1), Some(EntityId(3)))
        .expect("cycle accepted");
    assert_eq!(graph.parent(EntityId(1)), Some(EntityId(3)));
}

#[test]
fn transforms_default_to_identity_and_unit_scale() {
    let mut graph = sample_graph();
    assert_eq!(graph.orientation(EntityId(2)), Some(DQuat::IDENTITY));
    assert_eq!(graph.scale(EntityId(2)), Some(DVec3::ONE));

    let turned = DQuat::from_rotation_y(0.5);
    graph
        .set_orientation(EntityId(2), turned)
        .expect("orientation");
    assert_eq!(graph.orientation(EntityId(2)), Some(turned));
    assert!(graph.set_scale(EntityId(42), DVec3::ONE).is_err());
}

#[test]
fn description_resolves_forward_parent_references() {
    let description: SceneDescription = serde_json::from_str(
        r#"{"nodes":[
            {"id":3,"parent":2,"label":"audio"},
            {"id":2,"parent":1,"label":"model","orientation":[0.0,0.0,0.0,2.0]},
            {"id":1}
        ]}"#,
    )
    .expect("json");
    let graph = SceneGraph::from_description(&description).expect("graph");
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.parent(EntityId(3)), Some(EntityId(2)));
    assert_eq!(graph.orientation(EntityId(2)), Some(DQuat::IDENTITY));
}

#[test]
fn description_rejects_zero_quaternion() {
    let description = SceneDescription {
        nodes: vec![NodeDescription {
            id: EntityId(1),
            parent: None,
            label: None,
            orientation: Some([0.0; 4]),
        }],
    };
    let err = SceneGraph::from_description(&description).unwrap_err();
    assert!(matches!(err, GestureError::InvalidConfig { .. }));
}

#[test]
fn duplicate_spawn_is_rejected() {
    let mut graph = sample_graph();
    let err = graph.spawn(EntityId(2), None).unwrap_err();
    assert!(matches!(err, GestureError::InvalidConfig { field: "id", .. }));
    assert_eq!(graph.children(EntityId(2)), vec![EntityId(3)]);
}
