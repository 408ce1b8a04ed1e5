use std::collections::HashMap;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use shared::{domain::EntityId, error::GestureError};

/// Read-only view of the host's object hierarchy and name tags.
pub trait LabelIndex {
    fn contains(&self, entity: EntityId) -> bool;
    fn label(&self, entity: EntityId) -> Option<&str>;
    fn parent(&self, entity: EntityId) -> Option<EntityId>;
    fn children(&self, entity: EntityId) -> Vec<EntityId>;

    fn has_label(&self, entity: EntityId) -> bool {
        self.label(entity).is_some()
    }
}

/// Transform storage owned by the host. The gesture core only reads and
/// writes orientation and uniform scale.
pub trait TransformStore {
    fn orientation(&self, entity: EntityId) -> Option<DQuat>;
    fn set_orientation(&mut self, entity: EntityId, orientation: DQuat)
        -> Result<(), GestureError>;
    fn scale(&self, entity: EntityId) -> Option<DVec3>;
    fn set_scale(&mut self, entity: EntityId, scale: DVec3) -> Result<(), GestureError>;
}

pub trait Scene: LabelIndex + TransformStore {}

impl<T: LabelIndex + TransformStore> Scene for T {}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    label: Option<String>,
    orientation: DQuat,
    scale: DVec3,
}

impl Node {
    fn new(parent: Option<EntityId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            label: None,
            orientation: DQuat::IDENTITY,
            scale: DVec3::ONE,
        }
    }
}

/// In-memory scene graph. Parent links are taken as given: `reparent` does not
/// reject cycles, so consumers walking the graph must bound their walks.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: HashMap<EntityId, Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// `[x, y, z, w]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<[f64; 4]>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn spawn(&mut self, entity: EntityId, parent: Option<EntityId>) -> Result<(), GestureError> {
        if self.nodes.contains_key(&entity) {
            return Err(GestureError::invalid_config(
                "id",
                format!("entity {entity} already exists"),
            ));
        }
        if let Some(parent) = parent {
            let parent_node = self
                .nodes
                .get_mut(&parent)
                .ok_or(GestureError::UnknownEntity(parent))?;
            parent_node.children.push(entity);
        }
        self.nodes.insert(entity, Node::new(parent));
        Ok(())
    }

    pub fn spawn_labeled(
        &mut self,
        entity: EntityId,
        parent: Option<EntityId>,
        label: &str,
    ) -> Result<(), GestureError> {
        self.spawn(entity, parent)?;
        self.set_label(entity, label)
    }

    pub fn set_label(&mut self, entity: EntityId, label: &str) -> Result<(), GestureError> {
        let node = self.node_mut(entity)?;
        node.label = Some(label.to_string());
        Ok(())
    }

    pub fn clear_label(&mut self, entity: EntityId) -> Result<(), GestureError> {
        self.node_mut(entity)?.label = None;
        Ok(())
    }

    pub fn reparent(
        &mut self,
        entity: EntityId,
        parent: Option<EntityId>,
    ) -> Result<(), GestureError> {
        if let Some(parent) = parent {
            if !self.nodes.contains_key(&parent) {
                return Err(GestureError::UnknownEntity(parent));
            }
        }
        let previous = self.node_mut(entity)?.parent.take();
        if let Some(previous) = previous {
            if let Some(old_parent) = self.nodes.get_mut(&previous) {
                old_parent.children.retain(|child| *child != entity);
            }
        }
        if let Some(parent) = parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.push(entity);
            }
        }
        self.node_mut(entity)?.parent = parent;
        Ok(())
    }

    /// Builds a graph from a flat node list; parents may be listed after
    /// their children.
    pub fn from_description(description: &SceneDescription) -> Result<Self, GestureError> {
        let mut graph = Self::new();
        for node in &description.nodes {
            graph.spawn(node.id, None)?;
            if let Some(label) = &node.label {
                graph.set_label(node.id, label)?;
            }
            if let Some([x, y, z, w]) = node.orientation {
                let orientation = DQuat::from_xyzw(x, y, z, w);
                if !orientation.is_finite() || orientation.length_squared() == 0.0 {
                    return Err(GestureError::invalid_config(
                        "orientation",
                        format!("entity {} has a degenerate quaternion", node.id),
                    ));
                }
                graph.set_orientation(node.id, orientation.normalize())?;
            }
        }
        for node in &description.nodes {
            if node.parent.is_some() {
                graph.reparent(node.id, node.parent)?;
            }
        }
        Ok(graph)
    }

    fn node_mut(&mut self, entity: EntityId) -> Result<&mut Node, GestureError> {
        self.nodes
            .get_mut(&entity)
            .ok_or(GestureError::UnknownEntity(entity))
    }
}

impl LabelIndex for SceneGraph {
    fn contains(&self, entity: EntityId) -> bool {
        self.nodes.contains_key(&entity)
    }

    fn label(&self, entity: EntityId) -> Option<&str> {
        self.nodes.get(&entity)?.label.as_deref()
    }

    fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.nodes.get(&entity)?.parent
    }

    fn children(&self, entity: EntityId) -> Vec<EntityId> {
        self.nodes
            .get(&entity)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }
}

impl TransformStore for SceneGraph {
    fn orientation(&self, entity: EntityId) -> Option<DQuat> {
        self.nodes.get(&entity).map(|node| node.orientation)
    }

    fn set_orientation(
        &mut self,
        entity: EntityId,
        orientation: DQuat,
    ) -> Result<(), GestureError> {
        self.node_mut(entity)?.orientation = orientation;
        Ok(())
    }

    fn scale(&self, entity: EntityId) -> Option<DVec3> {
        self.nodes.get(&entity).map(|node| node.scale)
    }

    fn set_scale(&mut self, entity: EntityId, scale: DVec3) -> Result<(), GestureError> {
        self.node_mut(entity)?.scale = scale;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
