//! Touch-target arbitration over the host's object hierarchy.
//!
//! Every component that needs to know "did this touch land on a hotspot or on
//! the rotatable model" goes through [`classify`]; the walk is iterative,
//! bounded by [`MAX_WALK_DEPTH`] and guarded against cyclic parent links.

use std::collections::{HashSet, VecDeque};

use scene::LabelIndex;
use shared::{domain::EntityId, error::GestureError};

use crate::config::ArbiterConfig;

pub const MAX_WALK_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A blocking label was found; carries the labelled object.
    Hotspot(EntityId),
    Rotatable,
    Unmatched,
}

impl Classification {
    pub fn allows_drag(&self) -> bool {
        matches!(self, Self::Rotatable)
    }
}

/// Ancestor chain from `hit` up to and including `root`.
pub fn path_to_root<L: LabelIndex + ?Sized>(
    index: &L,
    hit: EntityId,
    root: EntityId,
) -> Result<Vec<EntityId>, GestureError> {
    let mut path = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(hit);
    while let Some(entity) = current {
        if path.len() >= MAX_WALK_DEPTH {
            return Err(GestureError::HierarchyTooDeep {
                start: hit,
                limit: MAX_WALK_DEPTH,
            });
        }
        if !visited.insert(entity) {
            return Err(GestureError::HierarchyCycle(entity));
        }
        path.push(entity);
        if entity == root {
            return Ok(path);
        }
        current = index.parent(entity);
    }
    Err(GestureError::OutsideRoot { hit, root })
}

pub fn is_same_or_descendant<L: LabelIndex + ?Sized>(
    index: &L,
    entity: EntityId,
    ancestor: EntityId,
) -> bool {
    path_to_root(index, entity, ancestor).is_ok()
}

/// Classifies a touch on `hit` relative to `root`. The first blocking label
/// met while ascending wins, even above a rotatable one.
pub fn classify<L: LabelIndex + ?Sized>(
    index: &L,
    hit: EntityId,
    root: EntityId,
    config: &ArbiterConfig,
) -> Result<Classification, GestureError> {
    let path = path_to_root(index, hit, root)?;
    let mut found_model = false;
    for entity in path {
        match index.label(entity) {
            Some(label) if label == config.block_drag_label => {
                return Ok(Classification::Hotspot(entity));
            }
            Some(label) if label == config.model_label => found_model = true,
            _ => {}
        }
    }
    Ok(if found_model {
        Classification::Rotatable
    } else {
        Classification::Unmatched
    })
}

/// Breadth-first search of `root` and its descendants for the first entity
/// carrying `label`.
pub fn find_descendant_with_label<L: LabelIndex + ?Sized>(
    index: &L,
    root: EntityId,
    label: &str,
) -> Option<EntityId> {
    let mut queue = VecDeque::from([root]);
    let mut visited = HashSet::new();
    while let Some(entity) = queue.pop_front() {
        if !visited.insert(entity) {
            continue;
        }
        if index.label(entity) == Some(label) {
            return Some(entity);
        }
        if visited.len() >= MAX_WALK_DEPTH * MAX_WALK_DEPTH {
            break;
        }
        queue.extend(index.children(entity));
    }
    None
}

#[cfg(test)]
#[path = "tests/arbiter_tests.rs"]
mod tests;
