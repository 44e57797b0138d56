//! Reconstruction of the nested field tree from flat parent-linked rows.
//!
//! Works in two passes over an id index: first decide every parent link,
//! then emit the tree from the unlinked roots. Nothing is moved while it is
//! being iterated.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::models::{AnnotatedField, TargetFieldDefinition};

/// Root level of a rebuilt field tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTree {
    /// Root fields keyed by field key, ascending by legacy id
    pub elements: IndexMap<String, TargetFieldDefinition>,
    /// Keys that appeared more than once at the same level; the later
    /// (higher id) definition was kept
    pub collisions: Vec<String>,
}

/// Link fields to their parents and return the root level of the tree.
///
/// Fields are linked in descending legacy id order. A field is linked under
/// its parent only if the parent exists and has not already been linked
/// under another field; otherwise it stays at the root. Self-parents and
/// dangling parent ids therefore end up at the root, and no cycle can form.
/// Roots and children are ordered ascending by legacy id, so the result does
/// not depend on the input order.
pub fn build_hierarchy(fields: impl IntoIterator<Item = AnnotatedField>) -> FieldTree {
    let mut arena: BTreeMap<i64, AnnotatedField> = BTreeMap::new();
    for field in fields {
        arena.insert(field.legacy_id, field);
    }

    let mut children_of: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    let mut linked: BTreeSet<i64> = BTreeSet::new();

    for (&id, field) in arena.iter().rev() {
        let parent = field.parent_legacy_id;
        if parent == 0 {
            continue;
        }
        if parent == id || !arena.contains_key(&parent) || linked.contains(&parent) {
            debug!(
                "Field {} ({}) keeps its place at the root; parent {} is not available",
                id, field.definition.key, parent
            );
            continue;
        }
        children_of.entry(parent).or_default().push(id);
        linked.insert(id);
    }

    let roots: Vec<i64> = arena
        .keys()
        .copied()
        .filter(|id| !linked.contains(id))
        .collect();

    let mut tree = FieldTree::default();
    for id in roots {
        if let Some(definition) = take_node(id, &mut arena, &children_of, &mut tree.collisions) {
            insert_keyed(&mut tree.elements, definition, &mut tree.collisions);
        }
    }
    tree
}

/// Remove `id` from the arena together with its linked descendants.
fn take_node(
    id: i64,
    arena: &mut BTreeMap<i64, AnnotatedField>,
    children_of: &BTreeMap<i64, Vec<i64>>,
    collisions: &mut Vec<String>,
) -> Option<TargetFieldDefinition> {
    let mut definition = arena.remove(&id)?.definition;
    if let Some(child_ids) = children_of.get(&id) {
        // Linked in descending order
        for &child_id in child_ids.iter().rev() {
            if let Some(child) = take_node(child_id, arena, children_of, collisions) {
                insert_keyed(&mut definition.children, child, collisions);
            }
        }
    }
    Some(definition)
}

fn insert_keyed(
    level: &mut IndexMap<String, TargetFieldDefinition>,
    definition: TargetFieldDefinition,
    collisions: &mut Vec<String>,
) {
    let key = definition.key.clone();
    if level.insert(key.clone(), definition).is_some() {
        collisions.push(key);
    }
}
