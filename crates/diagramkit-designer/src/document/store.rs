//! Raw document storage: object arena plus ordered document layers.
//!
//! Every primitive validates its arguments before touching anything, so a
//! failed call leaves the store unchanged. Nothing here records history;
//! that is the job of [`super::Document`] and [`crate::change`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use diagramkit_core::{LayerId, ModelError, ObjectId};

use crate::geometry::{Point, Rect};
use crate::model::{CanvasObject, Shape};

/// Geometry of one leaf object at one moment, as kept by move records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeState {
    pub id: ObjectId,
    pub shape: Shape,
}

/// A document-owned layer. Object z-order is the order of `objects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocLayer {
    pub(crate) id: LayerId,
    pub(crate) name: String,
    pub(crate) objects: Vec<ObjectId>,
    pub(crate) visible: bool,
    pub(crate) pickable: bool,
}

impl DocLayer {
    pub(crate) fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            objects: Vec::new(),
            visible: true,
            pickable: true,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level objects, back to front.
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_pickable(&self) -> bool {
        self.pickable
    }
}

/// Position of an object in the tree: a layer, an optional parent group,
/// and the index among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub layer: LayerId,
    pub parent: Option<ObjectId>,
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DocumentStore {
    pub(crate) objects: HashMap<ObjectId, CanvasObject>,
    pub(crate) layers: Vec<DocLayer>,
    pub(crate) next_object: u64,
    pub(crate) next_layer: u64,
}

impl DocumentStore {
    pub(crate) fn allocate_object_id(&mut self) -> ObjectId {
        self.next_object += 1;
        ObjectId(self.next_object)
    }

    pub(crate) fn allocate_layer_id(&mut self) -> LayerId {
        self.next_layer += 1;
        LayerId(self.next_layer)
    }

    pub(crate) fn object(&self, id: ObjectId) -> Result<&CanvasObject, ModelError> {
        self.objects.get(&id).ok_or(ModelError::UnknownObject { id })
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Result<&mut CanvasObject, ModelError> {
        self.objects
            .get_mut(&id)
            .ok_or(ModelError::UnknownObject { id })
    }

    pub(crate) fn layer_index(&self, id: LayerId) -> Result<usize, ModelError> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(ModelError::UnknownLayer { id })
    }

    pub(crate) fn layer(&self, id: LayerId) -> Result<&DocLayer, ModelError> {
        self.layers
            .iter()
            .find(|l| l.id == id)
            .ok_or(ModelError::UnknownLayer { id })
    }

    fn siblings(&self, layer: LayerId, parent: Option<ObjectId>) -> Result<&Vec<ObjectId>, ModelError> {
        match parent {
            Some(pid) => match &self.object(pid)?.shape {
                Shape::Group { children } => Ok(children),
                _ => Err(ModelError::WrongKind {
                    id: pid,
                    expected: "group",
                }),
            },
            None => Ok(&self.layer(layer)?.objects),
        }
    }

    fn siblings_mut(
        &mut self,
        layer: LayerId,
        parent: Option<ObjectId>,
    ) -> Result<&mut Vec<ObjectId>, ModelError> {
        match parent {
            Some(pid) => match &mut self.object_mut(pid)?.shape {
                Shape::Group { children } => Ok(children),
                _ => Err(ModelError::WrongKind {
                    id: pid,
                    expected: "group",
                }),
            },
            None => {
                let index = self.layer_index(layer)?;
                Ok(&mut self.layers[index].objects)
            }
        }
    }

    pub(crate) fn slot_of(&self, id: ObjectId) -> Result<Slot, ModelError> {
        let object = self.object(id)?;
        let siblings = self.siblings(object.layer, object.parent)?;
        let index = siblings
            .iter()
            .position(|&s| s == id)
            .ok_or(ModelError::UnknownObject { id })?;
        Ok(Slot {
            layer: object.layer,
            parent: object.parent,
            index,
        })
    }

    /// Number of siblings at a slot's level.
    pub(crate) fn sibling_count(&self, layer: LayerId, parent: Option<ObjectId>) -> Result<usize, ModelError> {
        Ok(self.siblings(layer, parent)?.len())
    }

    /// The object and all its descendants, parents before children.
    pub(crate) fn subtree_ids(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(object) = self.objects.get(&current) {
                out.push(current);
                stack.extend(object.children().iter().rev().copied());
            }
        }
        out
    }

    pub(crate) fn snapshot_subtree(&self, id: ObjectId) -> Result<Vec<CanvasObject>, ModelError> {
        self.object(id)?;
        Ok(self
            .subtree_ids(id)
            .into_iter()
            .filter_map(|sid| self.objects.get(&sid).cloned())
            .collect())
    }

    /// True when `ancestor` is `id` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.objects.get(&c).and_then(|o| o.parent);
        }
        false
    }

    /// Outermost ancestor (the object a layer lists directly).
    pub(crate) fn top_level_of(&self, id: ObjectId) -> Result<ObjectId, ModelError> {
        let mut current = self.object(id)?;
        while let Some(parent) = current.parent {
            current = self.object(parent)?;
        }
        Ok(current.id)
    }

    /// Invalidates cached bounds of `id` and every ancestor.
    pub(crate) fn mark_dirty(&self, id: ObjectId) {
        let mut current = Some(id);
        while let Some(c) = current {
            match self.objects.get(&c) {
                Some(object) => {
                    object.mark_dirty();
                    current = object.parent;
                }
                None => break,
            }
        }
    }

    /// Cached bounds, recomputed when dirty. Groups use the union of
    /// their children; empty shapes have none.
    pub(crate) fn bounds(&self, id: ObjectId) -> Option<Rect> {
        let object = self.objects.get(&id)?;
        if let Some(cached) = object.cached_bounds() {
            return Some(cached);
        }
        let computed = match &object.shape {
            Shape::Group { children } => children
                .iter()
                .filter_map(|&c| self.bounds(c))
                .reduce(|a, b| a.union(&b)),
            shape => shape.leaf().and_then(|leaf| leaf.compute_bounds()),
        };
        object.store_bounds(computed);
        computed
    }

    /// Hit-test predicate; a group is hit when any child is.
    pub(crate) fn hit_test(&self, id: ObjectId, p: Point, tolerance: f64) -> bool {
        let Some(object) = self.objects.get(&id) else {
            return false;
        };
        if !object.capabilities.visible {
            return false;
        }
        if !self
            .bounds(id)
            .is_some_and(|b| b.inflate(tolerance).contains(p))
        {
            return false;
        }
        match &object.shape {
            Shape::Group { children } => children
                .iter()
                .any(|&c| self.hit_test(c, p, tolerance)),
            shape => shape.leaf().is_some_and(|leaf| leaf.hit_test(p, tolerance)),
        }
    }

    /// Leaf geometry of `id` and its descendants, before and after moving
    /// by `(dx, dy)`. Nothing is mutated.
    pub(crate) fn translated_shapes(
        &self,
        id: ObjectId,
        dx: f64,
        dy: f64,
    ) -> Result<(Vec<ShapeState>, Vec<ShapeState>), ModelError> {
        self.object(id)?;
        let mut before = Vec::new();
        let mut after = Vec::new();
        for sid in self.subtree_ids(id) {
            let Some(object) = self.objects.get(&sid) else {
                continue;
            };
            if object.shape.leaf().is_none() {
                continue;
            }
            let mut moved = object.shape.clone();
            if let Some(leaf) = moved.leaf_mut() {
                leaf.translate(dx, dy);
            }
            before.push(ShapeState {
                id: sid,
                shape: object.shape.clone(),
            });
            after.push(ShapeState { id: sid, shape: moved });
        }
        Ok((before, after))
    }

    /// Puts recorded leaf geometry back verbatim.
    pub(crate) fn restore_shapes(&mut self, states: &[ShapeState]) -> Result<(), ModelError> {
        for state in states {
            let current = &self.object(state.id)?.shape;
            if current.leaf().is_none() || current.kind_name() != state.shape.kind_name() {
                return Err(ModelError::WrongKind {
                    id: state.id,
                    expected: state.shape.kind_name(),
                });
            }
        }
        for state in states {
            self.object_mut(state.id)?.shape = state.shape.clone();
            self.mark_dirty(state.id);
        }
        Ok(())
    }

    /// Inserts a detached subtree (root first) at `slot`.
    pub(crate) fn insert_subtree(&mut self, slot: Slot, subtree: &[CanvasObject]) -> Result<(), ModelError> {
        let root = subtree.first().ok_or(ModelError::EmptyGroup)?;
        self.check_parent_layer(slot)?;
        let len = self.sibling_count(slot.layer, slot.parent)?;
        if slot.index > len {
            return Err(ModelError::IndexOutOfRange {
                index: slot.index,
                len,
            });
        }
        if let Some(existing) = subtree.iter().find(|o| self.objects.contains_key(&o.id)) {
            return Err(ModelError::DuplicateObject { id: existing.id });
        }

        let root_id = root.id;
        for object in subtree {
            let mut object = object.clone();
            object.layer = slot.layer;
            if object.id == root_id {
                object.parent = slot.parent;
            }
            object.mark_dirty();
            self.objects.insert(object.id, object);
        }
        self.siblings_mut(slot.layer, slot.parent)?
            .insert(slot.index, root_id);
        self.mark_dirty(root_id);
        Ok(())
    }

    /// A slot inside a group must name the group's own layer.
    pub(crate) fn check_parent_layer(&self, slot: Slot) -> Result<(), ModelError> {
        let Some(parent) = slot.parent else {
            return Ok(());
        };
        let actual = self.object(parent)?.layer;
        if actual != slot.layer {
            return Err(ModelError::ParentLayerMismatch {
                parent,
                actual,
                requested: slot.layer,
            });
        }
        Ok(())
    }

    /// Unlinks and removes `id` with its descendants.
    pub(crate) fn remove_subtree(&mut self, id: ObjectId) -> Result<(Slot, Vec<CanvasObject>), ModelError> {
        let slot = self.slot_of(id)?;
        let subtree = self.snapshot_subtree(id)?;
        if let Some(parent) = slot.parent {
            self.mark_dirty(parent);
        }
        self.siblings_mut(slot.layer, slot.parent)?.remove(slot.index);
        for object in &subtree {
            self.objects.remove(&object.id);
        }
        Ok((slot, subtree))
    }

    /// Moves `id` (with its subtree) to `to`. `to.index` is interpreted
    /// after `id` has been unlinked from its current position.
    pub(crate) fn reparent(&mut self, id: ObjectId, to: Slot) -> Result<(), ModelError> {
        let from = self.slot_of(id)?;
        if let Some(new_parent) = to.parent {
            if self.is_ancestor_or_self(id, new_parent) {
                return Err(ModelError::CyclicGrouping {
                    group: new_parent,
                    member: id,
                });
            }
        }
        self.check_parent_layer(to)?;
        let target_len = self.sibling_count(to.layer, to.parent)?;
        let same_level = from.layer == to.layer && from.parent == to.parent;
        let max_index = if same_level { target_len - 1 } else { target_len };
        if to.index > max_index {
            return Err(ModelError::IndexOutOfRange {
                index: to.index,
                len: max_index,
            });
        }

        self.mark_dirty(id);
        self.siblings_mut(from.layer, from.parent)?.remove(from.index);
        self.siblings_mut(to.layer, to.parent)?.insert(to.index, id);
        for sid in self.subtree_ids(id) {
            if let Some(object) = self.objects.get_mut(&sid) {
                object.layer = to.layer;
            }
        }
        self.object_mut(id)?.parent = to.parent;
        self.mark_dirty(id);
        Ok(())
    }

    pub(crate) fn insert_layer(
        &mut self,
        index: usize,
        layer: &DocLayer,
        objects: &[CanvasObject],
    ) -> Result<(), ModelError> {
        if index > self.layers.len() {
            return Err(ModelError::IndexOutOfRange {
                index,
                len: self.layers.len(),
            });
        }
        self.layers.insert(index, layer.clone());
        for object in objects {
            object.mark_dirty();
            self.objects.insert(object.id, object.clone());
        }
        Ok(())
    }

    pub(crate) fn remove_layer(&mut self, index: usize) -> Result<(DocLayer, Vec<CanvasObject>), ModelError> {
        if index >= self.layers.len() {
            return Err(ModelError::IndexOutOfRange {
                index,
                len: self.layers.len(),
            });
        }
        let layer = self.layers.remove(index);
        let mut objects = Vec::new();
        for &top in &layer.objects {
            for sid in self.subtree_ids(top) {
                if let Some(object) = self.objects.remove(&sid) {
                    objects.push(object);
                }
            }
        }
        Ok((layer, objects))
    }

    pub(crate) fn move_layer(&mut self, from: usize, to: usize) -> Result<(), ModelError> {
        let len = self.layers.len();
        if from >= len || to >= len {
            return Err(ModelError::IndexOutOfRange {
                index: from.max(to),
                len,
            });
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        Ok(())
    }
}
