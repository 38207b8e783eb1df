//! The document: object arena, document layers, undo history and the
//! change-notification outbox.
//!
//! Every public mutator validates first, then emits a `Changing` event,
//! applies a [`ChangeRecord`], emits `Changed`, and hands the record to the
//! [`UndoManager`]. A failed call leaves the document untouched.
//!
//! Events go two ways: synchronously to registered observers (which only
//! see the event, never the document, so they cannot re-enter it) and into
//! a FIFO outbox the view drains after each operation.

mod store;

pub use store::{DocLayer, ShapeState, Slot};
pub(crate) use store::DocumentStore;

use std::collections::{HashMap, VecDeque};
use std::fmt;

use diagramkit_core::{GeometryError, HistoryError, LayerId, ModelError, ObjectId, Result};

use crate::change::{Change, ChangeEvent, ChangeOrigin, ChangePhase, ChangeRecord, ChangeTarget};
use crate::geometry::{Point, Rect};
use crate::history::UndoManager;
use crate::model::{Capabilities, CanvasObject, Shape, StrokeStyle};

/// Handle returned by [`Document::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&ChangeEvent)>;

pub struct Document {
    name: String,
    pub(crate) store: DocumentStore,
    history: UndoManager,
    outbox: VecDeque<ChangeEvent>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    version: u64,
}

impl Document {
    /// A document with one empty layer and the default undo depth.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_history(name, UndoManager::new())
    }

    pub fn with_history(name: impl Into<String>, history: UndoManager) -> Self {
        let mut store = DocumentStore::default();
        let id = store.allocate_layer_id();
        store.layers.push(DocLayer::new(id, "Layer 1"));
        Self::from_parts(name.into(), store, history)
    }

    pub(crate) fn from_parts(name: String, store: DocumentStore, history: UndoManager) -> Self {
        Self {
            name,
            store,
            history,
            outbox: VecDeque::new(),
            observers: Vec::new(),
            next_observer: 0,
            version: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Incremented on every applied change, including undo and redo.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut UndoManager {
        &mut self.history
    }

    // ----------------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------------

    /// Document layers, bottom to top.
    pub fn layers(&self) -> &[DocLayer] {
        &self.store.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&DocLayer> {
        self.store.layer(id).ok()
    }

    pub fn object(&self, id: ObjectId) -> Option<&CanvasObject> {
        self.store.objects.get(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.store.objects.contains_key(&id)
    }

    pub fn object_count(&self) -> usize {
        self.store.objects.len()
    }

    /// Cached bounds; recomputed when the object is dirty.
    pub fn bounds(&self, id: ObjectId) -> Option<Rect> {
        self.store.bounds(id)
    }

    pub fn hit_test(&self, id: ObjectId, p: Point, tolerance: f64) -> bool {
        self.store.hit_test(id, p, tolerance)
    }

    pub fn top_level_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.store.top_level_of(id).ok()
    }

    pub fn slot_of(&self, id: ObjectId) -> Option<Slot> {
        self.store.slot_of(id).ok()
    }

    /// Every top-level object, back to front across layers.
    pub fn top_level_objects(&self) -> Vec<ObjectId> {
        self.store
            .layers
            .iter()
            .flat_map(|l| l.objects.iter().copied())
            .collect()
    }

    /// Union of all top-level bounds.
    pub fn extent(&self) -> Option<Rect> {
        self.top_level_objects()
            .into_iter()
            .filter_map(|id| self.bounds(id))
            .reduce(|a, b| a.union(&b))
    }

    /// Copies of `id` and its descendants, root first.
    pub fn snapshot_subtree(&self, id: ObjectId) -> Option<Vec<CanvasObject>> {
        self.store.snapshot_subtree(id).ok()
    }

    // ----------------------------------------------------------------------
    // Notifications
    // ----------------------------------------------------------------------

    /// Registers a synchronous observer for every change event.
    pub fn subscribe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.next_observer += 1;
        let id = ObserverId(self.next_observer);
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Removes and returns all queued events in emission order.
    pub fn drain_events(&mut self) -> Vec<ChangeEvent> {
        self.outbox.drain(..).collect()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.outbox.is_empty()
    }

    fn emit(&mut self, phase: ChangePhase, origin: ChangeOrigin, record: &ChangeRecord) {
        let event = ChangeEvent {
            phase,
            origin,
            record: record.clone(),
        };
        for (_, observer) in &mut self.observers {
            observer(&event);
        }
        self.outbox.push_back(event);
    }

    fn target_bounds(&self, target: ChangeTarget) -> Option<Rect> {
        match target {
            ChangeTarget::Object(id) => self.store.bounds(id),
            _ => None,
        }
    }

    /// Apply one new edit and record it.
    fn perform(&mut self, target: ChangeTarget, change: Change) -> Result<()> {
        if self.history.is_replaying() {
            return Err(HistoryError::ReentrantMutation {
                change: change.hint().to_string(),
            }
            .into());
        }
        let mut record = ChangeRecord::new(target, change);
        record.old_rect = self.target_bounds(target);
        self.emit(ChangePhase::Changing, ChangeOrigin::Edit, &record);
        record.apply(&mut self.store, false)?;
        record.new_rect = self.target_bounds(target);
        self.version += 1;
        tracing::debug!("Applied {}", record);
        self.emit(ChangePhase::Changed, ChangeOrigin::Edit, &record);
        self.history.record(record)?;
        Ok(())
    }

    /// Apply stored records in order, each in the given direction. On
    /// failure the already applied ones are put back and the error escalated.
    fn replay(&mut self, records: &[ChangeRecord], undo: bool, origin: ChangeOrigin) -> Result<()> {
        self.history.begin_replay(&format!("{:?}", origin));
        let mut applied = 0;
        let mut failure = None;
        for stored in records {
            let mut record = stored.clone();
            record.old_rect = self.target_bounds(record.target);
            self.emit(ChangePhase::Changing, origin, &record);
            if let Err(e) = record.apply(&mut self.store, undo) {
                failure = Some((record.to_string(), e));
                break;
            }
            record.new_rect = self.target_bounds(record.target);
            self.version += 1;
            self.emit(ChangePhase::Changed, origin, &record);
            applied += 1;
        }

        if let Some((change, e)) = failure {
            tracing::error!("{:?} failed at {}: {}", origin, change, e);
            // Listeners saw the applied records; they see the restore too.
            for stored in records[..applied].iter().rev() {
                let mut record = stored.clone();
                record.old_rect = self.target_bounds(record.target);
                self.emit(ChangePhase::Changing, ChangeOrigin::Rollback, &record);
                if let Err(restore) = record.apply(&mut self.store, !undo) {
                    tracing::error!("Could not restore {}: {}", record, restore);
                    continue;
                }
                record.new_rect = self.target_bounds(record.target);
                self.version += 1;
                self.emit(ChangePhase::Changed, ChangeOrigin::Rollback, &record);
            }
            self.history.end_replay();
            return Err(HistoryError::ApplyFailed {
                change,
                reason: e.to_string(),
            }
            .into());
        }
        self.history.end_replay();
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Transactions and history
    // ----------------------------------------------------------------------

    pub fn start_transaction(&mut self) {
        self.history.start();
    }

    /// Closes the innermost transaction; the outermost close commits.
    pub fn finish_transaction(&mut self, name: &str) -> Result<bool> {
        Ok(self.history.finish(name)?)
    }

    /// Reverts and discards everything recorded in the innermost transaction.
    pub fn abort_transaction(&mut self) -> Result<()> {
        let records = self.history.abort()?;
        if records.is_empty() {
            return Ok(());
        }
        tracing::info!("Rolling back {} changes", records.len());
        let reversed: Vec<ChangeRecord> = records.into_iter().rev().collect();
        self.replay(&reversed, true, ChangeOrigin::Rollback)
    }

    /// Runs `f` inside a transaction named `name`, aborting if it fails.
    pub fn transaction<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.start_transaction();
        match f(self) {
            Ok(value) => {
                self.finish_transaction(name)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.abort_transaction() {
                    tracing::error!("Rollback of '{}' failed: {}", name, rollback);
                }
                Err(e)
            }
        }
    }

    /// Undoes the most recent compound edit. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(edit) = self.history.peek_undo()?.cloned() else {
            return Ok(false);
        };
        let reversed: Vec<ChangeRecord> = edit.records.iter().rev().cloned().collect();
        self.replay(&reversed, true, ChangeOrigin::Undo)?;
        self.history.complete_undo();
        tracing::info!("Undo '{}'", edit.name);
        Ok(true)
    }

    /// Reapplies the most recently undone edit.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(edit) = self.history.peek_redo()?.cloned() else {
            return Ok(false);
        };
        self.replay(&edit.records, false, ChangeOrigin::Redo)?;
        self.history.complete_redo();
        tracing::info!("Redo '{}'", edit.name);
        Ok(true)
    }

    // ----------------------------------------------------------------------
    // Layers
    // ----------------------------------------------------------------------

    /// Adds an empty layer on top.
    pub fn add_layer(&mut self, name: impl Into<String>) -> Result<LayerId> {
        let index = self.store.layers.len();
        self.insert_layer(index, name)
    }

    pub fn insert_layer(&mut self, index: usize, name: impl Into<String>) -> Result<LayerId> {
        let len = self.store.layers.len();
        if index > len {
            return Err(ModelError::IndexOutOfRange { index, len }.into());
        }
        let id = self.store.allocate_layer_id();
        let layer = DocLayer::new(id, name);
        self.perform(
            ChangeTarget::Layer(id),
            Change::LayerInserted {
                index,
                layer,
                objects: Vec::new(),
            },
        )?;
        Ok(id)
    }

    /// Removes a layer and everything on it. The last layer cannot go.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<()> {
        let index = self.store.layer_index(id)?;
        if self.store.layers.len() == 1 {
            return Err(ModelError::LastLayer.into());
        }
        let layer = self.store.layers[index].clone();
        let objects = layer
            .objects
            .iter()
            .flat_map(|&top| self.store.subtree_ids(top))
            .filter_map(|oid| self.store.objects.get(&oid).cloned())
            .collect();
        self.perform(
            ChangeTarget::Layer(id),
            Change::LayerRemoved {
                index,
                layer,
                objects,
            },
        )
    }

    /// Moves a layer to `to` (index after removal).
    pub fn move_layer(&mut self, id: LayerId, to: usize) -> Result<()> {
        let from = self.store.layer_index(id)?;
        let len = self.store.layers.len();
        if to >= len {
            return Err(ModelError::IndexOutOfRange { index: to, len }.into());
        }
        if from == to {
            return Ok(());
        }
        self.perform(ChangeTarget::Layer(id), Change::LayerMoved { from, to })
    }

    // ----------------------------------------------------------------------
    // Objects
    // ----------------------------------------------------------------------

    /// Adds a leaf object (or empty group) on top of `layer`.
    pub fn add_object(&mut self, layer: LayerId, object: CanvasObject) -> Result<ObjectId> {
        self.add_subtree(layer, vec![object])
    }

    /// Adds a copy of a detached subtree (root first, children referenced
    /// by their ids within the slice) on top of `layer`. Fresh ids are
    /// assigned; the new root id is returned.
    pub fn add_subtree(&mut self, layer: LayerId, subtree: Vec<CanvasObject>) -> Result<ObjectId> {
        let index = self.store.layer(layer)?.objects.len();
        let slot = Slot {
            layer,
            parent: None,
            index,
        };
        let subtree = self.remap_subtree(subtree)?;
        let root = subtree[0].id;
        self.perform(
            ChangeTarget::Object(root),
            Change::ObjectInserted { slot, subtree },
        )?;
        Ok(root)
    }

    fn remap_subtree(&mut self, subtree: Vec<CanvasObject>) -> Result<Vec<CanvasObject>> {
        if subtree.is_empty() {
            return Err(ModelError::EmptyGroup.into());
        }
        for object in &subtree {
            for p in object.as_stroke().map(|s| s.points()).unwrap_or_default() {
                p.validate("stroke point")?;
            }
            if let Shape::Rectangle(b) = &object.shape {
                if !b.rect.is_finite() {
                    return Err(GeometryError::NonFinite {
                        context: "rectangle".to_string(),
                    }
                    .into());
                }
            }
        }
        let known: HashMap<ObjectId, usize> = subtree
            .iter()
            .enumerate()
            .map(|(i, o)| (o.id, i))
            .collect();
        for object in &subtree {
            if let Some(&missing) = object.children().iter().find(|&c| !known.contains_key(c)) {
                return Err(ModelError::UnknownObject { id: missing }.into());
            }
        }

        let mapping: HashMap<ObjectId, ObjectId> = subtree
            .iter()
            .map(|o| (o.id, self.store.allocate_object_id()))
            .collect();
        let mut out = Vec::with_capacity(subtree.len());
        for (i, mut object) in subtree.into_iter().enumerate() {
            object.id = mapping[&object.id];
            object.parent = if i == 0 {
                None
            } else {
                object.parent.and_then(|p| mapping.get(&p).copied())
            };
            if let Shape::Group { children } = &mut object.shape {
                for child in children.iter_mut() {
                    *child = mapping[&*child];
                }
            }
            out.push(object);
        }
        Ok(out)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Result<()> {
        let object = self.store.object(id)?;
        if !object.capabilities.deletable {
            return Err(ModelError::CapabilityDenied {
                id,
                capability: "deletable",
            }
            .into());
        }
        let slot = self.store.slot_of(id)?;
        let subtree = self.store.snapshot_subtree(id)?;
        self.perform(
            ChangeTarget::Object(id),
            Change::ObjectRemoved { slot, subtree },
        )
    }

    /// Moves the object to an arbitrary slot. Placing a group inside its
    /// own subtree is rejected.
    pub fn move_to(&mut self, id: ObjectId, to: Slot) -> Result<()> {
        let from = self.store.slot_of(id)?;
        if let Some(parent) = to.parent {
            if self.store.is_ancestor_or_self(id, parent) {
                return Err(ModelError::CyclicGrouping {
                    group: parent,
                    member: id,
                }
                .into());
            }
            if !self.store.object(parent)?.is_group() {
                return Err(ModelError::WrongKind {
                    id: parent,
                    expected: "group",
                }
                .into());
            }
            self.store.check_parent_layer(to)?;
        }
        let len = self.store.sibling_count(to.layer, to.parent)?;
        let same_level = from.layer == to.layer && from.parent == to.parent;
        let max = if same_level { len - 1 } else { len };
        if to.index > max {
            return Err(ModelError::IndexOutOfRange {
                index: to.index,
                len: max,
            }
            .into());
        }
        if from == to {
            return Ok(());
        }
        self.perform(ChangeTarget::Object(id), Change::Reparented { from, to })
    }

    /// Moves the object one step towards the front within its siblings.
    /// Returns `false` when it is already frontmost.
    pub fn raise(&mut self, id: ObjectId) -> Result<bool> {
        let slot = self.store.slot_of(id)?;
        let len = self.store.sibling_count(slot.layer, slot.parent)?;
        if slot.index + 1 >= len {
            return Ok(false);
        }
        self.move_to(
            id,
            Slot {
                index: slot.index + 1,
                ..slot
            },
        )?;
        Ok(true)
    }

    /// Moves the object one step towards the back within its siblings.
    pub fn lower(&mut self, id: ObjectId) -> Result<bool> {
        let slot = self.store.slot_of(id)?;
        if slot.index == 0 {
            return Ok(false);
        }
        self.move_to(
            id,
            Slot {
                index: slot.index - 1,
                ..slot
            },
        )?;
        Ok(true)
    }

    /// Groups top-level objects of one layer into a new group placed where
    /// the frontmost member was. Members keep their relative z-order.
    pub fn group(&mut self, ids: &[ObjectId]) -> Result<ObjectId> {
        let mut members: Vec<(usize, ObjectId)> = Vec::new();
        let mut layer = None;
        for &id in ids {
            let slot = self.store.slot_of(id)?;
            if slot.parent.is_some() {
                return Err(ModelError::NotTopLevel { id }.into());
            }
            match layer {
                None => layer = Some(slot.layer),
                Some(l) if l != slot.layer => {
                    return Err(ModelError::NotTopLevel { id }.into());
                }
                _ => {}
            }
            if !members.iter().any(|&(_, m)| m == id) {
                members.push((slot.index, id));
            }
        }
        let layer = layer.ok_or(ModelError::EmptyGroup)?;
        members.sort_by_key(|&(index, _)| index);

        self.transaction("Group", |doc| {
            let front = members.last().map(|&(i, _)| i).unwrap_or(0);
            let group = CanvasObject::new("Group", Shape::Group { children: Vec::new() })
                .with_capabilities(Capabilities::default().with_resizable(false).with_reshapable(false));
            let subtree = doc.remap_subtree(vec![group])?;
            let group_id = subtree[0].id;
            doc.perform(
                ChangeTarget::Object(group_id),
                Change::ObjectInserted {
                    slot: Slot {
                        layer,
                        parent: None,
                        index: front + 1,
                    },
                    subtree,
                },
            )?;
            for (k, &(_, id)) in members.iter().enumerate() {
                doc.move_to(
                    id,
                    Slot {
                        layer,
                        parent: Some(group_id),
                        index: k,
                    },
                )?;
            }
            Ok(group_id)
        })
    }

    /// Dissolves a group; its children take its place in order.
    pub fn ungroup(&mut self, group: ObjectId) -> Result<Vec<ObjectId>> {
        let object = self.store.object(group)?;
        if !object.is_group() {
            return Err(ModelError::WrongKind {
                id: group,
                expected: "group",
            }
            .into());
        }
        let children = object.children().to_vec();
        let slot = self.store.slot_of(group)?;

        self.transaction("Ungroup", |doc| {
            for (k, &child) in children.iter().enumerate() {
                doc.move_to(
                    child,
                    Slot {
                        layer: slot.layer,
                        parent: slot.parent,
                        index: slot.index + 1 + k,
                    },
                )?;
            }
            let slot = doc.store.slot_of(group)?;
            let subtree = doc.store.snapshot_subtree(group)?;
            doc.perform(
                ChangeTarget::Object(group),
                Change::ObjectRemoved { slot, subtree },
            )?;
            Ok(children.clone())
        })
    }

    // ----------------------------------------------------------------------
    // Generic object edits
    // ----------------------------------------------------------------------

    /// Moves an object (and its subtree) by a delta.
    pub fn translate(&mut self, id: ObjectId, dx: f64, dy: f64) -> Result<()> {
        let object = self.store.object(id)?;
        if !object.capabilities.movable {
            return Err(ModelError::CapabilityDenied {
                id,
                capability: "movable",
            }
            .into());
        }
        Point::new(dx, dy).validate("translation")?;
        if dx == 0.0 && dy == 0.0 {
            return Ok(());
        }
        let (before, after) = self.store.translated_shapes(id, dx, dy)?;
        self.perform(
            ChangeTarget::Object(id),
            Change::Translated {
                dx,
                dy,
                before,
                after,
            },
        )
    }

    /// Sets the extents of a resizable rectangle.
    pub fn set_bounds(&mut self, id: ObjectId, rect: Rect) -> Result<()> {
        let object = self.store.object(id)?;
        if !object.capabilities.resizable {
            return Err(ModelError::CapabilityDenied {
                id,
                capability: "resizable",
            }
            .into());
        }
        let Shape::Rectangle(b) = &object.shape else {
            return Err(ModelError::WrongKind {
                id,
                expected: "rectangle",
            }
            .into());
        };
        if !rect.is_finite() {
            return Err(GeometryError::NonFinite {
                context: "bounds".to_string(),
            }
            .into());
        }
        let old = b.rect;
        if old == rect {
            return Ok(());
        }
        self.perform(
            ChangeTarget::Object(id),
            Change::BoxResized { old, new: rect },
        )
    }

    pub fn set_capabilities(&mut self, id: ObjectId, capabilities: Capabilities) -> Result<()> {
        let old = self.store.object(id)?.capabilities;
        if old == capabilities {
            return Ok(());
        }
        self.perform(
            ChangeTarget::Object(id),
            Change::CapabilitiesChanged {
                old,
                new: capabilities,
            },
        )
    }

    pub fn rename(&mut self, id: ObjectId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let old = self.store.object(id)?.name.clone();
        if old == name {
            return Ok(());
        }
        self.perform(ChangeTarget::Object(id), Change::Renamed { old, new: name })
    }

    // ----------------------------------------------------------------------
    // Stroke edits
    // ----------------------------------------------------------------------

    fn reshapable_stroke(&self, id: ObjectId) -> Result<&crate::model::Stroke> {
        let object = self.store.object(id)?;
        let stroke = object.as_stroke().ok_or(ModelError::WrongKind {
            id,
            expected: "stroke",
        })?;
        if !object.capabilities.reshapable {
            return Err(ModelError::CapabilityDenied {
                id,
                capability: "reshapable",
            }
            .into());
        }
        Ok(stroke)
    }

    /// Appends a point; returns its index.
    pub fn add_point(&mut self, id: ObjectId, point: Point) -> Result<usize> {
        let index = self.reshapable_stroke(id)?.len();
        self.insert_point(id, index, point)?;
        Ok(index)
    }

    /// Inserts a point before `index` (`index == len` appends).
    pub fn insert_point(&mut self, id: ObjectId, index: usize, point: Point) -> Result<()> {
        let len = self.reshapable_stroke(id)?.len();
        point.validate("stroke point")?;
        if index > len {
            return Err(ModelError::IndexOutOfRange { index, len }.into());
        }
        self.perform(
            ChangeTarget::Object(id),
            Change::PointInserted { index, point },
        )
    }

    /// Removes and returns the point at `index`.
    pub fn remove_point(&mut self, id: ObjectId, index: usize) -> Result<Point> {
        let stroke = self.reshapable_stroke(id)?;
        stroke.check_index(index)?;
        let point = stroke.points()[index];
        self.perform(
            ChangeTarget::Object(id),
            Change::PointRemoved { index, point },
        )?;
        Ok(point)
    }

    /// Replaces the point at `index`; returns the previous value.
    pub fn set_point(&mut self, id: ObjectId, index: usize, point: Point) -> Result<Point> {
        let stroke = self.reshapable_stroke(id)?;
        stroke.check_index(index)?;
        point.validate("stroke point")?;
        let old = stroke.points()[index];
        if old != point {
            self.perform(
                ChangeTarget::Object(id),
                Change::PointModified {
                    index,
                    old,
                    new: point,
                },
            )?;
        }
        Ok(old)
    }

    /// Clears the stroke and replaces its points in one record.
    pub fn set_points(&mut self, id: ObjectId, points: Vec<Point>) -> Result<()> {
        let old = self.reshapable_stroke(id)?.points().to_vec();
        for p in &points {
            p.validate("stroke point")?;
        }
        if old == points {
            return Ok(());
        }
        self.perform(
            ChangeTarget::Object(id),
            Change::PointsReplaced { old, new: points },
        )
    }

    pub fn clear_points(&mut self, id: ObjectId) -> Result<()> {
        self.set_points(id, Vec::new())
    }

    pub fn set_stroke_style(&mut self, id: ObjectId, style: StrokeStyle) -> Result<()> {
        let old = self.reshapable_stroke(id)?.style();
        if old == style {
            return Ok(());
        }
        self.perform(
            ChangeTarget::Object(id),
            Change::StrokeStyleChanged { old, new: style },
        )
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("layers", &self.store.layers.len())
            .field("objects", &self.store.objects.len())
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
