//! Change records: the unit of notification, undo and redo.
//!
//! Every recorded mutation is described by a [`Change`] carrying enough
//! before/after state to apply it in either direction. Applying with
//! `undo = true` restores the prior state exactly; `undo = false` reapplies
//! it. Dispatch is an exhaustive match, so adding a variant without its
//! reverse rule does not compile.

use serde::{Deserialize, Serialize};
use std::fmt;

use diagramkit_core::{LayerId, ModelError, ObjectId};

use crate::document::{DocLayer, DocumentStore, ShapeState, Slot};
use crate::geometry::{Point, Rect};
use crate::model::{Capabilities, CanvasObject, Shape, StrokeStyle};

/// What a change record is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeTarget {
    Document,
    Layer(LayerId),
    Object(ObjectId),
}

/// One reversible mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Change {
    /// A point was inserted (or appended) into a stroke.
    PointInserted { index: usize, point: Point },
    PointRemoved { index: usize, point: Point },
    PointModified { index: usize, old: Point, new: Point },
    /// The whole point sequence was replaced.
    PointsReplaced { old: Vec<Point>, new: Vec<Point> },
    StrokeStyleChanged { old: StrokeStyle, new: StrokeStyle },
    /// The object and its subtree moved by a delta. The leaf geometry on
    /// both sides is kept so neither direction accumulates rounding.
    Translated {
        dx: f64,
        dy: f64,
        before: Vec<ShapeState>,
        after: Vec<ShapeState>,
    },
    BoxResized { old: Rect, new: Rect },
    CapabilitiesChanged { old: Capabilities, new: Capabilities },
    Renamed { old: String, new: String },
    /// A subtree (root first) was inserted at `slot`.
    ObjectInserted { slot: Slot, subtree: Vec<CanvasObject> },
    /// A subtree (root first) was removed from `slot`.
    ObjectRemoved { slot: Slot, subtree: Vec<CanvasObject> },
    /// The object moved between slots (z-order change or (un)grouping).
    Reparented { from: Slot, to: Slot },
    LayerInserted {
        index: usize,
        layer: DocLayer,
        objects: Vec<CanvasObject>,
    },
    LayerRemoved {
        index: usize,
        layer: DocLayer,
        objects: Vec<CanvasObject>,
    },
    LayerMoved { from: usize, to: usize },
}

impl Change {
    /// Stable hint name, used for logging and default transaction names.
    pub fn hint(&self) -> &'static str {
        match self {
            Change::PointInserted { .. } => "point-inserted",
            Change::PointRemoved { .. } => "point-removed",
            Change::PointModified { .. } => "point-modified",
            Change::PointsReplaced { .. } => "points-replaced",
            Change::StrokeStyleChanged { .. } => "stroke-style",
            Change::Translated { .. } => "translated",
            Change::BoxResized { .. } => "resized",
            Change::CapabilitiesChanged { .. } => "capabilities",
            Change::Renamed { .. } => "renamed",
            Change::ObjectInserted { .. } => "object-inserted",
            Change::ObjectRemoved { .. } => "object-removed",
            Change::Reparented { .. } => "reparented",
            Change::LayerInserted { .. } => "layer-inserted",
            Change::LayerRemoved { .. } => "layer-removed",
            Change::LayerMoved { .. } => "layer-moved",
        }
    }

    /// True for changes to the layer/object tree rather than to geometry.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Change::ObjectInserted { .. }
                | Change::ObjectRemoved { .. }
                | Change::Reparented { .. }
                | Change::LayerInserted { .. }
                | Change::LayerRemoved { .. }
                | Change::LayerMoved { .. }
        )
    }
}

/// A change plus its target and the repaint rectangles around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub target: ChangeTarget,
    pub change: Change,
    /// Bounds before the mutation, for invalidation.
    pub old_rect: Option<Rect>,
    /// Bounds after the mutation, for invalidation.
    pub new_rect: Option<Rect>,
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            ChangeTarget::Document => write!(f, "{} on document", self.change.hint()),
            ChangeTarget::Layer(id) => write!(f, "{} on {}", self.change.hint(), id),
            ChangeTarget::Object(id) => write!(f, "{} on {}", self.change.hint(), id),
        }
    }
}

/// Whether an event is observed before or after its mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangePhase {
    Changing,
    Changed,
}

/// Why a change is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOrigin {
    Edit,
    Undo,
    Redo,
    Rollback,
}

/// A change notification delivered to observers and the view outbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub phase: ChangePhase,
    pub origin: ChangeOrigin,
    pub record: ChangeRecord,
}

impl ChangeRecord {
    pub fn new(target: ChangeTarget, change: Change) -> Self {
        Self {
            target,
            change,
            old_rect: None,
            new_rect: None,
        }
    }

    /// Applies the record forward (`undo = false`) or in reverse.
    ///
    /// Fails without mutating when the store does not match the record.
    pub(crate) fn apply(&self, store: &mut DocumentStore, undo: bool) -> Result<(), ModelError> {
        match (&self.change, self.target) {
            (Change::PointInserted { index, point }, ChangeTarget::Object(id)) => {
                let stroke = stroke_mut(store, id)?;
                if undo {
                    stroke.remove(*index).map(|_| ())?;
                } else {
                    stroke.insert(*index, *point)?;
                }
                store.mark_dirty(id);
            }
            (Change::PointRemoved { index, point }, ChangeTarget::Object(id)) => {
                let stroke = stroke_mut(store, id)?;
                if undo {
                    stroke.insert(*index, *point)?;
                } else {
                    stroke.remove(*index).map(|_| ())?;
                }
                store.mark_dirty(id);
            }
            (Change::PointModified { index, old, new }, ChangeTarget::Object(id)) => {
                let stroke = stroke_mut(store, id)?;
                stroke.set(*index, if undo { *old } else { *new })?;
                store.mark_dirty(id);
            }
            (Change::PointsReplaced { old, new }, ChangeTarget::Object(id)) => {
                let stroke = stroke_mut(store, id)?;
                stroke.replace(if undo { old.clone() } else { new.clone() });
                store.mark_dirty(id);
            }
            (Change::StrokeStyleChanged { old, new }, ChangeTarget::Object(id)) => {
                let stroke = stroke_mut(store, id)?;
                stroke.set_style(if undo { *old } else { *new });
                store.mark_dirty(id);
            }
            (Change::Translated { before, after, .. }, ChangeTarget::Object(id)) => {
                store.restore_shapes(if undo { before } else { after })?;
                store.mark_dirty(id);
            }
            (Change::BoxResized { old, new }, ChangeTarget::Object(id)) => {
                match &mut store.object_mut(id)?.shape {
                    Shape::Rectangle(b) => b.rect = if undo { *old } else { *new },
                    _ => {
                        return Err(ModelError::WrongKind {
                            id,
                            expected: "rectangle",
                        })
                    }
                }
                store.mark_dirty(id);
            }
            (Change::CapabilitiesChanged { old, new }, ChangeTarget::Object(id)) => {
                store.object_mut(id)?.capabilities = if undo { *old } else { *new };
            }
            (Change::Renamed { old, new }, ChangeTarget::Object(id)) => {
                store.object_mut(id)?.name = if undo { old.clone() } else { new.clone() };
            }
            (Change::ObjectInserted { slot, subtree }, ChangeTarget::Object(id)) => {
                if undo {
                    store.remove_subtree(id)?;
                } else {
                    store.insert_subtree(*slot, subtree)?;
                }
            }
            (Change::ObjectRemoved { slot, subtree }, ChangeTarget::Object(id)) => {
                if undo {
                    store.insert_subtree(*slot, subtree)?;
                } else {
                    store.remove_subtree(id)?;
                }
            }
            (Change::Reparented { from, to }, ChangeTarget::Object(id)) => {
                store.reparent(id, if undo { *from } else { *to })?;
            }
            (Change::LayerInserted { index, layer, objects }, _) => {
                if undo {
                    store.remove_layer(*index)?;
                } else {
                    store.insert_layer(*index, layer, objects)?;
                }
            }
            (Change::LayerRemoved { index, layer, objects }, _) => {
                if undo {
                    store.insert_layer(*index, layer, objects)?;
                } else {
                    store.remove_layer(*index)?;
                }
            }
            (Change::LayerMoved { from, to }, _) => {
                if undo {
                    store.move_layer(*to, *from)?;
                } else {
                    store.move_layer(*from, *to)?;
                }
            }
            (change, target) => {
                tracing::error!("{} cannot target {:?}", change.hint(), target);
                return Err(ModelError::WrongKind {
                    id: ObjectId(0),
                    expected: "object target",
                });
            }
        }
        Ok(())
    }
}

fn stroke_mut(
    store: &mut DocumentStore,
    id: ObjectId,
) -> Result<&mut crate::model::Stroke, ModelError> {
    match &mut store.object_mut(id)?.shape {
        Shape::Stroke(s) => Ok(s),
        _ => Err(ModelError::WrongKind {
            id,
            expected: "stroke",
        }),
    }
}
