//! Drop-target behavior: accepting external object collections.

use diagramkit_core::{Error, ObjectId, Result};

use super::CanvasView;
use crate::geometry::{Point, Rect};
use crate::model::CanvasObject;

impl CanvasView {
    /// Whether a drop at `doc_point` is acceptable. Dropping onto a
    /// selected object that may not be copied is refused.
    pub fn can_drop_at(&self, doc_point: Point) -> bool {
        if !doc_point.is_finite() {
            return false;
        }
        match self.layers.pick_top_at(&self.document, doc_point, self.pick_params()) {
            Some(id) if self.selection.contains(id) => self
                .document
                .object(id)
                .is_some_and(|o| o.capabilities().copyable),
            _ => true,
        }
    }

    /// Inserts copies of `subtrees` (each root first) on the active layer,
    /// shifted so the collection's top-left lands on `doc_point`. Runs as
    /// one "Drop" unit and selects the new objects.
    pub fn accept_drop(&mut self, subtrees: Vec<Vec<CanvasObject>>, doc_point: Point) -> Result<Vec<ObjectId>> {
        if !self.can_drop_at(doc_point) {
            tracing::warn!("Drop rejected at {}", doc_point);
            return Err(Error::other(format!("drop rejected at {}", doc_point)));
        }
        if subtrees.is_empty() {
            return Ok(Vec::new());
        }
        let extent = subtrees
            .iter()
            .flatten()
            .filter_map(|o| o.shape.leaf().and_then(|s| s.compute_bounds()))
            .reduce(|a: Rect, b| a.union(&b));
        let (dx, dy) = extent
            .map(|r| (doc_point.x - r.x, doc_point.y - r.y))
            .unwrap_or((0.0, 0.0));

        let shifted: Vec<Vec<CanvasObject>> = subtrees
            .into_iter()
            .map(|subtree| {
                subtree
                    .into_iter()
                    .map(|mut object| {
                        if let Some(shape) = object.shape.leaf_mut() {
                            shape.translate(dx, dy);
                        }
                        object.mark_dirty();
                        object
                    })
                    .collect()
            })
            .collect();

        let layer = self.active_layer;
        self.step(|view| {
            let ids = view.document.transaction("Drop", |doc| {
                shifted
                    .into_iter()
                    .map(|subtree| doc.add_subtree(layer, subtree))
                    .collect::<Result<Vec<ObjectId>>>()
            })?;
            view.selection.replace(&view.document, &ids)?;
            tracing::info!("Dropped {} objects at {}", ids.len(), doc_point);
            Ok(ids)
        })
    }
}
