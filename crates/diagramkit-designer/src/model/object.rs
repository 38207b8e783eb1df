//! Canvas objects: identity, flags, tree links and shape payload.

use serde::{Deserialize, Serialize};
use std::cell::Cell;

use diagramkit_core::{LayerId, ObjectId};

use super::capabilities::Capabilities;
use super::stroke::Stroke;
use crate::geometry::{Point, Rect};

/// Geometry behavior every leaf shape provides.
pub trait CanvasShape {
    /// Recomputes bounds from geometry; `None` for shapes with no extent.
    fn compute_bounds(&self) -> Option<Rect>;

    /// Hit-test predicate in document space.
    fn hit_test(&self, p: Point, tolerance: f64) -> bool;

    /// Moves every coordinate by `(dx, dy)`.
    fn translate(&mut self, dx: f64, dy: f64);
}

/// Axis-aligned box shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    pub rect: Rect,
}

impl CanvasShape for BoxShape {
    fn compute_bounds(&self) -> Option<Rect> {
        Some(self.rect)
    }

    fn hit_test(&self, p: Point, tolerance: f64) -> bool {
        self.rect.inflate(tolerance).contains(p)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.rect = self.rect.translate(dx, dy);
    }
}

impl CanvasShape for Stroke {
    fn compute_bounds(&self) -> Option<Rect> {
        self.bounds()
    }

    fn hit_test(&self, p: Point, tolerance: f64) -> bool {
        self.contains_point(p, tolerance)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        Stroke::translate(self, dx, dy);
    }
}

/// Shape payload of a canvas object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(BoxShape),
    Stroke(Stroke),
    /// Children live in the document arena and are owned by the group.
    Group { children: Vec<ObjectId> },
}

impl Shape {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Rectangle(_) => "rectangle",
            Shape::Stroke(_) => "stroke",
            Shape::Group { .. } => "group",
        }
    }

    /// Leaf geometry, if this is not a group.
    pub fn leaf(&self) -> Option<&dyn CanvasShape> {
        match self {
            Shape::Rectangle(b) => Some(b),
            Shape::Stroke(s) => Some(s),
            Shape::Group { .. } => None,
        }
    }

    pub fn leaf_mut(&mut self) -> Option<&mut dyn CanvasShape> {
        match self {
            Shape::Rectangle(b) => Some(b),
            Shape::Stroke(s) => Some(s),
            Shape::Group { .. } => None,
        }
    }
}

/// An object on the canvas.
///
/// `parent` is a non-owning back reference; the parent group's `children`
/// list is the owning side. `layer` is the document layer the object's
/// top-level ancestor belongs to. Both are maintained by the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasObject {
    pub(crate) id: ObjectId,
    pub(crate) name: String,
    pub(crate) shape: Shape,
    pub(crate) capabilities: Capabilities,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) layer: LayerId,
    #[serde(skip)]
    pub(crate) bounds_cache: Cell<Option<Rect>>,
}

impl PartialEq for CanvasObject {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.shape == other.shape
            && self.capabilities == other.capabilities
            && self.parent == other.parent
            && self.layer == other.layer
    }
}

impl CanvasObject {
    /// Creates a detached object. The id and layer are assigned when the
    /// document adopts it.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            id: ObjectId(0),
            name: name.into(),
            shape,
            capabilities: Capabilities::default(),
            parent: None,
            layer: LayerId(0),
            bounds_cache: Cell::new(None),
        }
    }

    pub fn rectangle(name: impl Into<String>, rect: Rect) -> Self {
        Self::new(name, Shape::Rectangle(BoxShape { rect }))
    }

    /// A stroke. Strokes are reshapable through point handles rather than
    /// resizable through bounding handles.
    pub fn stroke(name: impl Into<String>, stroke: Stroke) -> Self {
        let mut object = Self::new(name, Shape::Stroke(stroke));
        object.capabilities = Capabilities::default().with_resizable(false);
        object
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn is_group(&self) -> bool {
        matches!(self.shape, Shape::Group { .. })
    }

    pub fn children(&self) -> &[ObjectId] {
        match &self.shape {
            Shape::Group { children } => children,
            _ => &[],
        }
    }

    pub fn as_stroke(&self) -> Option<&Stroke> {
        match &self.shape {
            Shape::Stroke(s) => Some(s),
            _ => None,
        }
    }

    /// Marks cached bounds stale; the next query recomputes them.
    pub(crate) fn mark_dirty(&self) {
        self.bounds_cache.set(None);
    }

    pub(crate) fn cached_bounds(&self) -> Option<Rect> {
        self.bounds_cache.get()
    }

    pub(crate) fn store_bounds(&self, bounds: Option<Rect>) {
        self.bounds_cache.set(bounds);
    }
}
