//! Per-view layer stack: document layer references bracketed by view-owned
//! layers.
//!
//! Stack order, bottom to top, is background view layers, then the
//! document's layers in document order, then foreground view layers. The
//! topmost foreground layer is the default layer that carries selection
//! handles and tool feedback. Painting walks the stack forward; picking
//! walks it in reverse, so the first object picked is the last one painted.

use std::collections::HashMap;

use diagramkit_core::{LayerId, ObjectId, SurfaceError};
use diagramkit_settings::GridSettings;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::geometry::{Point, Rect};
use crate::model::{CanvasObject, Shape};
use crate::painter::Painter;
use crate::selection_manager::Handle;

/// View layer ids live above this value so they never collide with
/// document layer ids.
const VIEW_LAYER_BASE: u64 = 1 << 48;

const MAX_GRID_LINES: i64 = 4096;

/// Background grid with snapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub origin: Point,
    pub cell_width: f64,
    pub cell_height: f64,
    pub snap_enabled: bool,
}

impl Grid {
    pub fn new(cell_width: f64, cell_height: f64) -> Self {
        Self {
            origin: Point::ORIGIN,
            cell_width,
            cell_height,
            snap_enabled: true,
        }
    }

    pub fn from_settings(settings: &GridSettings) -> Self {
        Self {
            snap_enabled: settings.snap_enabled,
            ..Self::new(settings.cell_width, settings.cell_height)
        }
    }

    /// Nearest grid intersection to `p`.
    pub fn snap(&self, p: Point) -> Point {
        let snap_axis = |v: f64, origin: f64, cell: f64| {
            if cell > 0.0 {
                origin + ((v - origin) / cell).round() * cell
            } else {
                v
            }
        };
        Point::new(
            snap_axis(p.x, self.origin.x, self.cell_width),
            snap_axis(p.y, self.origin.y, self.cell_height),
        )
    }

    /// Grid lines crossing `clip`, as (vertical x positions, horizontal y positions).
    pub fn lines_in(&self, clip: &Rect) -> (Vec<f64>, Vec<f64>) {
        let lines = |from: f64, to: f64, origin: f64, cell: f64| {
            if cell <= 0.0 {
                return Vec::new();
            }
            let first = ((from - origin) / cell).ceil() as i64;
            let last = ((to - origin) / cell).floor() as i64;
            // Too dense to be useful at this zoom.
            if last - first > MAX_GRID_LINES {
                return Vec::new();
            }
            (first..=last).map(|k| origin + k as f64 * cell).collect()
        };
        (
            lines(clip.left(), clip.right(), self.origin.x, self.cell_width),
            lines(clip.top(), clip.bottom(), self.origin.y, self.cell_height),
        )
    }
}

/// Transient content of a view layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewItem {
    Grid(Grid),
    Handle(Handle),
    /// Rubber-band rectangle in document space.
    Marquee(Rect),
    /// In-progress polyline, e.g. a stroke being drawn.
    Preview(Vec<Point>),
}

/// A view-owned layer. Never serialized, never undoable.
#[derive(Debug, Clone)]
pub struct ViewLayer {
    id: LayerId,
    name: String,
    pub visible: bool,
    pub pickable: bool,
    pub items: Vec<ViewItem>,
}

impl ViewLayer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grids(&self) -> impl Iterator<Item = &Grid> {
        self.items.iter().filter_map(|item| match item {
            ViewItem::Grid(g) => Some(g),
            _ => None,
        })
    }
}

/// One entry of the stack in paint order.
#[derive(Debug, Clone, Copy)]
pub enum StackEntry<'a> {
    View(&'a ViewLayer),
    Document(LayerId),
}

/// Inclusion policy for rectangle picking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PickStyle {
    /// The object's bounds must lie entirely inside the rectangle.
    #[default]
    Contained,
    /// The object's bounds must intersect the rectangle.
    Intersects,
}

/// Point-picking options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickParams {
    /// Slop around thin geometry, in document units.
    pub tolerance: f64,
    pub selectable_only: bool,
}

impl Default for PickParams {
    fn default() -> Self {
        Self {
            tolerance: 0.0,
            selectable_only: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LayerFlags {
    hidden: bool,
    unpickable: bool,
}

#[derive(Debug, Clone)]
pub struct LayerStack {
    background: Vec<ViewLayer>,
    document: Vec<LayerId>,
    /// Never empty; the last entry is the default layer.
    foreground: Vec<ViewLayer>,
    /// View-side visibility/pickability overrides for document layers.
    overrides: HashMap<LayerId, LayerFlags>,
    next_view_layer: u64,
}

impl LayerStack {
    /// A stack with only the default view layer.
    pub fn new() -> Self {
        let mut stack = Self {
            background: Vec::new(),
            document: Vec::new(),
            foreground: Vec::new(),
            overrides: HashMap::new(),
            next_view_layer: VIEW_LAYER_BASE,
        };
        let layer = stack.make_view_layer("default");
        stack.foreground.push(layer);
        stack
    }

    /// A stack with a background grid below the document layers.
    pub fn with_grid(grid: Grid, visible: bool) -> Self {
        let mut stack = Self::new();
        let id = stack.add_background("grid");
        if let Some(layer) = stack.view_layer_mut(id) {
            layer.visible = visible;
            layer.pickable = false;
            layer.items.push(ViewItem::Grid(grid));
        }
        stack
    }

    fn make_view_layer(&mut self, name: &str) -> ViewLayer {
        self.next_view_layer += 1;
        ViewLayer {
            id: LayerId(self.next_view_layer),
            name: name.to_string(),
            visible: true,
            pickable: true,
            items: Vec::new(),
        }
    }

    /// Adds a view layer on top of the background group.
    pub fn add_background(&mut self, name: &str) -> LayerId {
        let layer = self.make_view_layer(name);
        let id = layer.id;
        self.background.push(layer);
        id
    }

    /// Adds a view layer above the document layers, below the default layer.
    pub fn add_foreground(&mut self, name: &str) -> LayerId {
        let layer = self.make_view_layer(name);
        let id = layer.id;
        let at = self.foreground.len() - 1;
        self.foreground.insert(at, layer);
        id
    }

    pub fn remove_view_layer(&mut self, id: LayerId) -> bool {
        if id == self.default_layer().id {
            return false;
        }
        let before = self.background.len() + self.foreground.len();
        self.background.retain(|l| l.id != id);
        self.foreground.retain(|l| l.id != id);
        before != self.background.len() + self.foreground.len()
    }

    pub fn default_layer(&self) -> &ViewLayer {
        &self.foreground[self.foreground.len() - 1]
    }

    pub fn default_layer_mut(&mut self) -> &mut ViewLayer {
        let last = self.foreground.len() - 1;
        &mut self.foreground[last]
    }

    pub fn view_layer(&self, id: LayerId) -> Option<&ViewLayer> {
        self.background
            .iter()
            .chain(self.foreground.iter())
            .find(|l| l.id == id)
    }

    pub fn view_layer_mut(&mut self, id: LayerId) -> Option<&mut ViewLayer> {
        self.background
            .iter_mut()
            .chain(self.foreground.iter_mut())
            .find(|l| l.id == id)
    }

    /// Document layer ids as currently mirrored.
    pub fn document_layers(&self) -> &[LayerId] {
        &self.document
    }

    /// Re-mirrors the document's layer order. Returns whether it changed.
    pub fn sync_with_document(&mut self, doc: &Document) -> bool {
        let layers: Vec<LayerId> = doc.layers().iter().map(|l| l.id()).collect();
        if layers == self.document {
            return false;
        }
        self.overrides.retain(|id, _| layers.contains(id));
        tracing::debug!("Layer stack resynchronized: {} document layers", layers.len());
        self.document = layers;
        true
    }

    /// Entries bottom to top.
    pub fn entries(&self) -> Vec<StackEntry<'_>> {
        self.background
            .iter()
            .map(StackEntry::View)
            .chain(self.document.iter().map(|&id| StackEntry::Document(id)))
            .chain(self.foreground.iter().map(StackEntry::View))
            .collect()
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) {
        if let Some(layer) = self.view_layer_mut(id) {
            layer.visible = visible;
        } else {
            self.overrides.entry(id).or_default().hidden = !visible;
        }
    }

    pub fn set_layer_pickable(&mut self, id: LayerId, pickable: bool) {
        if let Some(layer) = self.view_layer_mut(id) {
            layer.pickable = pickable;
        } else {
            self.overrides.entry(id).or_default().unpickable = !pickable;
        }
    }

    fn document_layer_visible(&self, doc: &Document, id: LayerId) -> bool {
        let flags = self.overrides.get(&id).copied().unwrap_or_default();
        !flags.hidden && doc.layer(id).is_some_and(|l| l.is_visible())
    }

    fn document_layer_pickable(&self, doc: &Document, id: LayerId) -> bool {
        let flags = self.overrides.get(&id).copied().unwrap_or_default();
        !flags.unpickable
            && self.document_layer_visible(doc, id)
            && doc.layer(id).is_some_and(|l| l.is_pickable())
    }

    /// Top-level objects of pickable document layers, front to back.
    fn pickable_objects<'a>(&'a self, doc: &'a Document) -> impl Iterator<Item = &'a CanvasObject> + 'a {
        self.document
            .iter()
            .rev()
            .filter(move |&&id| self.document_layer_pickable(doc, id))
            .filter_map(move |&id| doc.layer(id))
            .flat_map(move |layer| layer.objects().iter().rev())
            .filter_map(move |&oid| doc.object(oid))
    }

    /// Topmost object whose geometry contains `p`.
    pub fn pick_top_at(&self, doc: &Document, p: Point, params: PickParams) -> Option<ObjectId> {
        self.pick_all_at(doc, p, params, 1).into_iter().next()
    }

    /// Up to `limit` objects containing `p`, topmost first.
    pub fn pick_all_at(&self, doc: &Document, p: Point, params: PickParams, limit: usize) -> Vec<ObjectId> {
        self.pickable_objects(doc)
            .filter(|o| !params.selectable_only || o.capabilities().selectable)
            .filter(|o| doc.hit_test(o.id(), p, params.tolerance))
            .map(|o| o.id())
            .take(limit)
            .collect()
    }

    /// Objects selected by a rectangle, topmost first.
    pub fn pick_in_rectangle(
        &self,
        doc: &Document,
        rect: Rect,
        style: PickStyle,
        selectable_only: bool,
    ) -> Vec<ObjectId> {
        self.pickable_objects(doc)
            .filter(|o| !selectable_only || o.capabilities().selectable)
            .filter(|o| o.capabilities().visible)
            .filter(|o| {
                doc.bounds(o.id()).is_some_and(|b| match style {
                    PickStyle::Contained => rect.contains_rect(&b),
                    PickStyle::Intersects => rect.intersects(&b),
                })
            })
            .map(|o| o.id())
            .collect()
    }

    /// Topmost handle within `radius` (document units) of `p`.
    pub fn pick_handle_at(&self, p: Point, radius: f64) -> Option<Handle> {
        self.foreground
            .iter()
            .rev()
            .filter(|l| l.visible && l.pickable)
            .flat_map(|l| l.items.iter().rev())
            .find_map(|item| match item {
                ViewItem::Handle(h)
                    if (h.position.x - p.x).abs() <= radius && (h.position.y - p.y).abs() <= radius =>
                {
                    Some(*h)
                }
                _ => None,
            })
    }

    /// Replaces the handles shown on the default layer.
    pub fn set_handles(&mut self, handles: Vec<Handle>) {
        let layer = self.default_layer_mut();
        layer.items.retain(|i| !matches!(i, ViewItem::Handle(_)));
        layer.items.extend(handles.into_iter().map(ViewItem::Handle));
    }

    /// Replaces the tool feedback shown on the default layer.
    pub fn set_feedback(&mut self, feedback: Option<ViewItem>) {
        let layer = self.default_layer_mut();
        layer
            .items
            .retain(|i| !matches!(i, ViewItem::Marquee(_) | ViewItem::Preview(_)));
        layer.items.extend(feedback);
    }

    /// Snaps `p` to the nearest point offered by any snapping grid.
    ///
    /// Grids are searched front to back; on equal distance the topmost grid
    /// wins. `None` when no grid snaps.
    pub fn snap(&self, p: Point) -> Option<Point> {
        let mut best: Option<(f64, Point)> = None;
        let grids = self
            .foreground
            .iter()
            .rev()
            .chain(self.background.iter().rev())
            .filter(|l| l.visible)
            .flat_map(|l| l.grids())
            .filter(|g| g.snap_enabled);
        for grid in grids {
            let snapped = grid.snap(p);
            let d = snapped.distance_to(&p);
            if best.map_or(true, |(best_d, _)| d < best_d) {
                best = Some((d, snapped));
            }
        }
        best.map(|(_, p)| p)
    }

    /// Paints the stack back to front. Objects whose bounds miss `clip`
    /// are skipped. Returns the number of leaf objects painted.
    pub fn paint(&self, doc: &Document, painter: &mut dyn Painter, clip: Rect) -> Result<usize, SurfaceError> {
        let mut painted = 0;
        for entry in self.entries() {
            match entry {
                StackEntry::View(layer) => {
                    if !layer.visible {
                        continue;
                    }
                    for item in &layer.items {
                        painter.paint_view_item(item, clip)?;
                    }
                }
                StackEntry::Document(id) => {
                    if !self.document_layer_visible(doc, id) {
                        continue;
                    }
                    let Some(layer) = doc.layer(id) else {
                        continue;
                    };
                    for &oid in layer.objects() {
                        painted += paint_object(doc, oid, painter, clip)?;
                    }
                }
            }
        }
        Ok(painted)
    }
}

fn paint_object(doc: &Document, id: ObjectId, painter: &mut dyn Painter, clip: Rect) -> Result<usize, SurfaceError> {
    let Some(object) = doc.object(id) else {
        return Ok(0);
    };
    if !object.capabilities().visible {
        return Ok(0);
    }
    let Some(bounds) = doc.bounds(id) else {
        return Ok(0);
    };
    if !bounds.intersects(&clip) {
        return Ok(0);
    }
    match object.shape() {
        Shape::Group { children } => {
            let mut painted = 0;
            for &child in children {
                painted += paint_object(doc, child, painter, clip)?;
            }
            Ok(painted)
        }
        _ => {
            painter.paint_object(object, bounds, clip)?;
            Ok(1)
        }
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}
