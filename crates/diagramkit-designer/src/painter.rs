//! Painter collaborator.
//!
//! The layer stack calls a [`Painter`] back to front and never for objects
//! whose bounds miss the clip. [`RasterPainter`] renders into a tiny-skia
//! pixmap; [`RecordingPainter`] only records the calls.

use diagramkit_core::{ObjectId, SurfaceError};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Stroke as SkStroke, Transform};

use crate::geometry::Rect;
use crate::layer::ViewItem;
use crate::model::{CanvasObject, Shape, StrokeStyle};
use crate::viewport::Viewport;

/// Renders objects given in document space.
pub trait Painter {
    /// Paints one leaf object. `bounds` is its current bounding box.
    fn paint_object(&mut self, object: &CanvasObject, bounds: Rect, clip: Rect) -> Result<(), SurfaceError>;

    /// Paints transient view-layer content (grids, handles, feedback).
    fn paint_view_item(&mut self, _item: &ViewItem, _clip: Rect) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// Records paint calls in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingPainter {
    pub objects: Vec<ObjectId>,
    pub view_items: Vec<ViewItem>,
}

impl Painter for RecordingPainter {
    fn paint_object(&mut self, object: &CanvasObject, _bounds: Rect, _clip: Rect) -> Result<(), SurfaceError> {
        self.objects.push(object.id());
        Ok(())
    }

    fn paint_view_item(&mut self, item: &ViewItem, _clip: Rect) -> Result<(), SurfaceError> {
        self.view_items.push(item.clone());
        Ok(())
    }
}

fn bg_color() -> Color {
    Color::from_rgba8(250, 250, 250, 255)
}
fn shape_color() -> Color {
    Color::from_rgba8(52, 152, 219, 255)
}
fn grid_color() -> Color {
    Color::from_rgba8(220, 220, 220, 255)
}
fn handle_color() -> Color {
    Color::from_rgba8(255, 152, 0, 255)
}

/// Anti-aliased raster painter over a tiny-skia pixmap.
pub struct RasterPainter {
    pixmap: Pixmap,
    transform: Transform,
    /// Document units per pixel, for hairline widths.
    pixel: f32,
    handle_size_px: f32,
}

impl RasterPainter {
    /// Allocates a surface matching the viewport.
    pub fn new(viewport: &Viewport, handle_size_px: f64) -> Result<Self, SurfaceError> {
        let size = viewport.view_size();
        let (width, height) = (size.width.ceil() as u32, size.height.ceil() as u32);
        let mut pixmap = Pixmap::new(width, height).ok_or(SurfaceError::Allocation { width, height })?;
        pixmap.fill(bg_color());

        let (sx, sy) = (viewport.scale_x() as f32, viewport.scale_y() as f32);
        let origin = viewport.origin();
        let transform = Transform::from_row(
            sx,
            0.0,
            0.0,
            sy,
            -(origin.x as f32) * sx,
            -(origin.y as f32) * sy,
        );
        Ok(Self {
            pixmap,
            transform,
            pixel: 1.0 / sx,
            handle_size_px: handle_size_px as f32,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn save_png(&self, path: &std::path::Path) -> Result<(), SurfaceError> {
        self.pixmap.save_png(path).map_err(|e| SurfaceError::Backend {
            reason: e.to_string(),
        })
    }

    fn hairline(&self, width_px: f32) -> SkStroke {
        SkStroke {
            width: width_px * self.pixel,
            ..Default::default()
        }
    }
}

fn paint_with(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

impl Painter for RasterPainter {
    fn paint_object(&mut self, object: &CanvasObject, _bounds: Rect, _clip: Rect) -> Result<(), SurfaceError> {
        let paint = paint_with(shape_color());
        let path = match object.shape() {
            Shape::Rectangle(b) => {
                let r = b.rect;
                tiny_skia::Rect::from_xywh(r.x as f32, r.y as f32, r.width as f32, r.height as f32)
                    .map(PathBuilder::from_rect)
            }
            Shape::Stroke(stroke) => {
                let outline = stroke.outline(0.25);
                let mut pb = PathBuilder::new();
                for (i, p) in outline.iter().enumerate() {
                    if i == 0 {
                        pb.move_to(p.x as f32, p.y as f32);
                    } else {
                        pb.line_to(p.x as f32, p.y as f32);
                    }
                }
                if stroke.style() == StrokeStyle::Bezier {
                    pb.close();
                }
                pb.finish()
            }
            Shape::Group { .. } => None,
        };
        // Degenerate geometry has no path; nothing to draw.
        if let Some(path) = path {
            let stroke = self.hairline(1.5);
            self.pixmap
                .stroke_path(&path, &paint, &stroke, self.transform, None);
        }
        Ok(())
    }

    fn paint_view_item(&mut self, item: &ViewItem, clip: Rect) -> Result<(), SurfaceError> {
        match item {
            ViewItem::Grid(grid) => {
                let (xs, ys) = grid.lines_in(&clip);
                let mut pb = PathBuilder::new();
                for x in xs {
                    pb.move_to(x as f32, clip.top() as f32);
                    pb.line_to(x as f32, clip.bottom() as f32);
                }
                for y in ys {
                    pb.move_to(clip.left() as f32, y as f32);
                    pb.line_to(clip.right() as f32, y as f32);
                }
                if let Some(path) = pb.finish() {
                    let stroke = self.hairline(1.0);
                    self.pixmap
                        .stroke_path(&path, &paint_with(grid_color()), &stroke, self.transform, None);
                }
            }
            ViewItem::Handle(handle) => {
                let half = self.handle_size_px * self.pixel / 2.0;
                let (x, y) = (handle.position.x as f32, handle.position.y as f32);
                if let Some(rect) = tiny_skia::Rect::from_xywh(x - half, y - half, half * 2.0, half * 2.0) {
                    self.pixmap
                        .fill_rect(rect, &paint_with(handle_color()), self.transform, None);
                }
            }
            ViewItem::Marquee(r) => {
                if let Some(rect) =
                    tiny_skia::Rect::from_xywh(r.x as f32, r.y as f32, r.width as f32, r.height as f32)
                {
                    let path = PathBuilder::from_rect(rect);
                    let stroke = self.hairline(1.0);
                    self.pixmap
                        .stroke_path(&path, &paint_with(handle_color()), &stroke, self.transform, None);
                }
            }
            ViewItem::Preview(points) => {
                let mut pb = PathBuilder::new();
                for (i, p) in points.iter().enumerate() {
                    if i == 0 {
                        pb.move_to(p.x as f32, p.y as f32);
                    } else {
                        pb.line_to(p.x as f32, p.y as f32);
                    }
                }
                if let Some(path) = pb.finish() {
                    let stroke = self.hairline(1.0);
                    self.pixmap
                        .stroke_path(&path, &paint_with(shape_color()), &stroke, self.transform, None);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::layer::LayerStack;

    #[test]
    fn test_raster_painter_draws_visible_rectangle() {
        let mut doc = Document::new("raster");
        let layer = doc.layers()[0].id();
        doc.add_object(layer, CanvasObject::rectangle("r", Rect::new(10.0, 10.0, 30.0, 20.0)))
            .unwrap();
        let mut stack = LayerStack::new();
        stack.sync_with_document(&doc);

        let viewport = Viewport::new(64.0, 64.0);
        let mut painter = RasterPainter::new(&viewport, 6.0).unwrap();
        let painted = stack
            .paint(&doc, &mut painter, viewport.visible_doc_rect())
            .unwrap();
        assert_eq!(painted, 1);

        let pixel = painter.pixmap().pixel(10, 20).unwrap();
        assert_ne!((pixel.red(), pixel.green(), pixel.blue()), (250, 250, 250));
    }

    #[test]
    fn test_zero_sized_surface_fails_allocation() {
        let viewport = Viewport::new(0.0, 0.0);
        assert!(matches!(
            RasterPainter::new(&viewport, 6.0),
            Err(SurfaceError::Allocation { .. })
        ));
    }
}
