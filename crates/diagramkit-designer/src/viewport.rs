//! Viewport and coordinate transformation for the canvas.
//!
//! Converts between view space (device pixels, origin at the viewport's
//! top-left, +Y down) and document space (logical coordinates independent of
//! scroll and zoom). The transform is:
//!
//! ```text
//! view = (doc - origin) * scale
//! doc  = view / scale + origin
//! ```
//!
//! `origin` is the document point shown at the viewport's top-left corner.
//! Horizontal and vertical scales are independent and clamped to a positive
//! range so the transform can never degenerate.

use std::fmt;

use diagramkit_core::{constants, GeometryError};
use diagramkit_settings::EditorConfig;

use crate::geometry::{Point, Rect, Size};

/// Scroll origin, scale and pixel size of the visible area.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    origin: Point,
    scale_x: f64,
    scale_y: f64,
    min_scale: f64,
    max_scale: f64,
    zoom_step: f64,
    view_size: Size,
    remembered_center: Point,
}

impl Viewport {
    /// Creates a viewport of the given pixel size at scale 1.0, origin (0,0).
    pub fn new(view_width: f64, view_height: f64) -> Self {
        let mut viewport = Self {
            origin: Point::ORIGIN,
            scale_x: 1.0,
            scale_y: 1.0,
            min_scale: constants::MIN_SCALE,
            max_scale: constants::MAX_SCALE,
            zoom_step: constants::ZOOM_STEP,
            view_size: Size::new(view_width.max(0.0), view_height.max(0.0)),
            remembered_center: Point::ORIGIN,
        };
        viewport.remember_center();
        viewport
    }

    /// Creates a viewport using the scale range, zoom step and origin from config.
    pub fn from_config(config: &EditorConfig, view_width: f64, view_height: f64) -> Self {
        let (min_scale, max_scale) = config.scale_range();
        let mut viewport = Self::new(view_width, view_height);
        viewport.min_scale = min_scale;
        viewport.max_scale = max_scale;
        viewport.zoom_step = config.viewport.zoom_step;
        let initial = 1.0_f64.clamp(min_scale, max_scale);
        viewport.scale_x = initial;
        viewport.scale_y = initial;
        viewport.origin = Point::new(config.viewport.origin_x, config.viewport.origin_y);
        viewport.remember_center();
        viewport
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Allowed `(min, max)` scale after the world-unit factor.
    pub fn scale_range(&self) -> (f64, f64) {
        (self.min_scale, self.max_scale)
    }

    pub fn view_size(&self) -> Size {
        self.view_size
    }

    /// Document point kept centered across view resizes.
    pub fn remembered_center(&self) -> Point {
        self.remembered_center
    }

    /// Sets the scroll origin. Returns `Ok(false)` when nothing changed.
    pub fn set_origin(&mut self, origin: Point) -> Result<bool, GeometryError> {
        origin.validate("viewport origin")?;
        if origin == self.origin {
            return Ok(false);
        }
        self.origin = origin;
        self.remember_center();
        Ok(true)
    }

    /// Sets both scales to the same value, clamped to the allowed range.
    pub fn set_scale(&mut self, scale: f64) -> Result<bool, GeometryError> {
        self.set_scales(scale, scale)
    }

    /// Sets the horizontal and vertical scales independently.
    ///
    /// Non-positive or non-finite values are rejected; others are clamped.
    /// Returns `Ok(false)` when the clamped values equal the current ones.
    pub fn set_scales(&mut self, scale_x: f64, scale_y: f64) -> Result<bool, GeometryError> {
        let scale_x = self.check_scale(scale_x)?;
        let scale_y = self.check_scale(scale_y)?;
        if scale_x == self.scale_x && scale_y == self.scale_y {
            return Ok(false);
        }
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self.remember_center();
        Ok(true)
    }

    /// Resizes the visible area, keeping the remembered center in the middle.
    pub fn set_view_size(&mut self, width: f64, height: f64) -> Result<bool, GeometryError> {
        let size = Size::checked(width, height)?;
        if size == self.view_size {
            return Ok(false);
        }
        self.view_size = size;
        let center = self.remembered_center;
        self.origin = Point::new(
            center.x - size.width / 2.0 / self.scale_x,
            center.y - size.height / 2.0 / self.scale_y,
        );
        Ok(true)
    }

    /// View point to document point.
    pub fn view_to_doc(&self, p: Point) -> Point {
        Point::new(
            p.x / self.scale_x + self.origin.x,
            p.y / self.scale_y + self.origin.y,
        )
    }

    /// Document point to view point, unrounded.
    pub fn doc_to_view(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.origin.x) * self.scale_x,
            (p.y - self.origin.y) * self.scale_y,
        )
    }

    /// Document point to the device pixel containing it.
    pub fn doc_to_view_pixel(&self, p: Point) -> Point {
        let v = self.doc_to_view(p);
        Point::new(v.x.floor(), v.y.floor())
    }

    pub fn view_to_doc_size(&self, s: Size) -> Size {
        Size::new(s.width / self.scale_x, s.height / self.scale_y)
    }

    /// Document size to view size, rounded up to whole pixels.
    pub fn doc_to_view_size(&self, s: Size) -> Size {
        Size::new(
            (s.width * self.scale_x).ceil(),
            (s.height * self.scale_y).ceil(),
        )
    }

    /// Converts a view distance to a document distance along x.
    pub fn view_to_doc_distance(&self, pixels: f64) -> f64 {
        pixels / self.scale_x
    }

    pub fn view_to_doc_rect(&self, r: Rect) -> Rect {
        let origin = self.view_to_doc(r.origin());
        let size = self.view_to_doc_size(r.size());
        Rect::new(origin.x, origin.y, size.width, size.height)
    }

    /// Document rectangle to the pixel rectangle fully covering it.
    ///
    /// The top-left is floored and the bottom-right ceiled, so mapping the
    /// result back always contains the requested document rectangle.
    pub fn doc_to_view_rect(&self, r: Rect) -> Rect {
        let left = ((r.left() - self.origin.x) * self.scale_x).floor();
        let top = ((r.top() - self.origin.y) * self.scale_y).floor();
        let right = ((r.right() - self.origin.x) * self.scale_x).ceil();
        let bottom = ((r.bottom() - self.origin.y) * self.scale_y).ceil();
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Document rectangle currently visible.
    pub fn visible_doc_rect(&self) -> Rect {
        self.view_to_doc_rect(Rect::new(
            0.0,
            0.0,
            self.view_size.width,
            self.view_size.height,
        ))
    }

    /// Scrolls by a pixel delta.
    pub fn scroll_by(&mut self, dx: f64, dy: f64) -> Result<bool, GeometryError> {
        self.set_origin(self.origin.offset(dx / self.scale_x, dy / self.scale_y))
    }

    /// Multiplies the scale by `factor`, keeping the document point under
    /// `view_point` fixed on screen.
    pub fn zoom_at(&mut self, view_point: Point, factor: f64) -> Result<bool, GeometryError> {
        view_point.validate("zoom anchor")?;
        if !(factor > 0.0) || !factor.is_finite() {
            return Err(GeometryError::NonPositiveScale { value: factor });
        }
        let anchor = self.view_to_doc(view_point);
        let scaled = self.set_scales(self.scale_x * factor, self.scale_y * factor)?;
        if !scaled {
            return Ok(false);
        }
        self.origin = Point::new(
            anchor.x - view_point.x / self.scale_x,
            anchor.y - view_point.y / self.scale_y,
        );
        self.remember_center();
        Ok(true)
    }

    /// Zooms in one step around the view center.
    pub fn zoom_in(&mut self) -> Result<bool, GeometryError> {
        self.zoom_at(self.view_center(), self.zoom_step)
    }

    /// Zooms out one step around the view center.
    pub fn zoom_out(&mut self) -> Result<bool, GeometryError> {
        self.zoom_at(self.view_center(), 1.0 / self.zoom_step)
    }

    pub fn zoom_step(&self) -> f64 {
        self.zoom_step
    }

    /// Scrolls so `doc_point` sits at the middle of the view.
    pub fn center_on(&mut self, doc_point: Point) -> Result<bool, GeometryError> {
        doc_point.validate("center point")?;
        self.set_origin(Point::new(
            doc_point.x - self.view_size.width / 2.0 / self.scale_x,
            doc_point.y - self.view_size.height / 2.0 / self.scale_y,
        ))
    }

    /// Fits `bounds` into the view with `padding` (fraction of each side)
    /// and centers it. Uses one uniform scale.
    ///
    /// An axis with zero extent does not constrain the scale, so a flat
    /// line is fitted along its length and a single point is only centered.
    pub fn fit_to_bounds(&mut self, bounds: Rect, padding: f64) -> Result<bool, GeometryError> {
        if !bounds.is_finite() {
            return Err(GeometryError::NonFinite {
                context: "fit bounds".to_string(),
            });
        }
        if bounds.width < 0.0 || bounds.height < 0.0 {
            return Err(GeometryError::NegativeSize {
                width: bounds.width,
                height: bounds.height,
            });
        }
        if self.view_size.width <= 0.0 || self.view_size.height <= 0.0 {
            return Ok(false);
        }
        let padding_factor = (1.0 - padding.clamp(0.0, 0.45) * 2.0).max(0.1);
        let zoom = |view: f64, extent: f64| {
            if extent > 0.0 {
                view * padding_factor / extent
            } else {
                f64::INFINITY
            }
        };
        let scale = zoom(self.view_size.width, bounds.width).min(zoom(self.view_size.height, bounds.height));

        let scaled = if scale.is_finite() { self.set_scale(scale)? } else { false };
        let centered = self.center_on(bounds.center())?;
        Ok(scaled || centered)
    }

    fn view_center(&self) -> Point {
        Point::new(self.view_size.width / 2.0, self.view_size.height / 2.0)
    }

    fn check_scale(&self, value: f64) -> Result<f64, GeometryError> {
        if !value.is_finite() {
            return Err(GeometryError::NonFinite {
                context: "scale".to_string(),
            });
        }
        if value <= 0.0 {
            return Err(GeometryError::NonPositiveScale { value });
        }
        Ok(value.clamp(self.min_scale, self.max_scale))
    }

    fn remember_center(&mut self) {
        self.remembered_center = self.view_to_doc(self.view_center());
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(constants::DEFAULT_VIEW_WIDTH, constants::DEFAULT_VIEW_HEIGHT)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Viewport(origin={}, scale={:.3}x{:.3}, size={}x{})",
            self.origin, self.scale_x, self.scale_y, self.view_size.width, self.view_size.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_at_scale() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.set_origin(Point::new(100.0, -50.0)).unwrap();
        vp.set_scale(2.0).unwrap();

        let doc = vp.view_to_doc(Point::new(40.0, 60.0));
        assert_eq!(doc, Point::new(120.0, -20.0));
        assert_eq!(vp.doc_to_view(doc), Point::new(40.0, 60.0));
    }

    #[test]
    fn test_scale_is_clamped_and_validated() {
        let mut vp = Viewport::default();
        assert!(vp.set_scale(100.0).unwrap());
        assert_eq!(vp.scale_x(), constants::MAX_SCALE);
        assert!(!vp.set_scale(50.0).unwrap());

        assert_eq!(
            vp.set_scale(0.0),
            Err(GeometryError::NonPositiveScale { value: 0.0 })
        );
        assert_eq!(vp.scale_x(), constants::MAX_SCALE);
    }

    #[test]
    fn test_setting_same_value_reports_no_change() {
        let mut vp = Viewport::default();
        assert!(!vp.set_origin(Point::ORIGIN).unwrap());
        assert!(!vp.set_scale(1.0).unwrap());
        assert!(vp.set_origin(Point::new(1.0, 1.0)).unwrap());
    }

    #[test]
    fn test_doc_to_view_rect_covers_request() {
        let mut vp = Viewport::new(100.0, 100.0);
        vp.set_scale(3.0).unwrap();
        let doc = Rect::new(0.1, 0.2, 1.05, 2.3);
        let view = vp.doc_to_view_rect(doc);
        assert_eq!(view.x, view.x.floor());
        assert_eq!(view.width, view.width.round());
        assert!(vp.view_to_doc_rect(view).contains_rect(&doc));
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut vp = Viewport::new(800.0, 600.0);
        let anchor = Point::new(200.0, 150.0);
        let before = vp.view_to_doc(anchor);
        assert!(vp.zoom_at(anchor, 2.0).unwrap());
        let after = vp.view_to_doc(anchor);
        assert!(before.distance_to(&after) < 1e-9);
    }

    #[test]
    fn test_resize_keeps_remembered_center() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.center_on(Point::new(50.0, 50.0)).unwrap();
        assert_eq!(vp.remembered_center(), Point::new(50.0, 50.0));

        vp.set_view_size(400.0, 200.0).unwrap();
        let center = vp.view_to_doc(Point::new(200.0, 100.0));
        assert!(center.distance_to(&Point::new(50.0, 50.0)) < 1e-9);
    }

    #[test]
    fn test_fit_to_bounds() {
        let mut vp = Viewport::new(200.0, 100.0);
        vp.fit_to_bounds(Rect::new(0.0, 0.0, 100.0, 100.0), 0.0)
            .unwrap();
        assert_eq!(vp.scale_x(), 1.0);
        let visible = vp.visible_doc_rect();
        assert_eq!(visible.center(), Point::new(50.0, 50.0));
    }
}
