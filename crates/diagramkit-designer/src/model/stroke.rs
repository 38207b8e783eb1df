//! Multi-point stroke geometry.
//!
//! A stroke is an insertion-ordered point sequence drawn either as an open
//! polyline or as a closed poly-Bezier. In Bezier style every three points
//! after the first form one cubic segment: `points[3k]` is the start,
//! `points[3k+1]`/`points[3k+2]` the controls and `points[3k+3]` the end.
//! Trailing points that do not complete a cubic are joined with lines.
//!
//! The mutators here are raw: they validate and mutate but record nothing.
//! Recorded, undoable edits go through [`crate::document::Document`].

use lyon::geom::{self, CubicBezierSegment};
use lyon::math::point;
use lyon::path::iterator::*;
use lyon::path::Path;
use serde::{Deserialize, Serialize};

use diagramkit_core::ModelError;

use crate::geometry::{self, Point, Rect};

/// Samples per cubic when measuring distance to a Bezier segment.
const BEZIER_SAMPLES: usize = 24;

/// How a stroke's points are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    /// Open polyline through every point.
    #[default]
    Straight,
    /// Closed poly-Bezier.
    Bezier,
}

/// Point sequence plus joining style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<Point>,
    style: StrokeStyle,
}

impl Stroke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(points: Vec<Point>, style: StrokeStyle) -> Self {
        Self { points, style }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub(crate) fn set_style(&mut self, style: StrokeStyle) -> StrokeStyle {
        std::mem::replace(&mut self.style, style)
    }

    /// Inserts at `index`; `index == len` appends.
    pub(crate) fn insert(&mut self, index: usize, p: Point) -> Result<(), ModelError> {
        if index > self.points.len() {
            return Err(ModelError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        self.points.insert(index, p);
        Ok(())
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<Point, ModelError> {
        self.check_index(index)?;
        Ok(self.points.remove(index))
    }

    /// Replaces one point, returning the previous value.
    pub(crate) fn set(&mut self, index: usize, p: Point) -> Result<Point, ModelError> {
        self.check_index(index)?;
        Ok(std::mem::replace(&mut self.points[index], p))
    }

    /// Replaces the whole sequence, returning the previous one.
    pub(crate) fn replace(&mut self, points: Vec<Point>) -> Vec<Point> {
        std::mem::replace(&mut self.points, points)
    }

    pub(crate) fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            *p = p.offset(dx, dy);
        }
    }

    pub fn check_index(&self, index: usize) -> Result<(), ModelError> {
        if index < self.points.len() {
            Ok(())
        } else {
            Err(ModelError::IndexOutOfRange {
                index,
                len: self.points.len(),
            })
        }
    }

    /// Min/max over all points. For Bezier style this is the bounds of the
    /// control-point hulls, which always contain the curve.
    pub fn bounds(&self) -> Option<Rect> {
        Rect::bounding(&self.points)
    }

    /// Number of cubic segments in Bezier style.
    pub fn cubic_count(&self) -> usize {
        self.points.len().saturating_sub(1) / 3
    }

    fn cubic(&self, k: usize) -> CubicBezierSegment<f64> {
        let p = &self.points[3 * k..3 * k + 4];
        CubicBezierSegment {
            from: geom::point(p[0].x, p[0].y),
            ctrl1: geom::point(p[1].x, p[1].y),
            ctrl2: geom::point(p[2].x, p[2].y),
            to: geom::point(p[3].x, p[3].y),
        }
    }

    /// Builds a lyon path for painters and fill tests.
    pub fn to_path(&self) -> Path {
        let mut builder = Path::builder();
        let Some(first) = self.points.first() else {
            return builder.build();
        };
        builder.begin(point(first.x as f32, first.y as f32));
        match self.style {
            StrokeStyle::Straight => {
                for p in &self.points[1..] {
                    builder.line_to(point(p.x as f32, p.y as f32));
                }
                builder.end(false);
            }
            StrokeStyle::Bezier => {
                let cubics = self.cubic_count();
                for k in 0..cubics {
                    let p = &self.points[3 * k + 1..3 * k + 4];
                    builder.cubic_bezier_to(
                        point(p[0].x as f32, p[0].y as f32),
                        point(p[1].x as f32, p[1].y as f32),
                        point(p[2].x as f32, p[2].y as f32),
                    );
                }
                for p in &self.points[3 * cubics + 1..] {
                    builder.line_to(point(p.x as f32, p.y as f32));
                }
                builder.end(true);
            }
        }
        builder.build()
    }

    /// Flattened outline as a polyline (closed implicitly in Bezier style).
    pub fn outline(&self, tolerance: f64) -> Vec<Point> {
        if self.style == StrokeStyle::Straight {
            return self.points.clone();
        }
        let mut outline = Vec::new();
        let path = self.to_path();
        for event in path.iter().flattened(tolerance.max(0.01) as f32) {
            match event {
                lyon::path::Event::Begin { at } => {
                    outline.push(Point::new(at.x as f64, at.y as f64));
                }
                lyon::path::Event::Line { to, .. } => {
                    outline.push(Point::new(to.x as f64, to.y as f64));
                }
                _ => {}
            }
        }
        outline
    }

    /// Hit test: fill area for Bezier style, distance to a segment otherwise.
    pub fn contains_point(&self, p: Point, tolerance: f64) -> bool {
        match self.style {
            StrokeStyle::Straight => self
                .nearest_segment(p)
                .is_some_and(|(_, distance)| distance <= tolerance)
                || (self.points.len() == 1 && self.points[0].distance_to(&p) <= tolerance),
            StrokeStyle::Bezier => {
                geometry::polygon_contains(&self.outline(0.1), p)
                    || self
                        .nearest_segment(p)
                        .is_some_and(|(_, distance)| distance <= tolerance)
            }
        }
    }

    /// Index and distance of the segment closest to `p`.
    ///
    /// Straight style: segment `i` joins points `i` and `i+1`. Bezier style:
    /// segment `k` is the k-th cubic, followed by the trailing lines and the
    /// closing line back to the first point.
    pub fn nearest_segment(&self, p: Point) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        let mut consider = |index: usize, distance: f64| {
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        };

        match self.style {
            StrokeStyle::Straight => {
                for (i, pair) in self.points.windows(2).enumerate() {
                    consider(i, geometry::distance_to_segment(p, pair[0], pair[1]));
                }
            }
            StrokeStyle::Bezier => {
                for (i, poly) in self.bezier_polyline_segments().iter().enumerate() {
                    let distance = poly
                        .windows(2)
                        .map(|w| geometry::distance_to_segment(p, w[0], w[1]))
                        .fold(f64::INFINITY, f64::min);
                    consider(i, distance);
                }
            }
        }
        best
    }

    /// First segment crossed by the line `a`-`b`, with the crossing point.
    pub fn segment_intersection(&self, a: Point, b: Point) -> Option<(usize, Point)> {
        match self.style {
            StrokeStyle::Straight => self
                .points
                .windows(2)
                .enumerate()
                .find_map(|(i, w)| geometry::segment_intersection(a, b, w[0], w[1]).map(|x| (i, x))),
            StrokeStyle::Bezier => self
                .bezier_polyline_segments()
                .into_iter()
                .enumerate()
                .find_map(|(i, poly)| {
                    poly.windows(2)
                        .find_map(|w| geometry::segment_intersection(a, b, w[0], w[1]))
                        .map(|x| (i, x))
                }),
        }
    }

    /// Every logical segment of a Bezier-style stroke as a sampled polyline.
    fn bezier_polyline_segments(&self) -> Vec<Vec<Point>> {
        let mut segments = Vec::new();
        if self.points.len() < 2 {
            return segments;
        }
        let cubics = self.cubic_count();
        for k in 0..cubics {
            let curve = self.cubic(k);
            let samples = (0..=BEZIER_SAMPLES)
                .map(|i| {
                    let s = curve.sample(i as f64 / BEZIER_SAMPLES as f64);
                    Point::new(s.x, s.y)
                })
                .collect();
            segments.push(samples);
        }
        for w in self.points[3 * cubics..].windows(2) {
            segments.push(vec![w[0], w[1]]);
        }
        if let (Some(last), Some(first)) = (self.points.last(), self.points.first()) {
            if last != first {
                segments.push(vec![*last, *first]);
            }
        }
        segments
    }
}
