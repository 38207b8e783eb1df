//! Shared default values.
//!
//! Settings fall back to these when a config file omits a field, and the
//! designer uses them when it is built without a config.

/// Smallest allowed view scale, before the world-unit factor is applied.
pub const MIN_SCALE: f64 = 0.01;

/// Largest allowed view scale, before the world-unit factor is applied.
pub const MAX_SCALE: f64 = 10.0;

/// Multiplier applied per zoom-in/zoom-out step.
pub const ZOOM_STEP: f64 = 1.2;

/// Side length of a selection handle, in view pixels.
pub const HANDLE_SIZE_PX: f64 = 6.0;

/// Hit-test slop around thin geometry, in view pixels.
pub const PICK_TOLERANCE_PX: f64 = 2.0;

/// Distance the pointer must travel before a press becomes a drag, in view pixels.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;

/// Distance from the viewport edge that triggers autoscroll, in view pixels.
pub const AUTOSCROLL_MARGIN_PX: f64 = 16.0;

/// Delay between autoscroll steps.
pub const AUTOSCROLL_DELAY_MS: u64 = 50;

/// Hover dwell time before a hover notification fires.
pub const HOVER_DELAY_MS: u64 = 1000;

/// Default upper bound on selected objects.
pub const MAX_SELECTION_COUNT: usize = 999_999;

/// Default number of compound edits kept on the undo stack.
pub const MAX_UNDO_DEPTH: usize = 100;

/// Default grid cell size in document units.
pub const GRID_CELL: f64 = 10.0;

/// Default viewport size used before the host reports a real one.
pub const DEFAULT_VIEW_WIDTH: f64 = 800.0;
pub const DEFAULT_VIEW_HEIGHT: f64 = 600.0;
