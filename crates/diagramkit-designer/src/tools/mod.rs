//! Tool state machine and built-in tools.
//!
//! A tool interprets one gesture (a run of canonical input events) as model
//! operations. At most one tool is active per view. While none is, the
//! [`ToolManager`] tries the candidates registered for the current phase in
//! order and activates the first whose `can_start` says yes. An explicitly
//! assigned tool runs modally until it asks to stop.

mod draw_stroke;
mod manager;
mod move_tool;
mod pan;
mod resize;
mod rubber_band;
mod select;

pub use draw_stroke::{DrawStrokeSettings, DrawStrokeTool};
pub use manager::{DispatchPhase, ToolManager};
pub use move_tool::MoveTool;
pub use pan::PanTool;
pub use resize::ResizeTool;
pub use rubber_band::{RubberBandSettings, RubberBandTool};
pub use select::SelectTool;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

use diagramkit_core::{LayerId, ObjectId, Result, ToolError};
use diagramkit_settings::EditorConfig;

use crate::document::Document;
use crate::geometry::Point;
use crate::input::InputEvent;
use crate::layer::{LayerStack, PickParams, ViewItem};
use crate::selection_manager::{Handle, SelectionManager};
use crate::viewport::Viewport;

/// Stable symbolic tool identity used for registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolId(Cow<'static, str>);

impl ToolId {
    pub const SELECT: ToolId = ToolId(Cow::Borrowed("select"));
    pub const MOVE: ToolId = ToolId(Cow::Borrowed("move"));
    pub const RESIZE: ToolId = ToolId(Cow::Borrowed("resize"));
    pub const RUBBER_BAND: ToolId = ToolId(Cow::Borrowed("rubber-band"));
    pub const PAN: ToolId = ToolId(Cow::Borrowed("pan"));
    pub const DRAW_STROKE: ToolId = ToolId(Cow::Borrowed("draw-stroke"));

    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Side effects a tool asks the view to perform after the current step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolRequests {
    /// Deactivate the tool once the current hook returns.
    pub stop: bool,
    /// View-layer content changed; repaint the whole view.
    pub repaint: bool,
    /// An object was double-clicked.
    pub activated: Option<ObjectId>,
    /// The pointer rests near the viewport edge during a drag.
    pub autoscroll: bool,
}

/// Everything a tool may read or touch while handling one step.
pub struct ToolContext<'a> {
    pub document: &'a mut Document,
    pub selection: &'a mut SelectionManager,
    pub layers: &'a mut LayerStack,
    pub viewport: &'a mut Viewport,
    pub event: &'a InputEvent,
    /// First event of the current gesture.
    pub first: &'a InputEvent,
    pub config: &'a EditorConfig,
    /// Layer new objects go to.
    pub active_layer: LayerId,
    pub requests: &'a mut ToolRequests,
}

impl ToolContext<'_> {
    /// Picking slop converted to document units.
    pub fn pick_params(&self) -> PickParams {
        PickParams {
            tolerance: self
                .viewport
                .view_to_doc_distance(self.config.selection.pick_tolerance_px),
            selectable_only: true,
        }
    }

    /// Topmost selectable object under `p`.
    pub fn pick_top(&self, p: Point) -> Option<ObjectId> {
        self.layers.pick_top_at(self.document, p, self.pick_params())
    }

    /// Handle under `p`, using the handle's on-screen size.
    pub fn pick_handle(&self, p: Point) -> Option<Handle> {
        let radius_px = self.config.selection.handle_size_px / 2.0
            + self.config.selection.pick_tolerance_px;
        self.layers
            .pick_handle_at(p, self.viewport.view_to_doc_distance(radius_px))
    }

    /// `p` snapped to the grid when snapping is on.
    pub fn snap(&self, p: Point) -> Point {
        if self.config.grid.snap_enabled {
            self.layers.snap(p).unwrap_or(p)
        } else {
            p
        }
    }

    /// Replaces the tool feedback on the default view layer.
    pub fn set_feedback(&mut self, feedback: Option<ViewItem>) {
        self.layers.set_feedback(feedback);
        self.requests.repaint = true;
    }

    /// True when the pointer is inside the autoscroll band.
    pub fn near_edge(&self) -> bool {
        let margin = self.config.interaction.autoscroll_margin_px;
        let size = self.viewport.view_size();
        let p = self.event.view_point;
        p.x < margin || p.y < margin || p.x > size.width - margin || p.y > size.height - margin
    }
}

/// A gesture interpreter.
///
/// Mode-less tools are activated by the dispatcher and handle the
/// triggering event in `start`. Modal tools are assigned explicitly and
/// receive every event until they request `stop`.
pub trait Tool {
    fn id(&self) -> ToolId;

    /// Whether the tool wants the current event. Errors count as "no".
    fn can_start(&self, _ctx: &ToolContext<'_>) -> std::result::Result<bool, ToolError> {
        Ok(false)
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>) -> Result<()>;

    /// Deactivation hook. Work still open is kept.
    fn stop(&mut self, _ctx: &mut ToolContext<'_>) {}

    fn mouse_down(&mut self, _ctx: &mut ToolContext<'_>) -> Result<()> {
        Ok(())
    }

    fn mouse_move(&mut self, _ctx: &mut ToolContext<'_>) -> Result<()> {
        Ok(())
    }

    fn mouse_up(&mut self, _ctx: &mut ToolContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Returns whether the key was consumed.
    fn key(&mut self, _ctx: &mut ToolContext<'_>) -> Result<bool> {
        Ok(false)
    }

    /// Discards in-progress work. `stop` follows.
    fn cancel(&mut self, _ctx: &mut ToolContext<'_>) {}

    fn settings(&self) -> Value {
        Value::Null
    }

    fn update_settings(&mut self, _patch: &Value) -> std::result::Result<(), ToolError> {
        Err(ToolError::Hook {
            tool: self.id().to_string(),
            reason: "tool has no settings".to_string(),
        })
    }
}

/// Merges the keys of a JSON object `patch` into `current`.
pub(crate) fn patch_settings<T>(tool: &ToolId, current: &T, patch: &Value) -> std::result::Result<T, ToolError>
where
    T: Serialize + DeserializeOwned,
{
    let hook = |reason: String| ToolError::Hook {
        tool: tool.to_string(),
        reason,
    };
    let mut value = serde_json::to_value(current).map_err(|e| hook(e.to_string()))?;
    match (value.as_object_mut(), patch.as_object()) {
        (Some(target), Some(changes)) => {
            for (k, v) in changes {
                if !target.contains_key(k) {
                    return Err(hook(format!("unknown setting '{}'", k)));
                }
                target.insert(k.clone(), v.clone());
            }
        }
        _ => return Err(hook("settings patch must be an object".to_string())),
    }
    serde_json::from_value(value).map_err(|e| hook(e.to_string()))
}

/// Closes the transaction a tool opened, keeping its changes.
pub(crate) fn commit(ctx: &mut ToolContext<'_>, name: &str) {
    if ctx.document.history().in_transaction() {
        if let Err(e) = ctx.document.finish_transaction(name) {
            tracing::error!("Failed to commit '{}': {}", name, e);
        }
    }
}

/// Reverts the transaction a tool opened.
pub(crate) fn rollback(ctx: &mut ToolContext<'_>) {
    if ctx.document.history().in_transaction() {
        if let Err(e) = ctx.document.abort_transaction() {
            tracing::error!("Failed to roll back tool transaction: {}", e);
        }
    }
}

/// A manager with every built-in tool registered in its default lists.
pub fn builtin_tools() -> ToolManager {
    let mut manager = ToolManager::new();
    manager.register(Box::new(ResizeTool::default()), &[DispatchPhase::Down]);
    manager.register(Box::new(PanTool::default()), &[DispatchPhase::Down]);
    manager.register(Box::new(MoveTool::default()), &[DispatchPhase::Move]);
    manager.register(Box::new(RubberBandTool::default()), &[DispatchPhase::Move]);
    manager.register(Box::new(SelectTool), &[DispatchPhase::Up]);
    manager.register(Box::new(DrawStrokeTool::default()), &[]);
    manager
}
