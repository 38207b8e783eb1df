use diagramkit_core::{ObjectId, Result, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{commit, patch_settings, rollback, Tool, ToolContext, ToolId};
use crate::input::{Key, MouseButton};
use crate::layer::ViewItem;
use crate::model::{CanvasObject, Stroke, StrokeStyle};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawStrokeSettings {
    pub style: StrokeStyle,
}

/// Modal stroke drawing.
///
/// Each left click appends a point. A double click or Enter finishes the
/// stroke as one undoable "Draw Stroke"; strokes with fewer than two
/// points are discarded.
#[derive(Debug, Default)]
pub struct DrawStrokeTool {
    settings: DrawStrokeSettings,
    stroke: Option<ObjectId>,
}

impl DrawStrokeTool {
    const TRANSACTION: &'static str = "Draw Stroke";

    fn finish(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        ctx.requests.stop = true;
        let Some(id) = self.stroke.take() else {
            return Ok(());
        };
        let points = ctx
            .document
            .object(id)
            .and_then(|o| o.as_stroke())
            .map_or(0, |s| s.len());
        if points < 2 {
            tracing::debug!("Discarding stroke with {} points", points);
            rollback(ctx);
            return Ok(());
        }
        commit(ctx, Self::TRANSACTION);
        ctx.selection.replace(ctx.document, &[id])?;
        Ok(())
    }

    fn preview(&self, ctx: &mut ToolContext<'_>) {
        let Some(stroke) = self
            .stroke
            .and_then(|id| ctx.document.object(id))
            .and_then(|o| o.as_stroke())
        else {
            return;
        };
        let mut points = stroke.points().to_vec();
        points.push(ctx.snap(ctx.event.doc_point));
        ctx.set_feedback(Some(ViewItem::Preview(points)));
    }
}

impl Tool for DrawStrokeTool {
    fn id(&self) -> ToolId {
        ToolId::DRAW_STROKE
    }

    fn start(&mut self, _ctx: &mut ToolContext<'_>) -> Result<()> {
        self.stroke = None;
        Ok(())
    }

    fn stop(&mut self, ctx: &mut ToolContext<'_>) {
        if self.stroke.is_some() {
            // Switched away mid-stroke: keep what was drawn if it is valid.
            if let Err(e) = self.finish(ctx) {
                tracing::warn!("Failed to finish stroke: {}", e);
            }
        }
        ctx.set_feedback(None);
    }

    fn mouse_down(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        if ctx.event.button != Some(MouseButton::Left) {
            return Ok(());
        }
        if ctx.event.double_click {
            return self.finish(ctx);
        }
        let p = ctx.snap(ctx.event.doc_point);
        match self.stroke {
            Some(id) => {
                ctx.document.add_point(id, p)?;
            }
            None => {
                ctx.document.start_transaction();
                let stroke = Stroke::with_points(vec![p], self.settings.style);
                let id = ctx
                    .document
                    .add_object(ctx.active_layer, CanvasObject::stroke("Stroke", stroke))?;
                tracing::debug!("Drawing {}", id);
                self.stroke = Some(id);
            }
        }
        self.preview(ctx);
        Ok(())
    }

    fn mouse_move(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        self.preview(ctx);
        Ok(())
    }

    fn key(&mut self, ctx: &mut ToolContext<'_>) -> Result<bool> {
        match ctx.event.key {
            Some(Key::Enter) => {
                self.finish(ctx)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) {
        self.stroke = None;
        rollback(ctx);
    }

    fn settings(&self) -> Value {
        serde_json::to_value(self.settings).unwrap_or(Value::Null)
    }

    fn update_settings(&mut self, patch: &Value) -> std::result::Result<(), ToolError> {
        self.settings = patch_settings(&self.id(), &self.settings, patch)?;
        Ok(())
    }
}
