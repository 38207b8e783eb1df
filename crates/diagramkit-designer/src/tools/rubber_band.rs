use diagramkit_core::{Result, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{patch_settings, Tool, ToolContext, ToolId};
use crate::geometry::Rect;
use crate::layer::{PickStyle, ViewItem};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RubberBandSettings {
    /// Policy without modifiers; Alt selects the other one.
    pub style: PickStyle,
}

/// Marquee selection, tried on mouse-move when a drag starts over empty
/// space. Shift adds to the selection instead of replacing it.
#[derive(Debug, Default)]
pub struct RubberBandTool {
    settings: RubberBandSettings,
}

impl RubberBandTool {
    fn marquee(ctx: &ToolContext<'_>) -> Rect {
        Rect::from_points(ctx.first.doc_point, ctx.event.doc_point)
    }

    fn style(&self, ctx: &ToolContext<'_>) -> PickStyle {
        match (self.settings.style, ctx.event.modifiers.alt) {
            (style, false) => style,
            (PickStyle::Contained, true) => PickStyle::Intersects,
            (PickStyle::Intersects, true) => PickStyle::Contained,
        }
    }
}

impl Tool for RubberBandTool {
    fn id(&self) -> ToolId {
        ToolId::RUBBER_BAND
    }

    fn can_start(&self, ctx: &ToolContext<'_>) -> std::result::Result<bool, ToolError> {
        Ok(ctx.event.buttons.left
            && ctx.event.dragging
            && ctx.pick_top(ctx.first.doc_point).is_none()
            && ctx.pick_handle(ctx.first.doc_point).is_none())
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        let rect = Self::marquee(ctx);
        ctx.set_feedback(Some(ViewItem::Marquee(rect)));
        Ok(())
    }

    fn stop(&mut self, ctx: &mut ToolContext<'_>) {
        ctx.set_feedback(None);
        ctx.requests.autoscroll = false;
    }

    fn mouse_move(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        let rect = Self::marquee(ctx);
        ctx.set_feedback(Some(ViewItem::Marquee(rect)));
        ctx.requests.autoscroll = ctx.near_edge();
        Ok(())
    }

    fn mouse_up(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        let rect = Self::marquee(ctx);
        let style = self.style(ctx);
        let hits = ctx.layers.pick_in_rectangle(ctx.document, rect, style, true);
        tracing::debug!("Rubber band {:?} picked {} objects", style, hits.len());
        if ctx.event.modifiers.shift {
            ctx.selection.add_all(ctx.document, &hits)?;
        } else {
            ctx.selection.replace(ctx.document, &hits)?;
        }
        ctx.requests.stop = true;
        Ok(())
    }

    fn settings(&self) -> Value {
        serde_json::to_value(self.settings).unwrap_or(Value::Null)
    }

    fn update_settings(&mut self, patch: &Value) -> std::result::Result<(), ToolError> {
        self.settings = patch_settings(&self.id(), &self.settings, patch)?;
        Ok(())
    }
}
