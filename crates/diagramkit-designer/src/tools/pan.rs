use diagramkit_core::{Result, ToolError};

use super::{Tool, ToolContext, ToolId};
use crate::geometry::Point;
use crate::input::MouseButton;

/// Middle-button drag scrolls the view, tried on mouse-down.
#[derive(Debug, Default)]
pub struct PanTool {
    start_origin: Point,
}

impl Tool for PanTool {
    fn id(&self) -> ToolId {
        ToolId::PAN
    }

    fn can_start(&self, ctx: &ToolContext<'_>) -> std::result::Result<bool, ToolError> {
        Ok(ctx.event.button == Some(MouseButton::Middle))
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        self.start_origin = ctx.viewport.origin();
        Ok(())
    }

    fn mouse_move(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        // View points are stable while the origin moves; doc points are not.
        let dx = ctx.event.view_point.x - ctx.first.view_point.x;
        let dy = ctx.event.view_point.y - ctx.first.view_point.y;
        let origin = Point::new(
            self.start_origin.x - dx / ctx.viewport.scale_x(),
            self.start_origin.y - dy / ctx.viewport.scale_y(),
        );
        ctx.viewport.set_origin(origin)?;
        Ok(())
    }

    fn mouse_up(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        self.mouse_move(ctx)?;
        if !ctx.event.buttons.middle {
            ctx.requests.stop = true;
        }
        Ok(())
    }
}
