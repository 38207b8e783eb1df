use diagramkit_core::{Result, ToolError};

use super::{commit, rollback, Tool, ToolContext, ToolId};
use crate::geometry::Rect;
use crate::input::MouseButton;
use crate::model::Shape;
use crate::selection_manager::{Handle, HandleKind};

/// Handle drags, tried on mouse-down.
///
/// A bounding handle resizes the owner's box; a point handle moves the
/// stroke point it is tagged with. One transaction per drag. A double
/// click on a handle without dragging activates the owner.
#[derive(Debug, Default)]
pub struct ResizeTool {
    handle: Option<Handle>,
    original: Option<Rect>,
}

impl ResizeTool {
    fn transaction_name(&self) -> &'static str {
        match self.handle.map(|h| h.kind) {
            Some(HandleKind::Point(_)) => "Reshape",
            _ => "Resize",
        }
    }

    fn drag_to(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        if !ctx.event.dragging {
            return Ok(());
        }
        let p = ctx.snap(ctx.event.doc_point);
        match handle.kind {
            HandleKind::Bounds(position) => {
                if let Some(original) = self.original {
                    ctx.document
                        .set_bounds(handle.owner, position.resize(&original, p))?;
                }
            }
            HandleKind::Point(index) => {
                ctx.document.set_point(handle.owner, index, p)?;
            }
        }
        ctx.requests.autoscroll = ctx.near_edge();
        Ok(())
    }
}

impl Tool for ResizeTool {
    fn id(&self) -> ToolId {
        ToolId::RESIZE
    }

    fn can_start(&self, ctx: &ToolContext<'_>) -> std::result::Result<bool, ToolError> {
        Ok(ctx.event.button == Some(MouseButton::Left) && ctx.pick_handle(ctx.event.doc_point).is_some())
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        let handle = ctx.pick_handle(ctx.event.doc_point);
        self.original = handle.and_then(|h| match ctx.document.object(h.owner).map(|o| o.shape()) {
            Some(Shape::Rectangle(b)) => Some(b.rect),
            _ => None,
        });
        self.handle = handle;
        ctx.document.start_transaction();
        Ok(())
    }

    fn stop(&mut self, ctx: &mut ToolContext<'_>) {
        let name = self.transaction_name();
        commit(ctx, name);
        self.handle = None;
        self.original = None;
        ctx.requests.autoscroll = false;
    }

    fn mouse_move(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        self.drag_to(ctx)
    }

    fn mouse_up(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        self.drag_to(ctx)?;
        if !ctx.event.buttons.left {
            // A double click that lands on a handle still means the object.
            if !ctx.event.dragging && ctx.first.double_click {
                ctx.requests.activated = self.handle.map(|h| h.owner);
            }
            ctx.requests.stop = true;
        }
        Ok(())
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) {
        rollback(ctx);
    }
}
