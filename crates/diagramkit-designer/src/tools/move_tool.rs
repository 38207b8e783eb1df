use diagramkit_core::{ObjectId, Result, ToolError};

use super::{commit, rollback, Tool, ToolContext, ToolId};
use crate::geometry::Point;

/// Drags the selection, tried on mouse-move.
///
/// Starts once a left-button drag that began on a movable object passes
/// the drag threshold. An unselected object under the press point becomes
/// the selection first. The whole drag is one transaction.
#[derive(Debug, Default)]
pub struct MoveTool {
    targets: Vec<ObjectId>,
    /// Top-left of the primary target when the drag started.
    anchor: Point,
    applied: (f64, f64),
}

impl MoveTool {
    const TRANSACTION: &'static str = "Move Selection";

    fn drag_to(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        let (dx, dy) = ctx.event.doc_delta(ctx.first);
        let target = ctx.snap(self.anchor.offset(dx, dy));
        let (dx, dy) = (target.x - self.anchor.x, target.y - self.anchor.y);
        let (step_x, step_y) = (dx - self.applied.0, dy - self.applied.1);
        if step_x == 0.0 && step_y == 0.0 {
            return Ok(());
        }
        for &id in &self.targets {
            ctx.document.translate(id, step_x, step_y)?;
        }
        self.applied = (dx, dy);
        ctx.requests.autoscroll = ctx.near_edge();
        Ok(())
    }
}

impl Tool for MoveTool {
    fn id(&self) -> ToolId {
        ToolId::MOVE
    }

    fn can_start(&self, ctx: &ToolContext<'_>) -> std::result::Result<bool, ToolError> {
        if !ctx.event.buttons.left || !ctx.event.dragging {
            return Ok(false);
        }
        let Some(hit) = ctx.pick_top(ctx.first.doc_point) else {
            return Ok(false);
        };
        Ok(ctx
            .document
            .object(hit)
            .is_some_and(|o| o.capabilities().movable))
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        if let Some(hit) = ctx.pick_top(ctx.first.doc_point) {
            if !ctx.selection.contains(hit) {
                ctx.selection.replace(ctx.document, &[hit])?;
            }
        }
        self.targets = ctx
            .selection
            .members()
            .iter()
            .copied()
            .filter(|&id| {
                ctx.document
                    .object(id)
                    .is_some_and(|o| o.capabilities().movable)
            })
            .collect();
        let primary = ctx.selection.primary().and_then(|id| ctx.document.bounds(id));
        self.anchor = primary.map(|b| b.origin()).unwrap_or(ctx.first.doc_point);
        self.applied = (0.0, 0.0);

        ctx.document.start_transaction();
        self.drag_to(ctx)
    }

    fn stop(&mut self, ctx: &mut ToolContext<'_>) {
        commit(ctx, Self::TRANSACTION);
        self.targets.clear();
        ctx.requests.autoscroll = false;
    }

    fn mouse_move(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        self.drag_to(ctx)
    }

    fn mouse_up(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        self.drag_to(ctx)?;
        if !ctx.event.buttons.left {
            ctx.requests.stop = true;
        }
        Ok(())
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) {
        rollback(ctx);
        self.applied = (0.0, 0.0);
    }
}
