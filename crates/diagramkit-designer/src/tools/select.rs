use diagramkit_core::{Result, ToolError};

use super::{Tool, ToolContext, ToolId};
use crate::input::MouseButton;

/// Click selection, tried on mouse-up.
///
/// Plain click replaces the selection, Shift toggles, Ctrl adds, a click
/// on empty space clears. A double click also reports the object as
/// activated.
#[derive(Debug, Default)]
pub struct SelectTool;

impl Tool for SelectTool {
    fn id(&self) -> ToolId {
        ToolId::SELECT
    }

    fn can_start(&self, ctx: &ToolContext<'_>) -> std::result::Result<bool, ToolError> {
        Ok(ctx.event.button == Some(MouseButton::Left) && !ctx.event.dragging)
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        let modifiers = ctx.event.modifiers;
        match ctx.pick_top(ctx.event.doc_point) {
            Some(id) => {
                if modifiers.shift {
                    ctx.selection.toggle(ctx.document, id)?;
                } else if modifiers.ctrl {
                    ctx.selection.add(ctx.document, id)?;
                } else {
                    ctx.selection.replace(ctx.document, &[id])?;
                }
                if ctx.first.double_click {
                    tracing::debug!("Activated {}", id);
                    ctx.requests.activated = Some(id);
                }
            }
            None => {
                if !modifiers.shift && !modifiers.ctrl {
                    ctx.selection.clear();
                }
            }
        }
        ctx.requests.stop = true;
        Ok(())
    }
}
