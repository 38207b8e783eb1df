use serde_json::Value;
use std::collections::HashMap;

use diagramkit_core::ToolError;

use super::{Tool, ToolContext, ToolId};
use crate::input::{InputKind, Phase};

/// Which candidate list a mode-less tool is tried from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchPhase {
    /// Mouse button pressed (gesture start).
    Down,
    /// Pointer moved (gesture continue).
    Move,
    /// Mouse button released (gesture finish).
    Up,
}

/// Registry of tools plus the active-tool state machine.
pub struct ToolManager {
    tools: HashMap<ToolId, Box<dyn Tool>>,
    down: Vec<ToolId>,
    moves: Vec<ToolId>,
    up: Vec<ToolId>,
    active: Option<ToolId>,
    modal: bool,
    changes: Vec<(Option<ToolId>, Option<ToolId>)>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            down: Vec::new(),
            moves: Vec::new(),
            up: Vec::new(),
            active: None,
            modal: false,
            changes: Vec::new(),
        }
    }

    /// Registers a tool and appends it to the given candidate lists.
    /// Re-registering an id replaces the tool.
    pub fn register(&mut self, tool: Box<dyn Tool>, phases: &[DispatchPhase]) {
        let id = tool.id();
        tracing::debug!("Registering tool '{}' for {:?}", id, phases);
        for &phase in phases {
            let list = self.list_mut(phase);
            if !list.contains(&id) {
                list.push(id.clone());
            }
        }
        self.tools.insert(id, tool);
    }

    /// Removes a tool. The active tool cannot be removed.
    pub fn unregister(&mut self, id: &ToolId) -> Option<Box<dyn Tool>> {
        if self.active.as_ref() == Some(id) {
            return None;
        }
        self.down.retain(|t| t != id);
        self.moves.retain(|t| t != id);
        self.up.retain(|t| t != id);
        self.tools.remove(id)
    }

    fn list_mut(&mut self, phase: DispatchPhase) -> &mut Vec<ToolId> {
        match phase {
            DispatchPhase::Down => &mut self.down,
            DispatchPhase::Move => &mut self.moves,
            DispatchPhase::Up => &mut self.up,
        }
    }

    pub fn candidates(&self, phase: DispatchPhase) -> &[ToolId] {
        match phase {
            DispatchPhase::Down => &self.down,
            DispatchPhase::Move => &self.moves,
            DispatchPhase::Up => &self.up,
        }
    }

    /// Replaces a candidate list. Unknown ids are rejected.
    pub fn set_candidates(&mut self, phase: DispatchPhase, ids: Vec<ToolId>) -> Result<(), ToolError> {
        if let Some(unknown) = ids.iter().find(|id| !self.tools.contains_key(*id)) {
            return Err(ToolError::UnknownTool {
                tool: unknown.to_string(),
            });
        }
        *self.list_mut(phase) = ids;
        Ok(())
    }

    pub fn contains(&self, id: &ToolId) -> bool {
        self.tools.contains_key(id)
    }

    pub fn ids(&self) -> Vec<ToolId> {
        let mut ids: Vec<ToolId> = self.tools.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// `None` means idle: the dispatcher is in charge.
    pub fn active(&self) -> Option<&ToolId> {
        self.active.as_ref()
    }

    pub fn is_modal(&self) -> bool {
        self.active.is_some() && self.modal
    }

    pub fn settings(&self, id: &ToolId) -> Result<Value, ToolError> {
        self.tools
            .get(id)
            .map(|t| t.settings())
            .ok_or_else(|| ToolError::UnknownTool {
                tool: id.to_string(),
            })
    }

    /// Patches a registered tool's settings by id.
    pub fn update_settings(&mut self, id: &ToolId, patch: &Value) -> Result<(), ToolError> {
        let tool = self.tools.get_mut(id).ok_or_else(|| ToolError::UnknownTool {
            tool: id.to_string(),
        })?;
        tool.update_settings(patch)?;
        tracing::info!("Updated settings of tool '{}'", id);
        Ok(())
    }

    /// Tool switches since the last call, as (from, to).
    pub fn take_changes(&mut self) -> Vec<(Option<ToolId>, Option<ToolId>)> {
        std::mem::take(&mut self.changes)
    }

    /// Routes one canonical mouse event. Returns whether a tool handled it.
    pub fn dispatch(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        if ctx.event.kind != InputKind::Mouse && ctx.event.phase != Phase::Cancel {
            return false;
        }
        let handled = match (ctx.event.phase, self.active.clone()) {
            (Phase::Cancel, _) => self.cancel(ctx),
            (phase, Some(id)) => {
                if let Some(tool) = self.tools.get_mut(&id) {
                    let result = match phase {
                        Phase::Start => tool.mouse_down(ctx),
                        Phase::Continue => tool.mouse_move(ctx),
                        _ => tool.mouse_up(ctx),
                    };
                    if let Err(e) = result {
                        tracing::warn!("Tool '{}' failed: {}; cancelling", id, e);
                        self.cancel(ctx);
                    }
                }
                true
            }
            (Phase::Start, None) => self.try_candidates(DispatchPhase::Down, ctx),
            (Phase::Continue, None) => self.try_candidates(DispatchPhase::Move, ctx),
            (Phase::Finish, None) => self.try_candidates(DispatchPhase::Up, ctx),
        };
        self.honor_stop(ctx);
        handled
    }

    fn try_candidates(&mut self, phase: DispatchPhase, ctx: &mut ToolContext<'_>) -> bool {
        let candidates = self.candidates(phase).to_vec();
        for id in candidates {
            let Some(tool) = self.tools.get(&id) else {
                continue;
            };
            match tool.can_start(ctx) {
                Ok(true) => {
                    if self.activate(&id, false, ctx) {
                        return true;
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Tool '{}' cannot start: {}", id, e);
                }
            }
        }
        false
    }

    fn activate(&mut self, id: &ToolId, modal: bool, ctx: &mut ToolContext<'_>) -> bool {
        let Some(tool) = self.tools.get_mut(id) else {
            return false;
        };
        if let Err(e) = tool.start(ctx) {
            tracing::warn!("Tool '{}' failed to start: {}", id, e);
            tool.cancel(ctx);
            ctx.requests.stop = false;
            return false;
        }
        tracing::debug!("Tool '{}' started", id);
        self.changes.push((self.active.clone(), Some(id.clone())));
        self.active = Some(id.clone());
        self.modal = modal;
        true
    }

    fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(id) = self.active.take() {
            if let Some(tool) = self.tools.get_mut(&id) {
                tool.stop(ctx);
            }
            tracing::debug!("Tool '{}' stopped", id);
            self.changes.push((Some(id), None));
        }
        self.modal = false;
    }

    fn honor_stop(&mut self, ctx: &mut ToolContext<'_>) {
        if std::mem::take(&mut ctx.requests.stop) {
            self.deactivate(ctx);
        }
    }

    /// Switches tools: the old tool's `stop` runs before the new tool's
    /// `start`. `None` returns to the default dispatcher.
    pub fn set_tool(&mut self, id: Option<ToolId>, ctx: &mut ToolContext<'_>) -> Result<(), ToolError> {
        if let Some(id) = &id {
            if !self.tools.contains_key(id) {
                return Err(ToolError::UnknownTool {
                    tool: id.to_string(),
                });
            }
        }
        self.deactivate(ctx);
        if let Some(id) = id {
            tracing::info!("Switching to tool '{}'", id);
            if !self.activate(&id, true, ctx) {
                return Err(ToolError::Hook {
                    tool: id.to_string(),
                    reason: "start failed".to_string(),
                });
            }
            self.honor_stop(ctx);
        }
        Ok(())
    }

    /// Offers a key to the active tool. Returns whether it was consumed.
    pub fn key(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let Some(id) = self.active.clone() else {
            return false;
        };
        let consumed = match self.tools.get_mut(&id).map(|t| t.key(ctx)) {
            Some(Ok(consumed)) => consumed,
            Some(Err(e)) => {
                tracing::warn!("Tool '{}' failed on key: {}; cancelling", id, e);
                self.cancel(ctx);
                true
            }
            None => false,
        };
        self.honor_stop(ctx);
        consumed
    }

    /// Cancels the active tool: its in-progress work is discarded, then it
    /// stops. Returns whether a tool was active.
    pub fn cancel(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let Some(id) = self.active.clone() else {
            return false;
        };
        if let Some(tool) = self.tools.get_mut(&id) {
            tool.cancel(ctx);
        }
        tracing::info!("Tool '{}' cancelled", id);
        self.deactivate(ctx);
        ctx.requests.stop = false;
        true
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolManager")
            .field("tools", &self.ids())
            .field("down", &self.down)
            .field("moves", &self.moves)
            .field("up", &self.up)
            .field("active", &self.active)
            .field("modal", &self.modal)
            .finish()
    }
}
