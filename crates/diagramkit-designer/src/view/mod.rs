//! Interactive canvas view.
//!
//! [`CanvasView`] is the composition root. It owns the document, the layer
//! stack, the selection, the viewport and the tool machine, routes
//! canonical input into the tools, and turns what happened during each
//! step into repaint requests and [`EditorEvent`]s.
//!
//! # Steps
//!
//! Every public entry point (input, commands, `tick`) runs as one step:
//! updates are suspended, the work runs, then the document outbox is
//! drained into dirty regions, the layer stack and selection are brought
//! back in line with the document, and events are published. The host gets
//! at most one `RefreshRequested` per step, and none while it holds its own
//! [`suspend_updates`](CanvasView::suspend_updates).

mod commands;
mod drop;
mod invalidation;
mod scheduler;

pub use commands::DocumentCommand;
pub use invalidation::{Damage, InvalidRegion};
pub use scheduler::{Scheduler, Timer};

use std::sync::Arc;

use diagramkit_core::constants::{DEFAULT_VIEW_HEIGHT, DEFAULT_VIEW_WIDTH};
use diagramkit_core::{
    EditorEvent, EventBus, LayerId, MarshalQueue, MarshalSender, ModelError, Result, Routed, ToolError,
};
use diagramkit_settings::EditorConfig;

use crate::change::{ChangeEvent, ChangePhase};
use crate::document::Document;
use crate::geometry::{Point, Rect};
use crate::history::UndoManager;
use crate::input::{InputCanonicalizer, InputKind, Phase, RawInput};
use crate::layer::{Grid, LayerStack, PickParams};
use crate::painter::Painter;
use crate::selection_manager::{handles_for, SelectionManager};
use crate::tools::{builtin_tools, ToolContext, ToolId, ToolManager, ToolRequests};
use crate::viewport::Viewport;

/// One interactive view onto a document.
pub struct CanvasView {
    config: EditorConfig,
    document: Document,
    layers: LayerStack,
    selection: SelectionManager,
    viewport: Viewport,
    input: InputCanonicalizer,
    tools: ToolManager,
    requests: ToolRequests,
    active_layer: LayerId,
    invalid: InvalidRegion,
    scheduler: Scheduler,
    commands: MarshalQueue<DocumentCommand>,
    bus: Arc<EventBus>,
    /// Last published (undo, redo) depths.
    history_depths: (usize, usize),
    /// Last published (origin, scale_x, scale_y).
    view_state: (Point, f64, f64),
}

impl CanvasView {
    /// A view onto a new empty document.
    pub fn new(config: EditorConfig) -> Self {
        let history = UndoManager::with_depth(config.history.max_depth);
        let document = Document::with_history("Untitled", history);
        Self::with_document(config, document)
    }

    pub fn with_document(config: EditorConfig, document: Document) -> Self {
        Self::with_event_bus(config, document, Arc::new(EventBus::new()))
    }

    /// A view publishing on a bus shared with the host.
    pub fn with_event_bus(config: EditorConfig, document: Document, bus: Arc<EventBus>) -> Self {
        let viewport = Viewport::from_config(&config, DEFAULT_VIEW_WIDTH, DEFAULT_VIEW_HEIGHT);
        let mut layers = LayerStack::with_grid(Grid::from_settings(&config.grid), config.grid.visible);
        layers.sync_with_document(&document);
        let active_layer = top_layer(&document);
        let view_state = (viewport.origin(), viewport.scale_x(), viewport.scale_y());
        let history_depths = (document.history().undo_depth(), document.history().redo_depth());

        tracing::info!("Canvas view created for '{}'", document.name());
        Self {
            selection: SelectionManager::new(config.selection.max_count),
            input: InputCanonicalizer::new(&config.interaction),
            tools: builtin_tools(),
            requests: ToolRequests::default(),
            invalid: InvalidRegion::new(),
            scheduler: Scheduler::new(),
            commands: MarshalQueue::new(),
            config,
            document,
            layers,
            viewport,
            active_layer,
            bus,
            history_depths,
            view_state,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// View layers may be added or toggled freely; call [`refresh`](Self::refresh)
    /// afterwards to repaint.
    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn input(&self) -> &InputCanonicalizer {
        &self.input
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    /// Registry access for registering tools and editing candidate lists.
    pub fn tools_mut(&mut self) -> &mut ToolManager {
        &mut self.tools
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Layer new objects are created on.
    pub fn active_layer(&self) -> LayerId {
        self.active_layer
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> Result<()> {
        if self.document.layer(id).is_none() {
            return Err(ModelError::UnknownLayer { id }.into());
        }
        self.active_layer = id;
        Ok(())
    }

    /// Runs `f` against the document as one step, so its changes are
    /// invalidated and published like any other edit.
    pub fn edit<T>(&mut self, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        self.step(|view| f(&mut view.document))
    }

    /// Feeds one host event through the canonicalizer and the tools.
    /// Returns whether anything handled it.
    pub fn handle_input(&mut self, raw: &RawInput) -> bool {
        let result = self.step(|view| {
            let Some(kind) = view.input.canonicalize(raw, &view.viewport).map(|e| e.kind) else {
                return Ok(false);
            };
            match kind {
                InputKind::Mouse | InputKind::Focus => Ok(view.dispatch_pointer()),
                InputKind::Wheel => view.wheel_zoom(),
                InputKind::Key => view.handle_key(),
            }
        });
        result.unwrap_or_else(|e| {
            tracing::warn!("Input {:?} rejected: {}", raw, e);
            false
        })
    }

    fn dispatch_pointer(&mut self) -> bool {
        let handled = self.with_context(|tools, ctx| tools.dispatch(ctx));
        let event = self.input.current();
        if event.phase == Phase::Cancel {
            self.scheduler.cancel(&Timer::Autoscroll);
        }
        if self.tools.active().is_none() && !event.buttons.any() && event.phase == Phase::Continue {
            let deadline = event.time_ms + self.config.interaction.hover_delay_ms;
            self.scheduler.schedule(Timer::Hover(event.view_point), deadline);
        } else {
            self.scheduler.cancel(&Timer::Hover(Point::ORIGIN));
        }
        handled
    }

    fn wheel_zoom(&mut self) -> Result<bool> {
        let event = self.input.current();
        if event.wheel_delta == 0.0 {
            return Ok(false);
        }
        let factor = if event.wheel_delta > 0.0 {
            self.viewport.zoom_step()
        } else {
            1.0 / self.viewport.zoom_step()
        };
        let anchor = event.view_point;
        self.viewport.zoom_at(anchor, factor)?;
        Ok(true)
    }

    /// Builds the tool context from disjoint borrows of the view.
    fn with_context<R>(&mut self, f: impl FnOnce(&mut ToolManager, &mut ToolContext<'_>) -> R) -> R {
        let mut ctx = ToolContext {
            document: &mut self.document,
            selection: &mut self.selection,
            layers: &mut self.layers,
            viewport: &mut self.viewport,
            event: self.input.current(),
            first: self.input.first(),
            config: &self.config,
            active_layer: self.active_layer,
            requests: &mut self.requests,
        };
        f(&mut self.tools, &mut ctx)
    }

    /// Assigns a modal tool, or returns to the default dispatcher with `None`.
    pub fn set_tool(&mut self, id: Option<ToolId>) -> Result<()> {
        self.step(|view| {
            view.with_context(|tools, ctx| tools.set_tool(id, ctx))
                .map_err(Into::into)
        })
    }

    /// Patches the settings of a registered tool.
    pub fn update_tool_settings(&mut self, id: &ToolId, patch: &serde_json::Value) -> std::result::Result<(), ToolError> {
        self.tools.update_settings(id, patch)
    }

    /// Delivers a cancel to the active tool. Returns whether one was active.
    pub fn cancel_tool(&mut self) -> bool {
        self.step(|view| Ok(view.with_context(|tools, ctx| tools.cancel(ctx))))
            .unwrap_or(false)
    }

    /// Ignores host input while `false`; programmatic replay still works.
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input.set_enabled(enabled);
    }

    /// Reports a new drawing-surface size, keeping the remembered center
    /// in the middle of the view.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<bool> {
        self.step(|view| {
            let center = view.viewport.remembered_center();
            let resized = view.viewport.set_view_size(width, height)?;
            if resized {
                view.viewport.center_on(center)?;
                view.invalid.invalidate_all();
            }
            Ok(resized)
        })
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) -> Result<bool> {
        self.step(|view| Ok(view.viewport.scroll_by(dx, dy)?))
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<bool> {
        self.step(|view| Ok(view.viewport.set_scale(scale)?))
    }

    /// Zooms so the whole document extent is visible.
    pub fn zoom_to_fit(&mut self) -> Result<bool> {
        self.step(|view| match view.document.extent() {
            Some(extent) => Ok(view.viewport.fit_to_bounds(extent, 0.05)?),
            None => Ok(false),
        })
    }

    /// Replaces the document. The active tool is cancelled first, and the
    /// previous document is returned.
    pub fn set_document(&mut self, document: Document) -> Document {
        self.invalid.suspend();
        self.with_context(|tools, ctx| tools.cancel(ctx));
        self.scheduler.clear();
        self.input.reset();

        let previous = std::mem::replace(&mut self.document, document);
        self.selection.clear();
        self.layers.sync_with_document(&self.document);
        self.active_layer = top_layer(&self.document);
        self.invalid.invalidate_all();
        tracing::info!("Document replaced by '{}'", self.document.name());
        self.bus.publish(EditorEvent::DocumentReplaced {
            name: self.document.name().to_string(),
        });
        self.finish_step();
        previous
    }

    /// Nested batching: repaint requests are held until the matching
    /// [`resume_updates`](Self::resume_updates).
    pub fn suspend_updates(&mut self) {
        self.invalid.suspend();
    }

    /// Ends one level of batching. The outermost resume publishes exactly
    /// one `RefreshRequested` if anything was invalidated meanwhile.
    pub fn resume_updates(&mut self) {
        if self.invalid.resume() {
            self.bus.publish(EditorEvent::RefreshRequested);
        }
    }

    /// Marks the whole view dirty.
    pub fn refresh(&mut self) {
        self.invalid.suspend();
        self.invalid.invalidate_all();
        self.finish_step();
    }

    /// Damage the host was last asked to repaint, cleared on read.
    pub fn take_damage(&mut self) -> Option<Damage> {
        self.invalid.take_pending()
    }

    /// Paints the visible document area back to front.
    pub fn paint(&self, painter: &mut dyn Painter) -> Result<usize> {
        self.paint_region(painter, self.viewport.visible_doc_rect())
    }

    /// Paints only what intersects `clip` (document space).
    pub fn paint_region(&self, painter: &mut dyn Painter, clip: Rect) -> Result<usize> {
        Ok(self.layers.paint(&self.document, painter, clip)?)
    }

    /// `p` snapped to the nearest grid point when snapping is on.
    pub fn snap_point(&self, p: Point) -> Point {
        if self.config.grid.snap_enabled {
            self.layers.snap(p).unwrap_or(p)
        } else {
            p
        }
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.config.grid.snap_enabled = enabled;
    }

    /// Fires the delayed callbacks due at `now` (ms, host clock).
    pub fn tick(&mut self, now: u64) {
        let due = self.scheduler.take_due(now);
        if due.is_empty() {
            return;
        }
        self.invalid.suspend();
        for timer in due {
            match timer {
                Timer::Autoscroll => self.autoscroll(now),
                Timer::Hover(at) => {
                    let doc_point = self.viewport.view_to_doc(at);
                    if let Some(id) = self.layers.pick_top_at(&self.document, doc_point, self.pick_params()) {
                        tracing::debug!("Hover over {}", id);
                        self.bus.publish(EditorEvent::ObjectHover { id });
                    }
                }
            }
        }
        self.finish_step();
    }

    /// Picking slop from config, in document units at the current scale.
    fn pick_params(&self) -> PickParams {
        PickParams {
            tolerance: self
                .viewport
                .view_to_doc_distance(self.config.selection.pick_tolerance_px),
            selectable_only: true,
        }
    }

    fn autoscroll(&mut self, now: u64) {
        if self.tools.active().is_none() || !self.requests.autoscroll {
            return;
        }
        let margin = self.config.interaction.autoscroll_margin_px;
        let size = self.viewport.view_size();
        let p = self.input.current().view_point;
        let edge_step = |v: f64, extent: f64| {
            if v < margin {
                -margin
            } else if v > extent - margin {
                margin
            } else {
                0.0
            }
        };
        let (dx, dy) = (edge_step(p.x, size.width), edge_step(p.y, size.height));
        match self.viewport.scroll_by(dx, dy) {
            Ok(true) => {
                self.input.refresh_doc_points(&self.viewport);
                if self.input.current().phase == Phase::Continue {
                    self.with_context(|tools, ctx| tools.dispatch(ctx));
                }
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Autoscroll failed: {}", e),
        }
        self.schedule_autoscroll(now);
    }

    fn schedule_autoscroll(&mut self, now: u64) {
        if self.requests.autoscroll && self.tools.active().is_some() {
            if !self.scheduler.is_pending(&Timer::Autoscroll) {
                let deadline = now + self.config.interaction.autoscroll_delay_ms;
                self.scheduler.schedule(Timer::Autoscroll, deadline);
            }
        } else {
            self.scheduler.cancel(&Timer::Autoscroll);
        }
    }

    fn step<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.invalid.suspend();
        let result = f(self);
        self.finish_step();
        result
    }

    /// Reconciles view state with what the step did and publishes events.
    fn finish_step(&mut self) {
        let changes = self.document.drain_events();
        let mut structural = false;
        for event in &changes {
            structural |= self.invalidate_change(event);
        }
        if structural {
            if self.layers.sync_with_document(&self.document) {
                self.invalid.invalidate_all();
            }
            if self.document.layer(self.active_layer).is_none() {
                self.active_layer = top_layer(&self.document);
            }
        }

        let pruned = self.selection.prune(&self.document);
        let selection_events = self.selection.take_events();
        let selection_changed = !selection_events.is_empty() || pruned > 0;
        // Geometry edits move handles too.
        if selection_changed || (!changes.is_empty() && !self.selection.is_empty()) {
            self.layers.set_handles(handles_for(&self.document, &self.selection));
            self.invalid.invalidate_all();
        }
        if selection_changed {
            self.bus.publish(EditorEvent::SelectionChanged {
                count: self.selection.len(),
                primary: self.selection.primary(),
            });
        }

        for (from, to) in self.tools.take_changes() {
            tracing::info!(
                "Tool {} -> {}",
                from.as_ref().map_or("idle", |t| t.as_str()),
                to.as_ref().map_or("idle", |t| t.as_str())
            );
            self.bus.publish(EditorEvent::ToolChanged {
                from: from.map(|t| t.to_string()),
                to: to.map(|t| t.to_string()),
            });
        }
        if let Some(id) = self.requests.activated.take() {
            self.bus.publish(EditorEvent::ObjectActivated { id });
        }
        if std::mem::take(&mut self.requests.repaint) {
            self.invalid.invalidate_all();
        }
        let now = self.input.current().time_ms;
        self.schedule_autoscroll(now);

        let history = self.document.history();
        let depths = (history.undo_depth(), history.redo_depth());
        if depths != self.history_depths {
            self.history_depths = depths;
            self.bus.publish(EditorEvent::HistoryChanged {
                undo_depth: depths.0,
                redo_depth: depths.1,
            });
        }

        let view_state = (self.viewport.origin(), self.viewport.scale_x(), self.viewport.scale_y());
        if view_state != self.view_state {
            self.view_state = view_state;
            self.input.refresh_doc_points(&self.viewport);
            self.invalid.invalidate_all();
            self.bus.publish(EditorEvent::ViewportChanged {
                origin_x: view_state.0.x,
                origin_y: view_state.0.y,
                scale: view_state.1,
            });
        }

        if self.invalid.resume() {
            self.bus.publish(EditorEvent::RefreshRequested);
        }
    }

    /// Adds the record's rectangles to the dirty region. Returns whether the
    /// change touched the layer/object tree.
    fn invalidate_change(&mut self, event: &ChangeEvent) -> bool {
        if event.phase != ChangePhase::Changed {
            return false;
        }
        let record = &event.record;
        match (record.old_rect, record.new_rect) {
            (None, None) if record.change.is_structural() => self.invalid.invalidate_all(),
            (old, new) => {
                for rect in [old, new].into_iter().flatten() {
                    self.invalid.invalidate(rect);
                }
            }
        }
        record.change.is_structural()
    }

    /// Sender for commands produced on other threads.
    pub fn command_sender(&self) -> MarshalSender<DocumentCommand> {
        self.commands.sender()
    }

    /// Runs a command now when called on the owning thread with nothing
    /// queued; otherwise queues it behind earlier commands.
    pub fn submit(&mut self, command: DocumentCommand) -> Result<()> {
        match self.commands.route(command) {
            Routed::Deliver(command) => self.execute(command),
            Routed::Queued => Ok(()),
        }
    }

    /// Executes queued commands in arrival order. Failures are logged and
    /// do not stop the queue. Returns how many ran.
    pub fn pump_commands(&mut self) -> usize {
        let pending = self.commands.drain();
        let count = pending.len();
        for command in pending {
            if let Err(e) = self.execute(command) {
                tracing::warn!("Queued command failed: {}", e);
            }
        }
        count
    }
}

impl std::fmt::Debug for CanvasView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasView")
            .field("document", &self.document.name())
            .field("objects", &self.document.object_count())
            .field("selected", &self.selection.len())
            .field("tool", &self.tools.active())
            .field("viewport", &self.viewport)
            .finish()
    }
}

fn top_layer(document: &Document) -> LayerId {
    document
        .layers()
        .last()
        .map(|l| l.id())
        .unwrap_or(LayerId(0))
}
