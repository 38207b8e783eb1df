//! Headless gesture replay.
//!
//! A replay script is a JSON list of steps: raw device events, clock ticks
//! and a few editing commands. Replaying feeds them to a [`CanvasView`] in
//! order and summarizes the resulting document and undo state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use diagramkit_core::{EditorEvent, EventBus, EventFilter};
use diagramkit_designer::{CanvasView, Document, DocumentFile, RawInput, Rect, ToolId};
use diagramkit_settings::EditorConfig;
use serde::{Deserialize, Serialize};

/// One replayed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStep {
    Input(RawInput),
    /// Advances the scheduler clock to `now` milliseconds.
    Tick { now: u64 },
    /// Activates a tool by id, or returns to idle.
    Tool { id: Option<String> },
    ToolSettings { id: String, patch: serde_json::Value },
    Resize { width: f64, height: f64 },
    ZoomToFit,
    SelectAll,
    DeleteSelection,
    Undo,
    Redo,
    /// Writes the current document, with history, to `path`.
    Save { path: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Document file to open before replaying; an empty document otherwise.
    #[serde(default)]
    pub document: Option<PathBuf>,
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read replay script")?;
        let script: ReplayScript =
            serde_json::from_str(&content).context("Failed to parse replay script")?;
        tracing::info!(
            "Loaded replay script with {} steps from {}",
            script.steps.len(),
            path.as_ref().display()
        );
        Ok(script)
    }

    /// Replays every step into a fresh view built from `config`.
    ///
    /// Steps the view rejects are logged and counted, and replay continues.
    pub fn run(&self, config: EditorConfig) -> anyhow::Result<ReplayReport> {
        let document = match &self.document {
            Some(path) => {
                let file = DocumentFile::load_from_file(path)?;
                Document::from_snapshot(file.document, config.history.max_depth)?
            }
            None => Document::new("untitled"),
        };

        let bus = Arc::new(EventBus::new());
        let events = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&events);
        bus.subscribe(EventFilter::All, move |event: EditorEvent| {
            tracing::trace!("{}", event.description());
            if let Ok(mut count) = counter.lock() {
                *count += 1;
            }
        });

        let mut view = CanvasView::with_event_bus(config, document, bus);
        let mut rejected = 0;
        for (index, step) in self.steps.iter().enumerate() {
            if let Err(e) = apply(&mut view, step) {
                tracing::warn!("Step {} ({:?}) rejected: {}", index, step, e);
                rejected += 1;
            }
        }
        view.pump_commands();

        let events = events.lock().map(|count| *count).unwrap_or_default();
        Ok(ReplayReport::capture(&view, self.steps.len(), rejected, events))
    }
}

fn apply(view: &mut CanvasView, step: &ReplayStep) -> anyhow::Result<()> {
    match step {
        ReplayStep::Input(raw) => {
            view.handle_input(raw);
        }
        ReplayStep::Tick { now } => view.tick(*now),
        ReplayStep::Tool { id } => view.set_tool(id.clone().map(ToolId::new))?,
        ReplayStep::ToolSettings { id, patch } => {
            view.update_tool_settings(&ToolId::new(id.clone()), patch)?
        }
        ReplayStep::Resize { width, height } => {
            view.resize(*width, *height)?;
        }
        ReplayStep::ZoomToFit => {
            view.zoom_to_fit()?;
        }
        ReplayStep::SelectAll => {
            view.select_all()?;
        }
        ReplayStep::DeleteSelection => {
            view.delete_selection()?;
        }
        ReplayStep::Undo => {
            view.undo()?;
        }
        ReplayStep::Redo => {
            view.redo()?;
        }
        ReplayStep::Save { path } => {
            let snapshot = view.document().to_snapshot(true)?;
            DocumentFile::new(snapshot).save_to_file(path)?;
        }
    }
    Ok(())
}

/// Summary of the view after a replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub document: String,
    pub steps: usize,
    pub rejected: usize,
    pub events: usize,
    pub version: u64,
    pub layers: usize,
    pub objects: usize,
    pub extent: Option<Rect>,
    pub selected: usize,
    pub active_tool: Option<String>,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub undo_name: Option<String>,
    pub scale: f64,
}

impl ReplayReport {
    fn capture(view: &CanvasView, steps: usize, rejected: usize, events: usize) -> Self {
        let doc = view.document();
        Self {
            document: doc.name().to_string(),
            steps,
            rejected,
            events,
            version: doc.version(),
            layers: doc.layers().len(),
            objects: doc.object_count(),
            extent: doc.extent(),
            selected: view.selection().len(),
            active_tool: view.tools().active().map(|id| id.to_string()),
            undo_depth: doc.history().undo_depth(),
            redo_depth: doc.history().redo_depth(),
            undo_name: doc.history().undo_name().map(str::to_string),
            scale: view.viewport().scale_x(),
        }
    }
}
