//! Event type definitions for the event bus.
//!
//! Events are cloneable and serializable so they can be logged or replayed.

use serde::{Deserialize, Serialize};

use crate::ids::ObjectId;

/// Root event enum for editor lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorEvent {
    /// Selection membership changed (published once per batch)
    SelectionChanged {
        /// Number of selected objects after the change.
        count: usize,
        /// The primary selection, if any.
        primary: Option<ObjectId>,
    },
    /// The active tool changed; `None` means the idle dispatcher
    ToolChanged {
        /// Previous tool id.
        from: Option<String>,
        /// New tool id.
        to: Option<String>,
    },
    /// An object was double-clicked
    ObjectActivated {
        /// The activated object.
        id: ObjectId,
    },
    /// The pointer rested over an object for the hover delay
    ObjectHover {
        /// The hovered object.
        id: ObjectId,
    },
    /// The view switched to another document
    DocumentReplaced {
        /// Name of the new document.
        name: String,
    },
    /// Scroll origin or scale changed
    ViewportChanged {
        /// Document-space x shown at the viewport's left edge.
        origin_x: f64,
        /// Document-space y shown at the viewport's top edge.
        origin_y: f64,
        /// Horizontal scale.
        scale: f64,
    },
    /// The host should repaint the accumulated dirty region
    RefreshRequested,
    /// Undo/redo availability changed
    HistoryChanged {
        /// Number of undoable units.
        undo_depth: usize,
        /// Number of redoable units.
        redo_depth: usize,
    },
}

impl EditorEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            EditorEvent::SelectionChanged { .. } => EventCategory::Selection,
            EditorEvent::ToolChanged { .. } => EventCategory::Tool,
            EditorEvent::ObjectActivated { .. } | EditorEvent::ObjectHover { .. } => {
                EventCategory::Interaction
            }
            EditorEvent::DocumentReplaced { .. } | EditorEvent::HistoryChanged { .. } => {
                EventCategory::Document
            }
            EditorEvent::ViewportChanged { .. } | EditorEvent::RefreshRequested => {
                EventCategory::View
            }
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            EditorEvent::SelectionChanged { count, .. } => format!("{} selected", count),
            EditorEvent::ToolChanged { from, to } => format!(
                "Tool {} -> {}",
                from.as_deref().unwrap_or("idle"),
                to.as_deref().unwrap_or("idle")
            ),
            EditorEvent::ObjectActivated { id } => format!("Activated {}", id),
            EditorEvent::ObjectHover { id } => format!("Hover {}", id),
            EditorEvent::DocumentReplaced { name } => format!("Document '{}'", name),
            EditorEvent::ViewportChanged { scale, .. } => format!("Viewport scale {:.2}", scale),
            EditorEvent::RefreshRequested => "Refresh".to_string(),
            EditorEvent::HistoryChanged {
                undo_depth,
                redo_depth,
            } => format!("History {}/{}", undo_depth, redo_depth),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Selection events.
    Selection,
    /// Tool switches.
    Tool,
    /// Pointer interactions on objects.
    Interaction,
    /// Document and history events.
    Document,
    /// Viewport and refresh events.
    View,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selection => write!(f, "selection"),
            Self::Tool => write!(f, "tool"),
            Self::Interaction => write!(f, "interaction"),
            Self::Document => write!(f, "document"),
            Self::View => write!(f, "view"),
        }
    }
}
