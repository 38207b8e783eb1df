//! Error handling for DiagramKit
//!
//! Provides error types for every layer of the editor core:
//! - Geometry errors (invalid coordinates, scales, sizes)
//! - Model errors (bad indices, unknown ids, illegal structure)
//! - History errors (transaction misuse, failed undo/redo application)
//! - Tool errors (predicate and hook failures)
//! - Surface errors (drawing surface failures reported by painters)
//!
//! All error types use `thiserror` for ergonomic error handling.

use crate::ids::{LayerId, ObjectId};
use thiserror::Error;

/// Geometry error type
///
/// Raised when a caller passes a value that cannot describe valid geometry.
/// The model is never touched when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A coordinate was NaN or infinite
    #[error("Non-finite value in {context}")]
    NonFinite {
        /// Where the value was supplied.
        context: String,
    },

    /// A scale factor was zero or negative
    #[error("Scale must be positive, got {value}")]
    NonPositiveScale {
        /// The rejected scale.
        value: f64,
    },

    /// A size had a negative extent
    #[error("Negative size {width} x {height}")]
    NegativeSize {
        /// The rejected width.
        width: f64,
        /// The rejected height.
        height: f64,
    },
}

/// Model error type
///
/// Represents invalid operations on documents, layers, and canvas objects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Index outside a sequence
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The rejected index.
        index: usize,
        /// The sequence length at the time of the call.
        len: usize,
    },

    /// No object with this id exists in the document
    #[error("Unknown object {id}")]
    UnknownObject {
        /// The missing object id.
        id: ObjectId,
    },

    /// An object with this id is already in the document
    #[error("Object {id} already exists")]
    DuplicateObject {
        /// The clashing object id.
        id: ObjectId,
    },

    /// No layer with this id exists
    #[error("Unknown layer {id}")]
    UnknownLayer {
        /// The missing layer id.
        id: LayerId,
    },

    /// Grouping would make an object its own ancestor
    #[error("Cannot place {member} inside {group}: would create a cycle")]
    CyclicGrouping {
        /// The would-be parent.
        group: ObjectId,
        /// The would-be child.
        member: ObjectId,
    },

    /// The object's capabilities forbid the operation
    #[error("Object {id} is not {capability}")]
    CapabilityDenied {
        /// The object.
        id: ObjectId,
        /// The missing capability, e.g. "resizable".
        capability: &'static str,
    },

    /// The operation needs a different kind of object
    #[error("Object {id} is not a {expected}")]
    WrongKind {
        /// The object.
        id: ObjectId,
        /// The kind the operation needs.
        expected: &'static str,
    },

    /// The object is not directly owned by a layer
    #[error("Object {id} is not a top-level object")]
    NotTopLevel {
        /// The object.
        id: ObjectId,
    },

    /// A child slot names a layer other than its parent group's
    #[error("Group {parent} is on {actual}, not {requested}")]
    ParentLayerMismatch {
        /// The parent group.
        parent: ObjectId,
        /// The layer the group lives on.
        actual: LayerId,
        /// The layer the slot asked for.
        requested: LayerId,
    },

    /// A document always keeps at least one layer
    #[error("Cannot remove the last document layer")]
    LastLayer,

    /// Grouping needs at least one member
    #[error("Cannot create an empty group")]
    EmptyGroup,
}

/// History error type
///
/// Covers misuse of transactions and failures of the undo substrate.
/// Failures to apply a change record are escalated: losing a record would
/// break the undo/redo round trip.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// finish/abort called with no open transaction
    #[error("No transaction in progress")]
    NoTransaction,

    /// undo/redo requested while a transaction is still open
    #[error("Transaction '{name}' is still open")]
    TransactionOpen {
        /// Name of the innermost open transaction.
        name: String,
    },

    /// A mutation was attempted while a change record was being applied
    #[error("Re-entrant mutation while applying {change}")]
    ReentrantMutation {
        /// The change being applied at the time.
        change: String,
    },

    /// A stored record could not be applied
    #[error("Failed to apply {change}: {reason}")]
    ApplyFailed {
        /// The change that failed.
        change: String,
        /// The underlying reason.
        reason: String,
    },
}

/// Tool error type
///
/// Tool failures never abort a gesture; the dispatcher logs them and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// A "can start" predicate failed
    #[error("Tool '{tool}' predicate failed: {reason}")]
    Predicate {
        /// The tool id.
        tool: String,
        /// The reason.
        reason: String,
    },

    /// No tool is registered under the id
    #[error("Unknown tool '{tool}'")]
    UnknownTool {
        /// The requested tool id.
        tool: String,
    },

    /// A start/stop/input hook failed
    #[error("Tool '{tool}' failed: {reason}")]
    Hook {
        /// The tool id.
        tool: String,
        /// The reason.
        reason: String,
    },
}

/// Surface error type
///
/// Reported by painter collaborators. The in-memory model stays valid, so
/// a later paint can simply be retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// The host could not allocate a drawing surface
    #[error("Failed to allocate {width}x{height} surface")]
    Allocation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Any other backend failure
    #[error("Surface error: {reason}")]
    Backend {
        /// The reason.
        reason: String,
    },
}

/// Main error type for DiagramKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Model error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// History error
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Tool error
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Surface error
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error rejects a caller-supplied argument
    ///
    /// Invalid-argument errors are recovered locally by rejecting the
    /// operation; the model is unchanged.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Error::Geometry(_)
                | Error::Model(ModelError::IndexOutOfRange { .. })
                | Error::Model(ModelError::UnknownObject { .. })
                | Error::Model(ModelError::UnknownLayer { .. })
                | Error::Model(ModelError::ParentLayerMismatch { .. })
        )
    }

    /// Check if this is an undo-substrate error
    pub fn is_history_error(&self) -> bool {
        matches!(self, Error::History(_))
    }

    /// Check if this is a surface error
    pub fn is_surface_error(&self) -> bool {
        matches!(self, Error::Surface(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
