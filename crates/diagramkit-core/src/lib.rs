//! # DiagramKit Core
//!
//! Core types, errors, and event plumbing shared by the DiagramKit crates.
//! Provides the error taxonomy, stable object/layer identifiers, the editor
//! event bus, and the FIFO queue used to marshal work onto the UI thread.

pub mod constants;
pub mod error;
pub mod event_bus;
pub mod ids;
pub mod marshal;

pub use error::{
    Error, GeometryError, HistoryError, ModelError, Result, SurfaceError, ToolError,
};

pub use event_bus::{
    EditorEvent, EventBus, EventBusConfig, EventCategory, EventFilter, SubscriptionId,
};

pub use ids::{LayerId, ObjectId};
pub use marshal::{MarshalQueue, MarshalSender, Routed};
