//! # Event Bus Module
//!
//! Publish/subscribe channel for editor lifecycle events: selection
//! changes, tool switches, viewport changes, refresh requests and so on.
//!
//! ## Overview
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter by category and receive events synchronously
//! - Optional bounded history for diagnostics and tests
//!
//! ## Usage
//!
//! ```rust
//! use diagramkit_core::event_bus::{EditorEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Selection]),
//!     |event| {
//!         if let EditorEvent::SelectionChanged { count, .. } = event {
//!             println!("{count} objects selected");
//!         }
//!     },
//! );
//!
//! bus.publish(EditorEvent::SelectionChanged { count: 2, primary: None });
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
