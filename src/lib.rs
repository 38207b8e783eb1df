//! # DiagramKit
//!
//! The interactive core of a 2D diagram editor, plus a headless driver that
//! replays recorded gestures against it.
//!
//! ## Architecture
//!
//! DiagramKit is organized as a workspace with multiple crates:
//!
//! 1. **diagramkit-core** - Errors, ids, constants, event bus, thread marshaling
//! 2. **diagramkit-settings** - Editor configuration and its persistence
//! 3. **diagramkit-designer** - Viewport, document, undo, layers, selection, tools, view
//! 4. **diagramkit** - Logging bootstrap and the gesture replay binary

pub mod replay;

pub use diagramkit_core::{EditorEvent, Error, EventBus, LayerId, ObjectId, Result};
pub use diagramkit_designer as designer;
pub use diagramkit_designer::{CanvasView, Document, DocumentFile, RawInput};
pub use diagramkit_settings::EditorConfig;

pub use replay::{ReplayReport, ReplayScript, ReplayStep};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
