//! # DiagramKit Designer
//!
//! The interactive core of a 2D diagram editor: a scrollable, zoomable
//! canvas showing a layered graph of objects that can be selected, moved,
//! resized and reshaped with mouse and keyboard, with every mutation
//! reversible.
//!
//! ## Core Components
//!
//! - **Viewport**: view/document coordinate transform with clamped scales
//! - **Document**: object arena, document layers, change notification
//! - **Change records & history**: reversible mutations, transactions, undo/redo
//! - **Layer stack**: paint order back to front, pick order front to back
//! - **Selection**: ordered members, primary, count limit, handles
//! - **Input**: raw host events canonicalized into gesture steps
//! - **Tools**: mode-less dispatch over candidate lists plus modal tools
//! - **View**: the composition root tying all of the above together
//!
//! ## Architecture
//!
//! ```text
//! CanvasView
//!   ├── Viewport          (transform)
//!   ├── InputCanonicalizer (raw -> canonical events)
//!   ├── ToolManager       (select, move, resize, rubber band, pan, draw)
//!   ├── SelectionManager  (members, handles)
//!   ├── LayerStack        (view layers + document layer order)
//!   └── Document
//!         ├── objects, layers
//!         └── UndoManager (change records, transactions)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use diagramkit_designer::{CanvasObject, CanvasView, Rect};
//! use diagramkit_settings::EditorConfig;
//!
//! let mut view = CanvasView::new(EditorConfig::default());
//! let layer = view.active_layer();
//! let id = view
//!     .edit(|doc| doc.add_object(layer, CanvasObject::rectangle("box", Rect::new(0.0, 0.0, 20.0, 10.0))))
//!     .unwrap();
//! assert_eq!(view.document().history().undo_name(), Some("object-inserted"));
//! view.undo().unwrap();
//! assert!(!view.document().contains(id));
//! ```

pub mod change;
pub mod document;
pub mod geometry;
pub mod history;
pub mod input;
pub mod layer;
pub mod model;
pub mod painter;
pub mod selection_manager;
pub mod serialization;
pub mod tools;
pub mod view;
pub mod viewport;

pub use change::{Change, ChangeEvent, ChangeOrigin, ChangePhase, ChangeRecord, ChangeTarget};
pub use document::{DocLayer, Document, ObserverId, ShapeState, Slot};
pub use geometry::{Point, Rect, Size};
pub use history::{CompoundEdit, HistorySnapshot, UndoManager};
pub use input::{
    Buttons, InputCanonicalizer, InputEvent, InputKind, Key, Modifiers, MouseButton, Phase, RawInput,
};
pub use layer::{Grid, LayerStack, PickParams, PickStyle, StackEntry, ViewItem, ViewLayer};
pub use model::{BoxShape, CanvasObject, CanvasShape, Capabilities, Shape, Stroke, StrokeStyle};
pub use painter::{Painter, RasterPainter, RecordingPainter};
pub use selection_manager::{handles_for, Handle, HandleKind, HandlePosition, SelectionEvent, SelectionManager};
pub use serialization::{DocumentFile, DocumentMetadata, DocumentSnapshot, FILE_FORMAT_VERSION};
pub use tools::{
    builtin_tools, DispatchPhase, DrawStrokeSettings, DrawStrokeTool, MoveTool, PanTool, ResizeTool,
    RubberBandSettings, RubberBandTool, SelectTool, Tool, ToolContext, ToolId, ToolManager, ToolRequests,
};
pub use view::{CanvasView, Damage, DocumentCommand, InvalidRegion, Scheduler, Timer};
pub use viewport::Viewport;
