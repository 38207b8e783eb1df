//! Named behavior flags for canvas objects.

use serde::{Deserialize, Serialize};

/// What the editor may do with an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub visible: bool,
    pub selectable: bool,
    pub printable: bool,
    pub movable: bool,
    /// Bounding-box handles may change the object's extents.
    pub resizable: bool,
    /// Individual points may be edited through point handles.
    pub reshapable: bool,
    pub deletable: bool,
    /// The object may be duplicated by drag-and-drop.
    pub copyable: bool,
}

impl Capabilities {
    /// Everything allowed.
    pub const ALL: Capabilities = Capabilities {
        visible: true,
        selectable: true,
        printable: true,
        movable: true,
        resizable: true,
        reshapable: true,
        deletable: true,
        copyable: true,
    };

    /// Visible and printable but otherwise inert.
    pub const LOCKED: Capabilities = Capabilities {
        visible: true,
        selectable: false,
        printable: true,
        movable: false,
        resizable: false,
        reshapable: false,
        deletable: false,
        copyable: false,
    };

    pub fn with_resizable(mut self, value: bool) -> Self {
        self.resizable = value;
        self
    }

    pub fn with_reshapable(mut self, value: bool) -> Self {
        self.reshapable = value;
        self
    }

    pub fn with_selectable(mut self, value: bool) -> Self {
        self.selectable = value;
        self
    }

    pub fn with_movable(mut self, value: bool) -> Self {
        self.movable = value;
        self
    }

    pub fn with_copyable(mut self, value: bool) -> Self {
        self.copyable = value;
        self
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}
