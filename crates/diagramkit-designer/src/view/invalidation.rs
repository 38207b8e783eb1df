//! Batched repaint invalidation.
//!
//! Mutations add dirty rectangles; nothing is sent to the host until the
//! outermost `resume` brings the suspend counter back to zero, which yields
//! exactly one refresh for the whole batch.

use crate::geometry::Rect;

/// What needs repainting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damage {
    /// The whole view (viewport moved, view-layer content changed).
    Full,
    /// A document-space region.
    Region(Rect),
}

#[derive(Debug, Clone, Default)]
pub struct InvalidRegion {
    dirty: Option<Rect>,
    full: bool,
    suspended: usize,
    pending: Option<Damage>,
}

impl InvalidRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self, rect: Rect) {
        if !rect.is_finite() {
            return;
        }
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(&rect),
            None => rect,
        });
    }

    pub fn invalidate_all(&mut self) {
        self.full = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.full || self.dirty.is_some()
    }

    pub fn suspend(&mut self) {
        self.suspended += 1;
    }

    /// Returns true when this call closed the outermost suspension and
    /// something was dirty, i.e. when the host must be asked to refresh.
    pub fn resume(&mut self) -> bool {
        if self.suspended == 0 {
            tracing::warn!("resume_updates called without matching suspend");
            return false;
        }
        self.suspended -= 1;
        if self.suspended > 0 {
            return false;
        }
        self.flush()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended > 0
    }

    pub fn depth(&self) -> usize {
        self.suspended
    }

    /// Moves accumulated damage into the pending refresh. Returns whether
    /// anything was dirty.
    pub fn flush(&mut self) -> bool {
        let damage = if std::mem::take(&mut self.full) {
            Damage::Full
        } else if let Some(rect) = self.dirty {
            Damage::Region(rect)
        } else {
            return false;
        };
        self.dirty = None;
        self.pending = Some(match (self.pending, damage) {
            (Some(Damage::Region(a)), Damage::Region(b)) => Damage::Region(a.union(&b)),
            (Some(Damage::Full), _) | (_, Damage::Full) => Damage::Full,
            (None, damage) => damage,
        });
        true
    }

    /// The damage the host has been asked to repaint, cleared on read.
    pub fn take_pending(&mut self) -> Option<Damage> {
        self.pending.take()
    }
}
