//! Selection of canvas objects and the handles drawn around them.
//!
//! The manager keeps an ordered member list with an optional primary and a
//! count limit. Membership changes are queued as [`SelectionEvent`]s for the
//! view to drain after each step. [`handles_for`] derives the bounding and
//! point handles the resize tool picks against.

use diagramkit_core::{ModelError, ObjectId, Result};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::geometry::{Point, Rect};
use crate::model::Shape;

/// Lifecycle notification raised by the selection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A batch of membership changes begins.
    Started,
    Added(ObjectId),
    Removed(ObjectId),
    PrimaryChanged(Option<ObjectId>),
    /// The batch opened by the matching `Started` is complete.
    Finished,
}

/// One of the eight bounding-box handle positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlePosition {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl HandlePosition {
    pub const ALL: [HandlePosition; 8] = [
        HandlePosition::TopLeft,
        HandlePosition::Top,
        HandlePosition::TopRight,
        HandlePosition::Right,
        HandlePosition::BottomRight,
        HandlePosition::Bottom,
        HandlePosition::BottomLeft,
        HandlePosition::Left,
    ];

    /// Where this handle sits on `rect`.
    pub fn anchor(&self, rect: &Rect) -> Point {
        let c = rect.center();
        match self {
            HandlePosition::TopLeft => Point::new(rect.left(), rect.top()),
            HandlePosition::Top => Point::new(c.x, rect.top()),
            HandlePosition::TopRight => Point::new(rect.right(), rect.top()),
            HandlePosition::Right => Point::new(rect.right(), c.y),
            HandlePosition::BottomRight => Point::new(rect.right(), rect.bottom()),
            HandlePosition::Bottom => Point::new(c.x, rect.bottom()),
            HandlePosition::BottomLeft => Point::new(rect.left(), rect.bottom()),
            HandlePosition::Left => Point::new(rect.left(), c.y),
        }
    }

    /// `rect` with the edges this handle controls moved to `to`. Dragging
    /// past the opposite edge flips the rectangle instead of inverting it.
    pub fn resize(&self, rect: &Rect, to: Point) -> Rect {
        let (mut l, mut t, mut r, mut b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
        match self {
            HandlePosition::TopLeft => {
                l = to.x;
                t = to.y;
            }
            HandlePosition::Top => t = to.y,
            HandlePosition::TopRight => {
                r = to.x;
                t = to.y;
            }
            HandlePosition::Right => r = to.x,
            HandlePosition::BottomRight => {
                r = to.x;
                b = to.y;
            }
            HandlePosition::Bottom => b = to.y,
            HandlePosition::BottomLeft => {
                l = to.x;
                b = to.y;
            }
            HandlePosition::Left => l = to.x,
        }
        Rect::from_points(Point::new(l, t), Point::new(r, b))
    }
}

/// What dragging a handle does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleKind {
    /// Resizes the owner's bounding box.
    Bounds(HandlePosition),
    /// Moves the stroke point at this index.
    Point(usize),
}

/// A selection handle in document space. Handles are drawn at a fixed
/// pixel size, so hit-testing them needs the current scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    pub owner: ObjectId,
    pub kind: HandleKind,
    pub position: Point,
}

/// Manages the set of selected top-level objects.
///
/// `SelectionManager` is responsible for:
/// - Tracking membership in recency order (oldest first)
/// - Designating a primary member, by default the most recently added one
/// - Enforcing the maximum count by evicting the least recently added members
/// - Reporting lifecycle notifications for the host UI
///
/// # Selection Model
///
/// - **Primary Selection**: `add` makes the new member primary; removing the
///   primary promotes the most recent remaining member
/// - **Batches**: operations touching several members are bracketed by
///   `Started`/`Finished` so observers can update once
/// - **Handles**: derived on demand by [`handles_for`], never stored
#[derive(Debug, Clone)]
pub struct SelectionManager {
    members: Vec<ObjectId>,
    primary: Option<ObjectId>,
    max_count: usize,
    events: Vec<SelectionEvent>,
}

impl SelectionManager {
    /// Creates an empty selection holding at most `max_count` members.
    ///
    /// # Examples
    ///
    /// ```
    /// use diagramkit_designer::selection_manager::SelectionManager;
    ///
    /// let selection = SelectionManager::new(10);
    /// assert!(selection.is_empty());
    /// assert_eq!(selection.primary(), None);
    /// ```
    pub fn new(max_count: usize) -> Self {
        Self {
            members: Vec::new(),
            primary: None,
            max_count: max_count.max(1),
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.members.contains(&id)
    }

    /// Members from least to most recently added.
    pub fn members(&self) -> &[ObjectId] {
        &self.members
    }

    pub fn primary(&self) -> Option<ObjectId> {
        self.primary
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Changes the limit, evicting the oldest members if now over it.
    pub fn set_max_count(&mut self, max_count: usize) {
        self.max_count = max_count.max(1);
        if self.members.len() > self.max_count {
            self.events.push(SelectionEvent::Started);
            self.evict();
            self.events.push(SelectionEvent::Finished);
        }
    }

    /// Adds a top-level selectable object and makes it primary.
    ///
    /// Re-adding a member refreshes its recency. Returns whether membership
    /// changed.
    ///
    /// # Errors
    ///
    /// Unknown objects, nested objects and objects without the `selectable`
    /// capability are rejected and the selection is left unchanged.
    pub fn add(&mut self, doc: &Document, id: ObjectId) -> Result<bool> {
        Self::check_selectable(doc, id)?;
        let added = self.insert(id);
        if self.members.len() > self.max_count {
            self.events.push(SelectionEvent::Started);
            self.evict();
            self.events.push(SelectionEvent::Finished);
        }
        Ok(added)
    }

    /// Adds several objects in one batch. Invalid ids fail the whole call
    /// before anything changes.
    pub fn add_all(&mut self, doc: &Document, ids: &[ObjectId]) -> Result<usize> {
        for &id in ids {
            Self::check_selectable(doc, id)?;
        }
        if ids.is_empty() {
            return Ok(0);
        }
        self.events.push(SelectionEvent::Started);
        let added = ids.iter().filter(|&&id| self.insert(id)).count();
        self.evict();
        self.events.push(SelectionEvent::Finished);
        Ok(added)
    }

    fn check_selectable(doc: &Document, id: ObjectId) -> Result<()> {
        let object = doc.object(id).ok_or(ModelError::UnknownObject { id })?;
        if object.parent().is_some() {
            return Err(ModelError::NotTopLevel { id }.into());
        }
        if !object.capabilities().selectable {
            return Err(ModelError::CapabilityDenied {
                id,
                capability: "selectable",
            }
            .into());
        }
        Ok(())
    }

    fn insert(&mut self, id: ObjectId) -> bool {
        let existed = if let Some(pos) = self.members.iter().position(|&m| m == id) {
            self.members.remove(pos);
            true
        } else {
            false
        };
        self.members.push(id);
        if !existed {
            self.events.push(SelectionEvent::Added(id));
        }
        self.change_primary(Some(id));
        !existed
    }

    fn evict(&mut self) {
        while self.members.len() > self.max_count {
            let oldest = self.members.remove(0);
            tracing::debug!("Selection limit {} evicts {}", self.max_count, oldest);
            self.events.push(SelectionEvent::Removed(oldest));
            if self.primary == Some(oldest) {
                let next = self.members.last().copied();
                self.change_primary(next);
            }
        }
    }

    fn change_primary(&mut self, primary: Option<ObjectId>) {
        if self.primary != primary {
            self.primary = primary;
            self.events.push(SelectionEvent::PrimaryChanged(primary));
        }
    }

    /// Removes a member. Removing the primary promotes the most recently
    /// added remaining member.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        let Some(pos) = self.members.iter().position(|&m| m == id) else {
            return false;
        };
        self.members.remove(pos);
        self.events.push(SelectionEvent::Removed(id));
        if self.primary == Some(id) {
            let next = self.members.last().copied();
            self.change_primary(next);
        }
        true
    }

    /// Adds the object if absent, removes it otherwise.
    pub fn toggle(&mut self, doc: &Document, id: ObjectId) -> Result<bool> {
        if self.contains(id) {
            self.remove(id);
            Ok(false)
        } else {
            self.add(doc, id)?;
            Ok(true)
        }
    }

    /// Makes an existing member primary without changing recency.
    pub fn set_primary(&mut self, id: ObjectId) -> Result<()> {
        if !self.contains(id) {
            return Err(ModelError::UnknownObject { id }.into());
        }
        self.change_primary(Some(id));
        Ok(())
    }

    pub fn clear(&mut self) {
        if self.members.is_empty() {
            return;
        }
        self.events.push(SelectionEvent::Started);
        for id in std::mem::take(&mut self.members) {
            self.events.push(SelectionEvent::Removed(id));
        }
        self.change_primary(None);
        self.events.push(SelectionEvent::Finished);
    }

    /// Replaces the selection with `ids` in one batch.
    pub fn replace(&mut self, doc: &Document, ids: &[ObjectId]) -> Result<()> {
        for &id in ids {
            Self::check_selectable(doc, id)?;
        }
        self.events.push(SelectionEvent::Started);
        let keep: Vec<ObjectId> = self
            .members
            .iter()
            .copied()
            .filter(|m| !ids.contains(m))
            .collect();
        for id in keep {
            self.remove(id);
        }
        for &id in ids {
            self.insert(id);
        }
        self.evict();
        self.events.push(SelectionEvent::Finished);
        Ok(())
    }

    /// Drops members that are no longer selectable top-level objects of
    /// `doc` (deleted, grouped, locked). Returns how many were dropped.
    pub fn prune(&mut self, doc: &Document) -> usize {
        let stale: Vec<ObjectId> = self
            .members
            .iter()
            .copied()
            .filter(|&id| Self::check_selectable(doc, id).is_err())
            .collect();
        for &id in &stale {
            self.remove(id);
        }
        stale.len()
    }

    /// Removes and returns pending lifecycle notifications.
    pub fn take_events(&mut self) -> Vec<SelectionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new(diagramkit_core::constants::MAX_SELECTION_COUNT)
    }
}

/// Handles for the current selection.
///
/// Resizable rectangles get the eight bounding handles. Reshapable strokes
/// get one handle per point, tagged with the point's index. Anything else
/// (groups, locked objects) gets none.
pub fn handles_for(doc: &Document, selection: &SelectionManager) -> Vec<Handle> {
    let mut handles = Vec::new();
    for &id in selection.members() {
        let Some(object) = doc.object(id) else {
            continue;
        };
        let caps = object.capabilities();
        match object.shape() {
            Shape::Rectangle(b) if caps.resizable => {
                handles.extend(HandlePosition::ALL.iter().map(|&pos| Handle {
                    owner: id,
                    kind: HandleKind::Bounds(pos),
                    position: pos.anchor(&b.rect),
                }));
            }
            Shape::Stroke(stroke) if caps.reshapable => {
                handles.extend(stroke.points().iter().enumerate().map(|(i, &p)| Handle {
                    owner: id,
                    kind: HandleKind::Point(i),
                    position: p,
                }));
            }
            _ => {}
        }
    }
    handles
}
