//! Editing commands and default key bindings of the view.

use diagramkit_core::{LayerId, ObjectId, Result};

use super::CanvasView;
use crate::input::{Key, RawInput};
use crate::model::CanvasObject;
use crate::tools::ToolId;

/// Work that can be queued from another thread and replayed on the view's
/// thread in arrival order.
#[derive(Debug, Clone)]
pub enum DocumentCommand {
    Input(RawInput),
    /// Adds an object; `None` targets the active layer.
    AddObject {
        layer: Option<LayerId>,
        object: CanvasObject,
    },
    RemoveObject(ObjectId),
    Translate {
        id: ObjectId,
        dx: f64,
        dy: f64,
    },
    Undo,
    Redo,
    SelectAll,
    DeleteSelection,
    Nudge {
        dx: f64,
        dy: f64,
    },
    SetTool(Option<ToolId>),
}

impl CanvasView {
    pub fn execute(&mut self, command: DocumentCommand) -> Result<()> {
        tracing::debug!("Executing {:?}", command);
        match command {
            DocumentCommand::Input(raw) => {
                self.handle_input(&raw);
            }
            DocumentCommand::AddObject { layer, object } => {
                let layer = layer.unwrap_or(self.active_layer);
                self.edit(|doc| doc.add_object(layer, object))?;
            }
            DocumentCommand::RemoveObject(id) => self.edit(|doc| doc.remove_object(id))?,
            DocumentCommand::Translate { id, dx, dy } => self.edit(|doc| doc.translate(id, dx, dy))?,
            DocumentCommand::Undo => {
                self.undo()?;
            }
            DocumentCommand::Redo => {
                self.redo()?;
            }
            DocumentCommand::SelectAll => {
                self.select_all()?;
            }
            DocumentCommand::DeleteSelection => {
                self.delete_selection()?;
            }
            DocumentCommand::Nudge { dx, dy } => {
                self.nudge(dx, dy)?;
            }
            DocumentCommand::SetTool(id) => self.set_tool(id)?,
        }
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool> {
        self.edit(|doc| doc.undo())
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.edit(|doc| doc.redo())
    }

    /// Removes every deletable selected object as one "Delete" unit.
    /// Returns how many were removed.
    pub fn delete_selection(&mut self) -> Result<usize> {
        let targets: Vec<ObjectId> = self
            .selection
            .members()
            .iter()
            .copied()
            .filter(|&id| {
                self.document
                    .object(id)
                    .is_some_and(|o| o.capabilities().deletable)
            })
            .collect();
        if targets.is_empty() {
            return Ok(0);
        }
        self.edit(|doc| {
            doc.transaction("Delete", |doc| {
                for &id in &targets {
                    doc.remove_object(id)?;
                }
                Ok(targets.len())
            })
        })
    }

    /// Moves the movable selected objects by a document-space delta as one
    /// "Nudge" unit. Returns how many moved.
    pub fn nudge(&mut self, dx: f64, dy: f64) -> Result<usize> {
        let targets: Vec<ObjectId> = self
            .selection
            .members()
            .iter()
            .copied()
            .filter(|&id| {
                self.document
                    .object(id)
                    .is_some_and(|o| o.capabilities().movable)
            })
            .collect();
        if targets.is_empty() {
            return Ok(0);
        }
        self.edit(|doc| {
            doc.transaction("Nudge", |doc| {
                for &id in &targets {
                    doc.translate(id, dx, dy)?;
                }
                Ok(targets.len())
            })
        })
    }

    /// Selects every selectable top-level object, subject to the count limit.
    pub fn select_all(&mut self) -> Result<usize> {
        self.step(|view| {
            let ids: Vec<ObjectId> = view
                .document
                .top_level_objects()
                .into_iter()
                .filter(|&id| {
                    view.document
                        .object(id)
                        .is_some_and(|o| o.capabilities().selectable)
                })
                .collect();
            view.selection.replace(&view.document, &ids)?;
            Ok(view.selection.len())
        })
    }

    pub fn clear_selection(&mut self) {
        self.invalid.suspend();
        self.selection.clear();
        self.finish_step();
    }

    /// Groups the selection and selects the new group.
    pub fn group_selection(&mut self) -> Result<Option<ObjectId>> {
        if self.selection.is_empty() {
            return Ok(None);
        }
        let members = self.selection.members().to_vec();
        self.step(|view| {
            let group = view.document.group(&members)?;
            view.selection.replace(&view.document, &[group])?;
            Ok(Some(group))
        })
    }

    /// Ungroups every selected group and selects the released children.
    pub fn ungroup_selection(&mut self) -> Result<Vec<ObjectId>> {
        let groups: Vec<ObjectId> = self
            .selection
            .members()
            .iter()
            .copied()
            .filter(|&id| self.document.object(id).is_some_and(|o| o.is_group()))
            .collect();
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        self.step(|view| {
            let children = view.document.transaction("Ungroup Selection", |doc| {
                let mut released = Vec::new();
                for &group in &groups {
                    released.extend(doc.ungroup(group)?);
                }
                Ok(released)
            })?;
            view.selection.replace(&view.document, &children)?;
            Ok(children)
        })
    }

    /// Default key bindings, used when no tool consumed the key.
    pub(super) fn handle_key(&mut self) -> Result<bool> {
        let event = self.input.current();
        let (Some(key), modifiers) = (event.key, event.modifiers) else {
            return Ok(false);
        };

        if key == Key::Escape {
            if self.with_context(|tools, ctx| tools.cancel(ctx)) {
                return Ok(true);
            }
            let had_selection = !self.selection.is_empty();
            self.selection.clear();
            return Ok(had_selection);
        }
        if self.with_context(|tools, ctx| tools.key(ctx)) {
            return Ok(true);
        }
        if self.tools.active().is_some() {
            // A gesture is in progress; editing now would interleave with it.
            return Ok(false);
        }

        let step = if modifiers.shift { 10.0 } else { 1.0 };
        match key {
            Key::Delete | Key::Backspace => Ok(self.delete_selection()? > 0),
            Key::Left => Ok(self.nudge(-step, 0.0)? > 0),
            Key::Right => Ok(self.nudge(step, 0.0)? > 0),
            Key::Up => Ok(self.nudge(0.0, -step)? > 0),
            Key::Down => Ok(self.nudge(0.0, step)? > 0),
            Key::Char(c) if modifiers.ctrl => match c.to_ascii_lowercase() {
                'z' if modifiers.shift => self.redo(),
                'z' => self.undo(),
                'y' => self.redo(),
                'a' => Ok(self.select_all()? > 0),
                _ => Ok(false),
            },
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::input::Modifiers;
    use diagramkit_settings::EditorConfig;

    fn key(key: Key, modifiers: Modifiers) -> RawInput {
        RawInput::KeyDown {
            key,
            modifiers,
            time_ms: 0,
        }
    }

    fn view_with_box() -> (CanvasView, ObjectId) {
        let mut view = CanvasView::new(EditorConfig::default());
        let layer = view.active_layer();
        let id = view
            .edit(|doc| doc.add_object(layer, CanvasObject::rectangle("box", Rect::new(0.0, 0.0, 10.0, 10.0))))
            .unwrap();
        (view, id)
    }

    #[test]
    fn test_arrow_nudges_selection() {
        let (mut view, id) = view_with_box();
        view.select_all().unwrap();
        assert!(view.handle_input(&key(Key::Right, Modifiers::NONE)));
        assert!(view.handle_input(&key(Key::Down, Modifiers::shift())));
        assert_eq!(view.document().bounds(id), Some(Rect::new(1.0, 10.0, 10.0, 10.0)));
        assert_eq!(view.document().history().undo_name(), Some("Nudge"));
    }

    #[test]
    fn test_ctrl_z_and_ctrl_y() {
        let (mut view, id) = view_with_box();
        assert!(view.handle_input(&key(Key::Char('z'), Modifiers::ctrl())));
        assert!(!view.document().contains(id));
        assert!(view.handle_input(&key(Key::Char('y'), Modifiers::ctrl())));
        assert!(view.document().contains(id));
    }

    #[test]
    fn test_delete_is_one_unit() {
        let (mut view, a) = view_with_box();
        let layer = view.active_layer();
        let b = view
            .edit(|doc| doc.add_object(layer, CanvasObject::rectangle("b", Rect::new(20.0, 0.0, 5.0, 5.0))))
            .unwrap();
        view.select_all().unwrap();
        assert!(view.handle_input(&key(Key::Delete, Modifiers::NONE)));
        assert_eq!(view.document().object_count(), 0);
        assert!(view.selection().is_empty());

        view.undo().unwrap();
        assert!(view.document().contains(a));
        assert!(view.document().contains(b));
    }

    #[test]
    fn test_escape_clears_selection_when_idle() {
        let (mut view, _) = view_with_box();
        view.select_all().unwrap();
        assert!(view.handle_input(&key(Key::Escape, Modifiers::NONE)));
        assert!(view.selection().is_empty());
    }

    #[test]
    fn test_group_then_ungroup_selection() {
        let (mut view, a) = view_with_box();
        let layer = view.active_layer();
        let b = view
            .edit(|doc| doc.add_object(layer, CanvasObject::rectangle("b", Rect::new(20.0, 0.0, 5.0, 5.0))))
            .unwrap();
        view.select_all().unwrap();
        let group = view.group_selection().unwrap().unwrap();
        assert_eq!(view.selection().members(), &[group]);

        let released = view.ungroup_selection().unwrap();
        assert_eq!(released, vec![a, b]);
        assert!(!view.document().contains(group));
    }
}
