use std::cell::RefCell;
use std::rc::Rc;

use diagramkit_core::{ObjectId, Result, ToolError};
use diagramkit_designer::{
    CanvasObject, CanvasView, DispatchPhase, Key, Modifiers, MouseButton, Point, RawInput, Rect, RecordingPainter,
    Tool, ToolContext, ToolId, ViewItem,
};
use diagramkit_settings::EditorConfig;

type Log = Rc<RefCell<Vec<String>>>;

/// Test tool that records its hooks and starts only when told to.
struct Probe {
    name: &'static str,
    accept: std::result::Result<bool, ()>,
    log: Log,
}

impl Tool for Probe {
    fn id(&self) -> ToolId {
        ToolId::new(self.name)
    }

    fn can_start(&self, _ctx: &ToolContext<'_>) -> std::result::Result<bool, ToolError> {
        self.log.borrow_mut().push(format!("{}?", self.name));
        self.accept.map_err(|_| ToolError::Predicate {
            tool: self.name.to_string(),
            reason: "predicate failure".to_string(),
        })
    }

    fn start(&mut self, _ctx: &mut ToolContext<'_>) -> Result<()> {
        self.log.borrow_mut().push(format!("{}:start", self.name));
        Ok(())
    }

    fn stop(&mut self, _ctx: &mut ToolContext<'_>) {
        self.log.borrow_mut().push(format!("{}:stop", self.name));
    }

    fn mouse_up(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        self.log.borrow_mut().push(format!("{}:up", self.name));
        ctx.requests.stop = true;
        Ok(())
    }
}

fn down(x: f64, y: f64, t: u64) -> RawInput {
    RawInput::MouseDown {
        x,
        y,
        button: MouseButton::Left,
        modifiers: Modifiers::NONE,
        time_ms: t,
    }
}

fn mv(x: f64, y: f64, t: u64) -> RawInput {
    RawInput::MouseMove {
        x,
        y,
        modifiers: Modifiers::NONE,
        time_ms: t,
    }
}

fn up(x: f64, y: f64, t: u64) -> RawInput {
    RawInput::MouseUp {
        x,
        y,
        button: MouseButton::Left,
        modifiers: Modifiers::NONE,
        time_ms: t,
    }
}

fn key(key: Key) -> RawInput {
    RawInput::KeyDown {
        key,
        modifiers: Modifiers::NONE,
        time_ms: 0,
    }
}

fn view_with(rects: &[Rect]) -> (CanvasView, Vec<ObjectId>) {
    let mut view = CanvasView::new(EditorConfig::default());
    let layer = view.active_layer();
    let ids = rects
        .iter()
        .enumerate()
        .map(|(i, &r)| {
            view.edit(|doc| doc.add_object(layer, CanvasObject::rectangle(format!("r{}", i), r)))
                .unwrap()
        })
        .collect();
    (view, ids)
}

#[test]
fn test_dispatch_falls_through_to_first_willing_tool() {
    let (mut view, _) = view_with(&[]);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    for (name, accept) in [("a", Ok(false)), ("b", Err(())), ("c", Ok(true))] {
        view.tools_mut().register(
            Box::new(Probe {
                name,
                accept,
                log: Rc::clone(&log),
            }),
            &[],
        );
    }
    view.tools_mut()
        .set_candidates(DispatchPhase::Down, vec![ToolId::new("a"), ToolId::new("b"), ToolId::new("c")])
        .unwrap();

    assert!(view.handle_input(&down(10.0, 10.0, 0)));
    assert_eq!(view.tools().active(), Some(&ToolId::new("c")));
    assert!(view.handle_input(&up(10.0, 10.0, 5)));
    assert_eq!(view.tools().active(), None);

    assert_eq!(*log.borrow(), vec!["a?", "b?", "c?", "c:start", "c:up", "c:stop"]);
}

#[test]
fn test_unknown_candidate_is_rejected() {
    let (mut view, _) = view_with(&[]);
    let err = view
        .tools_mut()
        .set_candidates(DispatchPhase::Up, vec![ToolId::new("nope")])
        .unwrap_err();
    assert!(matches!(err, ToolError::UnknownTool { .. }));
    assert_eq!(view.tools().candidates(DispatchPhase::Up), &[ToolId::SELECT]);
}

#[test]
fn test_click_selects_and_click_on_empty_space_clears() {
    let (mut view, ids) = view_with(&[Rect::new(10.0, 10.0, 20.0, 20.0)]);
    view.handle_input(&down(15.0, 15.0, 0));
    view.handle_input(&up(15.0, 15.0, 10));
    assert_eq!(view.selection().members(), &[ids[0]]);

    view.handle_input(&down(300.0, 300.0, 2000));
    view.handle_input(&up(300.0, 300.0, 2010));
    assert!(view.selection().is_empty());
}

#[test]
fn test_move_drag_is_one_undoable_unit() {
    let (mut view, ids) = view_with(&[Rect::new(10.0, 10.0, 20.0, 20.0)]);
    let depth = view.document().history().undo_depth();

    view.handle_input(&down(15.0, 15.0, 0));
    view.handle_input(&mv(25.0, 15.0, 10));
    assert_eq!(view.tools().active(), Some(&ToolId::MOVE));
    view.handle_input(&mv(45.0, 35.0, 20));
    view.handle_input(&up(45.0, 35.0, 30));

    assert_eq!(view.tools().active(), None);
    assert_eq!(view.document().bounds(ids[0]), Some(Rect::new(40.0, 30.0, 20.0, 20.0)));
    assert_eq!(view.selection().members(), &[ids[0]]);
    assert_eq!(view.document().history().undo_depth(), depth + 1);
    assert_eq!(view.document().history().undo_name(), Some("Move Selection"));

    view.undo().unwrap();
    assert_eq!(view.document().bounds(ids[0]), Some(Rect::new(10.0, 10.0, 20.0, 20.0)));
}

#[test]
fn test_rubber_band_selects_contained_objects() {
    let (mut view, ids) = view_with(&[
        Rect::new(100.0, 100.0, 10.0, 10.0),
        Rect::new(140.0, 100.0, 10.0, 10.0),
        Rect::new(400.0, 400.0, 10.0, 10.0),
    ]);

    view.handle_input(&down(300.0, 300.0, 0));
    view.handle_input(&mv(200.0, 200.0, 10));
    assert_eq!(view.tools().active(), Some(&ToolId::RUBBER_BAND));
    view.handle_input(&mv(90.0, 90.0, 20));

    let mut painter = RecordingPainter::default();
    view.paint(&mut painter).unwrap();
    assert!(painter.view_items.iter().any(|i| matches!(i, ViewItem::Marquee(_))));

    view.handle_input(&up(90.0, 90.0, 30));
    assert_eq!(view.tools().active(), None);
    let mut selected = view.selection().members().to_vec();
    selected.sort();
    assert_eq!(selected, vec![ids[0], ids[1]]);

    let mut painter = RecordingPainter::default();
    view.paint(&mut painter).unwrap();
    assert!(!painter.view_items.iter().any(|i| matches!(i, ViewItem::Marquee(_))));
}

#[test]
fn test_resize_handle_drag() {
    let (mut view, ids) = view_with(&[Rect::new(100.0, 100.0, 50.0, 50.0)]);
    view.select_all().unwrap();

    view.handle_input(&down(150.0, 150.0, 0));
    assert_eq!(view.tools().active(), Some(&ToolId::RESIZE));
    view.handle_input(&mv(170.0, 180.0, 10));
    view.handle_input(&up(170.0, 180.0, 20));

    assert_eq!(view.document().bounds(ids[0]), Some(Rect::new(100.0, 100.0, 70.0, 80.0)));
    assert_eq!(view.document().history().undo_name(), Some("Resize"));
    view.undo().unwrap();
    assert_eq!(view.document().bounds(ids[0]), Some(Rect::new(100.0, 100.0, 50.0, 50.0)));
}

#[test]
fn test_middle_drag_pans() {
    let (mut view, _) = view_with(&[]);
    let middle = |kind: &str, x: f64, y: f64| match kind {
        "down" => RawInput::MouseDown {
            x,
            y,
            button: MouseButton::Middle,
            modifiers: Modifiers::NONE,
            time_ms: 0,
        },
        _ => RawInput::MouseUp {
            x,
            y,
            button: MouseButton::Middle,
            modifiers: Modifiers::NONE,
            time_ms: 0,
        },
    };

    view.handle_input(&middle("down", 100.0, 100.0));
    assert_eq!(view.tools().active(), Some(&ToolId::PAN));
    view.handle_input(&mv(150.0, 120.0, 10));
    assert_eq!(view.viewport().origin(), Point::new(-50.0, -20.0));
    view.handle_input(&middle("up", 160.0, 120.0));
    assert_eq!(view.viewport().origin(), Point::new(-60.0, -20.0));
    assert_eq!(view.tools().active(), None);
}

#[test]
fn test_modal_stroke_drawing() {
    let (mut view, _) = view_with(&[]);
    view.set_tool(Some(ToolId::DRAW_STROKE)).unwrap();
    assert!(view.tools().is_modal());

    for (i, (x, y)) in [(10.0, 10.0), (50.0, 10.0), (50.0, 50.0)].into_iter().enumerate() {
        let t = i as u64 * 1000;
        view.handle_input(&down(x, y, t));
        view.handle_input(&up(x, y, t + 10));
    }
    assert_eq!(view.tools().active(), Some(&ToolId::DRAW_STROKE));
    assert!(view.handle_input(&key(Key::Enter)));

    assert_eq!(view.tools().active(), None);
    assert_eq!(view.document().history().undo_name(), Some("Draw Stroke"));
    let id = view.selection().primary().unwrap();
    let stroke = view.document().object(id).unwrap().as_stroke().unwrap();
    assert_eq!(
        stroke.points(),
        &[Point::new(10.0, 10.0), Point::new(50.0, 10.0), Point::new(50.0, 50.0)]
    );

    view.undo().unwrap();
    assert!(!view.document().contains(id));
}

#[test]
fn test_escape_discards_stroke_in_progress() {
    let (mut view, _) = view_with(&[]);
    let depth = view.document().history().undo_depth();
    view.set_tool(Some(ToolId::DRAW_STROKE)).unwrap();
    view.handle_input(&down(10.0, 10.0, 0));
    view.handle_input(&up(10.0, 10.0, 10));
    view.handle_input(&down(30.0, 10.0, 1000));
    view.handle_input(&up(30.0, 10.0, 1010));
    assert_eq!(view.document().object_count(), 1);

    assert!(view.handle_input(&key(Key::Escape)));
    assert_eq!(view.tools().active(), None);
    assert_eq!(view.document().object_count(), 0);
    assert_eq!(view.document().history().undo_depth(), depth);
}

#[test]
fn test_focus_loss_cancels_move() {
    let (mut view, ids) = view_with(&[Rect::new(10.0, 10.0, 20.0, 20.0)]);
    let depth = view.document().history().undo_depth();

    view.handle_input(&down(15.0, 15.0, 0));
    view.handle_input(&mv(60.0, 60.0, 10));
    assert_eq!(view.document().bounds(ids[0]), Some(Rect::new(55.0, 55.0, 20.0, 20.0)));

    view.handle_input(&RawInput::FocusLost { time_ms: 20 });
    assert_eq!(view.tools().active(), None);
    assert!(!view.input().in_gesture());
    assert_eq!(view.document().bounds(ids[0]), Some(Rect::new(10.0, 10.0, 20.0, 20.0)));
    assert_eq!(view.document().history().undo_depth(), depth);
}

#[test]
fn test_tool_settings_patch() {
    let (mut view, _) = view_with(&[]);
    view.update_tool_settings(&ToolId::RUBBER_BAND, &serde_json::json!({ "style": "Intersects" }))
        .unwrap();
    assert_eq!(
        view.tools().settings(&ToolId::RUBBER_BAND).unwrap(),
        serde_json::json!({ "style": "Intersects" })
    );
    assert!(view
        .update_tool_settings(&ToolId::RUBBER_BAND, &serde_json::json!({ "colour": 1 }))
        .is_err());
    assert!(view
        .update_tool_settings(&ToolId::PAN, &serde_json::json!({}))
        .is_err());
}
