use std::sync::{Arc, Mutex};
use std::thread;

use diagramkit_core::{EditorEvent, EventCategory, EventFilter, LayerId, ObjectId};
use diagramkit_designer::{
    CanvasObject, CanvasView, Damage, Document, DocumentCommand, DocumentFile, Modifiers, MouseButton, Point,
    RawInput, Rect, Stroke, StrokeStyle, Timer,
};
use diagramkit_settings::EditorConfig;

fn recorder(view: &CanvasView, filter: EventFilter) -> Arc<Mutex<Vec<EditorEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    view.event_bus().subscribe(filter, move |event| {
        sink.lock().unwrap().push(event);
    });
    events
}

fn refreshes(events: &Mutex<Vec<EditorEvent>>) -> usize {
    events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, EditorEvent::RefreshRequested))
        .count()
}

fn add_box(view: &mut CanvasView, rect: Rect) -> ObjectId {
    let layer = view.active_layer();
    view.edit(|doc| doc.add_object(layer, CanvasObject::rectangle("box", rect)))
        .unwrap()
}

fn mouse(kind: &str, x: f64, y: f64, t: u64) -> RawInput {
    match kind {
        "down" => RawInput::MouseDown {
            x,
            y,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
            time_ms: t,
        },
        "up" => RawInput::MouseUp {
            x,
            y,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
            time_ms: t,
        },
        _ => RawInput::MouseMove {
            x,
            y,
            modifiers: Modifiers::NONE,
            time_ms: t,
        },
    }
}

#[test]
fn test_nested_batches_refresh_once() {
    let mut view = CanvasView::new(EditorConfig::default());
    let events = recorder(&view, EventFilter::Categories(vec![EventCategory::View]));

    view.suspend_updates();
    view.suspend_updates();
    add_box(&mut view, Rect::new(0.0, 0.0, 10.0, 10.0));
    add_box(&mut view, Rect::new(50.0, 0.0, 10.0, 10.0));
    view.resume_updates();
    add_box(&mut view, Rect::new(0.0, 50.0, 10.0, 10.0));
    assert_eq!(refreshes(&events), 0);
    view.resume_updates();
    assert_eq!(refreshes(&events), 1);

    match view.take_damage() {
        Some(Damage::Region(r)) => assert!(r.contains_rect(&Rect::new(0.0, 0.0, 60.0, 60.0))),
        other => panic!("unexpected damage {:?}", other),
    }
    assert_eq!(view.take_damage(), None);
}

#[test]
fn test_each_edit_publishes_history_and_one_refresh() {
    let mut view = CanvasView::new(EditorConfig::default());
    let events = recorder(&view, EventFilter::All);

    let id = add_box(&mut view, Rect::new(0.0, 0.0, 10.0, 10.0));
    view.edit(|doc| doc.translate(id, 5.0, 0.0)).unwrap();
    view.undo().unwrap();

    let events = events.lock().unwrap();
    let history: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            EditorEvent::HistoryChanged {
                undo_depth,
                redo_depth,
            } => Some((*undo_depth, *redo_depth)),
            _ => None,
        })
        .collect();
    assert_eq!(history, vec![(1, 0), (2, 0), (1, 1)]);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, EditorEvent::RefreshRequested))
            .count(),
        3
    );
}

#[test]
fn test_selection_and_tool_events() {
    let mut view = CanvasView::new(EditorConfig::default());
    let id = add_box(&mut view, Rect::new(10.0, 10.0, 20.0, 20.0));
    let events = recorder(
        &view,
        EventFilter::Categories(vec![EventCategory::Selection, EventCategory::Tool]),
    );

    view.handle_input(&mouse("down", 15.0, 15.0, 0));
    view.handle_input(&mouse("up", 15.0, 15.0, 10));

    let events = events.lock().unwrap();
    assert!(events.contains(&EditorEvent::SelectionChanged {
        count: 1,
        primary: Some(id),
    }));
    assert!(events.contains(&EditorEvent::ToolChanged {
        from: None,
        to: Some("select".to_string()),
    }));
    assert!(events.contains(&EditorEvent::ToolChanged {
        from: Some("select".to_string()),
        to: None,
    }));
}

#[test]
fn test_clear_selection_reports_once() {
    let mut view = CanvasView::new(EditorConfig::default());
    add_box(&mut view, Rect::new(10.0, 10.0, 20.0, 20.0));
    add_box(&mut view, Rect::new(50.0, 10.0, 20.0, 20.0));
    assert_eq!(view.select_all().unwrap(), 2);
    let events = recorder(&view, EventFilter::Categories(vec![EventCategory::Selection]));

    view.clear_selection();
    view.clear_selection();

    assert!(view.selection().is_empty());
    assert_eq!(
        *events.lock().unwrap(),
        vec![EditorEvent::SelectionChanged { count: 0, primary: None }]
    );
}

#[test]
fn test_double_click_activates_object() {
    let mut view = CanvasView::new(EditorConfig::default());
    let id = add_box(&mut view, Rect::new(10.0, 10.0, 20.0, 20.0));
    let events = recorder(&view, EventFilter::Categories(vec![EventCategory::Interaction]));

    // The center of the box is clear of every selection handle.
    view.handle_input(&mouse("down", 20.0, 20.0, 0));
    view.handle_input(&mouse("up", 20.0, 20.0, 10));
    view.handle_input(&mouse("down", 20.0, 20.0, 100));
    view.handle_input(&mouse("up", 20.0, 20.0, 110));

    assert_eq!(*events.lock().unwrap(), vec![EditorEvent::ObjectActivated { id }]);
}

#[test]
fn test_double_click_on_handle_activates_without_resizing() {
    let mut view = CanvasView::new(EditorConfig::default());
    let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
    let id = add_box(&mut view, rect);
    view.handle_input(&mouse("down", 20.0, 20.0, 0));
    view.handle_input(&mouse("up", 20.0, 20.0, 10));
    let depth = view.document().history().undo_depth();
    let events = recorder(&view, EventFilter::Categories(vec![EventCategory::Interaction]));

    // Both clicks land on the top-left handle, so the resize tool takes them.
    view.handle_input(&mouse("down", 10.0, 10.0, 1000));
    assert_eq!(view.tools().active().map(|t| t.as_str()), Some("resize"));
    view.handle_input(&mouse("up", 10.0, 10.0, 1010));
    assert!(events.lock().unwrap().is_empty());
    view.handle_input(&mouse("down", 10.0, 10.0, 1100));
    view.handle_input(&mouse("up", 10.0, 10.0, 1110));

    assert_eq!(*events.lock().unwrap(), vec![EditorEvent::ObjectActivated { id }]);
    assert_eq!(view.document().bounds(id), Some(rect));
    assert_eq!(view.document().history().undo_depth(), depth);
}

#[test]
fn test_hover_fires_after_delay() {
    let mut view = CanvasView::new(EditorConfig::default());
    let id = add_box(&mut view, Rect::new(10.0, 10.0, 20.0, 20.0));
    let events = recorder(&view, EventFilter::Categories(vec![EventCategory::Interaction]));
    let delay = view.config().interaction.hover_delay_ms;

    view.handle_input(&mouse("move", 15.0, 15.0, 0));
    assert!(view.scheduler().is_pending(&Timer::Hover(Point::ORIGIN)));
    view.tick(delay / 2);
    assert!(events.lock().unwrap().is_empty());
    view.tick(delay);
    assert_eq!(*events.lock().unwrap(), vec![EditorEvent::ObjectHover { id }]);

    // Moving again restarts the wait; pressing a button drops it.
    view.handle_input(&mouse("move", 16.0, 15.0, delay + 10));
    view.handle_input(&mouse("down", 16.0, 15.0, delay + 20));
    assert!(!view.scheduler().is_pending(&Timer::Hover(Point::ORIGIN)));
    view.handle_input(&mouse("up", 16.0, 15.0, delay + 30));
}

#[test]
fn test_autoscroll_keeps_dragging_near_edge() {
    let mut view = CanvasView::new(EditorConfig::default());
    let id = add_box(&mut view, Rect::new(10.0, 10.0, 20.0, 20.0));
    let margin = view.config().interaction.autoscroll_margin_px;
    let delay = view.config().interaction.autoscroll_delay_ms;
    let width = view.viewport().view_size().width;

    view.handle_input(&mouse("down", 15.0, 15.0, 0));
    view.handle_input(&mouse("move", width - 5.0, 300.0, 10));
    let dragged = view.document().bounds(id).unwrap();
    assert!(view.scheduler().is_pending(&Timer::Autoscroll));

    view.tick(10 + delay);
    assert_eq!(view.viewport().origin(), Point::new(margin, 0.0));
    assert_eq!(view.document().bounds(id), Some(dragged.translate(margin, 0.0)));
    assert!(view.scheduler().is_pending(&Timer::Autoscroll));

    view.handle_input(&mouse("up", width - 5.0, 300.0, 20 + delay));
    assert!(!view.scheduler().is_pending(&Timer::Autoscroll));
    assert_eq!(view.document().history().undo_name(), Some("Move Selection"));
}

#[test]
fn test_wheel_zooms_around_pointer() {
    let mut view = CanvasView::new(EditorConfig::default());
    let events = recorder(&view, EventFilter::Categories(vec![EventCategory::View]));
    let anchor = Point::new(400.0, 300.0);
    let before = view.viewport().view_to_doc(anchor);

    assert!(view.handle_input(&RawInput::Wheel {
        x: anchor.x,
        y: anchor.y,
        delta: 1.0,
        modifiers: Modifiers::NONE,
        time_ms: 0,
    }));
    assert!((view.viewport().scale_x() - view.viewport().zoom_step()).abs() < 1e-9);
    let after = view.viewport().view_to_doc(anchor);
    assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
    assert!(events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, EditorEvent::ViewportChanged { .. })));
}

#[test]
fn test_commands_from_other_threads_run_in_order() {
    let mut view = CanvasView::new(EditorConfig::default());
    let sender = view.command_sender();

    let producer = thread::spawn(move || {
        sender.route(DocumentCommand::AddObject {
            layer: None,
            object: CanvasObject::rectangle("remote", Rect::new(0.0, 0.0, 10.0, 10.0)),
        });
        sender.send(DocumentCommand::SelectAll);
        sender.send(DocumentCommand::Nudge { dx: 3.0, dy: 4.0 });
    });
    producer.join().unwrap();
    assert_eq!(view.document().object_count(), 0);

    assert_eq!(view.pump_commands(), 3);
    let id = view.selection().primary().unwrap();
    assert_eq!(view.document().bounds(id), Some(Rect::new(3.0, 4.0, 10.0, 10.0)));

    // On the owner thread with nothing queued, commands run at once.
    view.submit(DocumentCommand::Undo).unwrap();
    assert_eq!(view.document().bounds(id), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
}

#[test]
fn test_set_document_resets_view_state() {
    let mut view = CanvasView::new(EditorConfig::default());
    add_box(&mut view, Rect::new(0.0, 0.0, 10.0, 10.0));
    view.select_all().unwrap();
    let events = recorder(&view, EventFilter::All);

    let mut replacement = Document::new("replacement");
    let layer = replacement.add_layer("top").unwrap();
    let previous = view.set_document(replacement);

    assert_eq!(previous.object_count(), 1);
    assert_eq!(view.document().name(), "replacement");
    assert!(view.selection().is_empty());
    assert_eq!(view.active_layer(), layer);
    assert_eq!(view.layers().document_layers().len(), 2);
    assert!(events.lock().unwrap().contains(&EditorEvent::DocumentReplaced {
        name: "replacement".to_string(),
    }));
    assert!(view.set_active_layer(LayerId(424_242)).is_err());
}

#[test]
fn test_saved_document_reopens_with_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.json");

    let mut view = CanvasView::new(EditorConfig::default());
    let id = add_box(&mut view, Rect::new(0.0, 0.0, 10.0, 10.0));
    let layer = view.active_layer();
    view.edit(|doc| {
        doc.add_object(
            layer,
            CanvasObject::stroke(
                "curve",
                Stroke::with_points(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)], StrokeStyle::Bezier),
            ),
        )
    })
    .unwrap();
    view.edit(|doc| doc.translate(id, 7.0, 0.0)).unwrap();

    let snapshot = view.document().to_snapshot(true).unwrap();
    DocumentFile::new(snapshot.clone()).save_to_file(&path).unwrap();

    let file = DocumentFile::load_from_file(&path).unwrap();
    assert_eq!(file.document, snapshot);
    let reopened = Document::from_snapshot(file.document, view.config().history.max_depth).unwrap();
    view.set_document(reopened);

    assert_eq!(view.document().object_count(), 2);
    assert_eq!(view.document().bounds(id), Some(Rect::new(7.0, 0.0, 10.0, 10.0)));
    view.undo().unwrap();
    assert_eq!(view.document().bounds(id), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
}

#[test]
fn test_zoom_to_fit_shows_everything() {
    let mut view = CanvasView::new(EditorConfig::default());
    add_box(&mut view, Rect::new(-500.0, -500.0, 100.0, 100.0));
    add_box(&mut view, Rect::new(2000.0, 1500.0, 100.0, 100.0));
    assert!(view.zoom_to_fit().unwrap());
    let extent = view.document().extent().unwrap();
    assert!(view.viewport().visible_doc_rect().contains_rect(&extent));
}
