use diagramkit_core::{Error, HistoryError, ModelError};
use diagramkit_designer::{
    CanvasObject, ChangeOrigin, ChangePhase, Document, Point, Rect, Stroke, StrokeStyle,
};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

fn square() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        Point::new(0.0, 10.0),
    ]
}

fn doc_with_stroke(points: Vec<Point>) -> (Document, diagramkit_core::ObjectId) {
    let mut doc = Document::new("test");
    let layer = doc.layers()[0].id();
    let id = doc
        .add_object(
            layer,
            CanvasObject::stroke("curve", Stroke::with_points(points, StrokeStyle::Straight)),
        )
        .unwrap();
    (doc, id)
}

fn points_of(doc: &Document, id: diagramkit_core::ObjectId) -> Vec<Point> {
    doc.object(id).unwrap().as_stroke().unwrap().points().to_vec()
}

#[test]
fn test_curve_edit_then_undo() {
    let (mut doc, id) = doc_with_stroke(square());
    doc.insert_point(id, 2, Point::new(20.0, 5.0)).unwrap();

    let edited = points_of(&doc, id);
    assert_eq!(edited.len(), 5);
    assert_eq!(edited[2], Point::new(20.0, 5.0));

    assert!(doc.undo().unwrap());
    assert_eq!(points_of(&doc, id), square());
}

#[test]
fn test_transactional_abort() {
    let mut doc = Document::new("test");
    let layer = doc.layers()[0].id();
    let a = doc
        .add_object(layer, CanvasObject::rectangle("a", Rect::new(0.0, 0.0, 10.0, 10.0)))
        .unwrap();
    let b = doc
        .add_object(layer, CanvasObject::rectangle("b", Rect::new(50.0, 0.0, 10.0, 10.0)))
        .unwrap();
    let depth = doc.history().undo_depth();

    doc.start_transaction();
    doc.translate(a, 5.0, 5.0).unwrap();
    doc.translate(b, -3.0, 0.0).unwrap();
    doc.abort_transaction().unwrap();

    assert_eq!(doc.bounds(a), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    assert_eq!(doc.bounds(b), Some(Rect::new(50.0, 0.0, 10.0, 10.0)));
    assert_eq!(doc.history().undo_depth(), depth);
    assert!(!doc.history().can_redo());
}

#[test]
fn test_undo_redo_round_trip_of_transaction() {
    let (mut doc, id) = doc_with_stroke(square());
    let before = points_of(&doc, id);

    doc.transaction("Edit Curve", |doc| {
        doc.add_point(id, Point::new(-5.0, 5.0))?;
        doc.set_point(id, 0, Point::new(1.0, 1.0))?;
        doc.remove_point(id, 1)?;
        doc.translate(id, 2.0, 3.0)?;
        doc.set_stroke_style(id, StrokeStyle::Bezier)?;
        Ok(())
    })
    .unwrap();
    let after = points_of(&doc, id);
    assert_eq!(doc.history().undo_name(), Some("Edit Curve"));

    doc.undo().unwrap();
    assert_eq!(points_of(&doc, id), before);
    assert_eq!(doc.object(id).unwrap().as_stroke().unwrap().style(), StrokeStyle::Straight);

    doc.redo().unwrap();
    assert_eq!(points_of(&doc, id), after);
    assert_eq!(doc.object(id).unwrap().as_stroke().unwrap().style(), StrokeStyle::Bezier);
}

#[test]
fn test_new_edit_clears_redo() {
    let (mut doc, id) = doc_with_stroke(square());
    doc.add_point(id, Point::new(1.0, 1.0)).unwrap();
    doc.undo().unwrap();
    assert!(doc.history().can_redo());
    doc.add_point(id, Point::new(2.0, 2.0)).unwrap();
    assert!(!doc.history().can_redo());
}

#[test]
fn test_empty_transaction_leaves_no_entry() {
    let (mut doc, _) = doc_with_stroke(square());
    let depth = doc.history().undo_depth();
    doc.start_transaction();
    assert!(!doc.finish_transaction("Nothing").unwrap());
    assert_eq!(doc.history().undo_depth(), depth);
}

#[test]
fn test_finish_without_transaction_fails() {
    let mut doc = Document::new("test");
    let err = doc.finish_transaction("x").unwrap_err();
    assert!(matches!(err, Error::History(HistoryError::NoTransaction)));
}

#[test]
fn test_undo_with_open_transaction_fails() {
    let (mut doc, id) = doc_with_stroke(square());
    doc.start_transaction();
    doc.add_point(id, Point::new(3.0, 3.0)).unwrap();
    assert!(matches!(
        doc.undo(),
        Err(Error::History(HistoryError::TransactionOpen { .. }))
    ));
    doc.abort_transaction().unwrap();
    assert_eq!(points_of(&doc, id), square());
}

#[test]
fn test_invalid_index_leaves_model_unchanged() {
    let (mut doc, id) = doc_with_stroke(square());
    let depth = doc.history().undo_depth();
    let version = doc.version();
    let err = doc.insert_point(id, 9, Point::new(0.0, 0.0)).unwrap_err();
    assert!(matches!(
        err,
        Error::Model(ModelError::IndexOutOfRange { index: 9, len: 4 })
    ));
    assert!(doc.insert_point(id, 1, Point::new(f64::NAN, 0.0)).is_err());
    assert_eq!(points_of(&doc, id), square());
    assert_eq!(doc.history().undo_depth(), depth);
    assert_eq!(doc.version(), version);
}

#[test]
fn test_observers_see_changing_then_changed() {
    let (mut doc, id) = doc_with_stroke(square());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    doc.subscribe(move |event| {
        sink.borrow_mut().push((event.phase, event.origin, event.record.change.hint()));
    });

    doc.set_point(id, 0, Point::new(-1.0, -1.0)).unwrap();
    doc.undo().unwrap();

    let seen = seen.borrow();
    assert_eq!(
        seen.as_slice(),
        &[
            (ChangePhase::Changing, ChangeOrigin::Edit, "point-modified"),
            (ChangePhase::Changed, ChangeOrigin::Edit, "point-modified"),
            (ChangePhase::Changing, ChangeOrigin::Undo, "point-modified"),
            (ChangePhase::Changed, ChangeOrigin::Undo, "point-modified"),
        ]
    );
}

#[test]
fn test_remove_and_undo_restores_group_subtree() {
    let mut doc = Document::new("test");
    let layer = doc.layers()[0].id();
    let a = doc
        .add_object(layer, CanvasObject::rectangle("a", Rect::new(0.0, 0.0, 5.0, 5.0)))
        .unwrap();
    let b = doc
        .add_object(layer, CanvasObject::rectangle("b", Rect::new(10.0, 0.0, 5.0, 5.0)))
        .unwrap();
    let group = doc.group(&[a, b]).unwrap();
    assert_eq!(doc.object(a).unwrap().parent(), Some(group));

    doc.remove_object(group).unwrap();
    assert!(!doc.contains(a));
    doc.undo().unwrap();
    assert_eq!(doc.object(group).unwrap().children(), &[a, b]);
    assert_eq!(doc.bounds(group), Some(Rect::new(0.0, 0.0, 15.0, 5.0)));
}

#[test]
fn test_group_into_own_descendant_is_rejected() {
    let mut doc = Document::new("test");
    let layer = doc.layers()[0].id();
    let a = doc
        .add_object(layer, CanvasObject::rectangle("a", Rect::new(0.0, 0.0, 5.0, 5.0)))
        .unwrap();
    let outer = doc.group(&[a]).unwrap();
    let inner_slot = doc.slot_of(a).unwrap();
    let err = doc
        .move_to(
            outer,
            diagramkit_designer::Slot {
                parent: Some(a),
                ..inner_slot
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Model(ModelError::CyclicGrouping { .. }) | Error::Model(ModelError::WrongKind { .. })
    ));
}

#[test]
fn test_undo_restores_translated_box_exactly() {
    let mut doc = Document::new("test");
    let layer = doc.layers()[0].id();
    let original = Rect::new(0.1, 0.7, 10.0, 10.0);
    let a = doc
        .add_object(layer, CanvasObject::rectangle("a", original))
        .unwrap();

    doc.translate(a, 0.2, 1e-3).unwrap();
    let moved = doc.bounds(a).unwrap();
    doc.undo().unwrap();
    assert_eq!(doc.bounds(a), Some(original));
    doc.redo().unwrap();
    assert_eq!(doc.bounds(a), Some(moved));
}

#[test]
fn test_move_into_group_on_other_layer_is_rejected() {
    let mut doc = Document::new("test");
    let l1 = doc.layers()[0].id();
    let l2 = doc.add_layer("upper").unwrap();
    let a = doc
        .add_object(l1, CanvasObject::rectangle("a", Rect::new(0.0, 0.0, 5.0, 5.0)))
        .unwrap();
    let group = doc.group(&[a]).unwrap();
    let x = doc
        .add_object(l2, CanvasObject::rectangle("x", Rect::new(20.0, 0.0, 5.0, 5.0)))
        .unwrap();

    let err = doc
        .move_to(
            x,
            diagramkit_designer::Slot {
                layer: l2,
                parent: Some(group),
                index: 0,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Model(ModelError::ParentLayerMismatch { parent, .. }) if parent == group
    ));
    assert_eq!(doc.object(x).unwrap().layer(), l2);
    assert_eq!(doc.object(x).unwrap().parent(), None);

    doc.move_to(
        x,
        diagramkit_designer::Slot {
            layer: l1,
            parent: Some(group),
            index: 1,
        },
    )
    .unwrap();
    assert_eq!(doc.object(x).unwrap().layer(), l1);
    let restored = Document::from_json(&doc.to_json(true).unwrap(), 100).unwrap();
    assert_eq!(restored.object(group).unwrap().children(), &[a, x]);
}

proptest! {
    #[test]
    fn prop_insert_then_remove_is_identity(
        raw in prop::collection::vec((-1.0e3f64..1.0e3, -1.0e3f64..1.0e3), 0..12),
        px in -1.0e3f64..1.0e3,
        py in -1.0e3f64..1.0e3,
        index_seed in any::<usize>(),
    ) {
        let points: Vec<Point> = raw.into_iter().map(|(x, y)| Point::new(x, y)).collect();
        let (mut doc, id) = doc_with_stroke(points.clone());
        let index = index_seed % (points.len() + 1);

        doc.insert_point(id, index, Point::new(px, py)).unwrap();
        let removed = doc.remove_point(id, index).unwrap();
        prop_assert_eq!(removed, Point::new(px, py));
        prop_assert_eq!(points_of(&doc, id), points);
    }

    #[test]
    fn prop_undo_restores_and_redo_reapplies(
        deltas in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 1..8),
    ) {
        let (mut doc, id) = doc_with_stroke(square());
        let before = points_of(&doc, id);
        doc.start_transaction();
        for (i, (dx, dy)) in deltas.iter().enumerate() {
            if i % 2 == 0 {
                doc.translate(id, *dx, *dy).unwrap();
            } else {
                doc.add_point(id, Point::new(*dx, *dy)).unwrap();
            }
        }
        doc.finish_transaction("Batch").unwrap();
        let after = points_of(&doc, id);

        doc.undo().unwrap();
        prop_assert_eq!(points_of(&doc, id), before);
        doc.redo().unwrap();
        prop_assert_eq!(points_of(&doc, id), after.clone());
        doc.undo().unwrap();
        doc.redo().unwrap();
        prop_assert_eq!(points_of(&doc, id), after);
    }
}
