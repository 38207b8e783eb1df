use diagramkit_core::ObjectId;
use diagramkit_designer::{
    handles_for, CanvasObject, Capabilities, Document, HandleKind, Point, Rect, SelectionEvent, SelectionManager,
    Stroke, StrokeStyle,
};
use proptest::prelude::*;

fn doc_with_boxes(n: usize) -> (Document, Vec<ObjectId>) {
    let mut doc = Document::new("selection");
    let layer = doc.layers()[0].id();
    let ids = (0..n)
        .map(|i| {
            doc.add_object(
                layer,
                CanvasObject::rectangle(format!("box{}", i), Rect::new(i as f64 * 15.0, 0.0, 10.0, 10.0)),
            )
            .unwrap()
        })
        .collect();
    (doc, ids)
}

#[test]
fn test_count_limit_evicts_oldest() {
    let (doc, ids) = doc_with_boxes(5);
    let mut selection = SelectionManager::new(3);
    for &id in &ids {
        selection.add(&doc, id).unwrap();
    }
    assert_eq!(selection.members(), &ids[2..]);
    assert_eq!(selection.primary(), Some(ids[4]));

    let events = selection.take_events();
    assert!(events.contains(&SelectionEvent::Removed(ids[0])));
    assert!(events.contains(&SelectionEvent::Removed(ids[1])));
}

#[test]
fn test_readding_refreshes_recency() {
    let (doc, ids) = doc_with_boxes(4);
    let mut selection = SelectionManager::new(3);
    selection.add(&doc, ids[0]).unwrap();
    selection.add(&doc, ids[1]).unwrap();
    selection.add(&doc, ids[2]).unwrap();
    assert!(!selection.add(&doc, ids[0]).unwrap());
    selection.add(&doc, ids[3]).unwrap();
    assert_eq!(selection.members(), &[ids[2], ids[0], ids[3]]);
}

#[test]
fn test_lowering_limit_trims_selection() {
    let (doc, ids) = doc_with_boxes(4);
    let mut selection = SelectionManager::new(10);
    selection.add_all(&doc, &ids).unwrap();
    selection.take_events();

    selection.set_max_count(2);
    assert_eq!(selection.members(), &ids[2..]);
    let events = selection.take_events();
    assert_eq!(events.first(), Some(&SelectionEvent::Started));
    assert_eq!(events.last(), Some(&SelectionEvent::Finished));
}

#[test]
fn test_prune_drops_deleted_and_locked_members() {
    let (mut doc, ids) = doc_with_boxes(3);
    let mut selection = SelectionManager::new(10);
    selection.add_all(&doc, &ids).unwrap();

    doc.remove_object(ids[0]).unwrap();
    doc.set_capabilities(ids[1], Capabilities::default().with_selectable(false))
        .unwrap();
    assert_eq!(selection.prune(&doc), 2);
    assert_eq!(selection.members(), &[ids[2]]);
    assert_eq!(selection.primary(), Some(ids[2]));
}

#[test]
fn test_add_all_rejects_whole_batch_on_bad_id() {
    let (doc, ids) = doc_with_boxes(2);
    let mut selection = SelectionManager::new(10);
    assert!(selection.add_all(&doc, &[ids[0], ObjectId(9999)]).is_err());
    assert!(selection.is_empty());
    assert!(selection.take_events().is_empty());
}

#[test]
fn test_handles_for_mixed_selection() {
    let (mut doc, ids) = doc_with_boxes(1);
    let layer = doc.layers()[0].id();
    let stroke = doc
        .add_object(
            layer,
            CanvasObject::stroke(
                "zig",
                Stroke::with_points(
                    vec![Point::new(0.0, 50.0), Point::new(10.0, 60.0), Point::new(20.0, 50.0)],
                    StrokeStyle::Straight,
                ),
            ),
        )
        .unwrap();
    let mut selection = SelectionManager::new(10);
    selection.add_all(&doc, &[ids[0], stroke]).unwrap();

    let handles = handles_for(&doc, &selection);
    let bounds = handles.iter().filter(|h| matches!(h.kind, HandleKind::Bounds(_))).count();
    let points: Vec<_> = handles
        .iter()
        .filter_map(|h| match h.kind {
            HandleKind::Point(i) => Some((i, h.position)),
            _ => None,
        })
        .collect();
    assert_eq!(bounds, 8);
    assert_eq!(points, vec![(0, Point::new(0.0, 50.0)), (1, Point::new(10.0, 60.0)), (2, Point::new(20.0, 50.0))]);
}

proptest! {
    #[test]
    fn prop_count_never_exceeds_limit(
        limit in 1usize..6,
        picks in prop::collection::vec(0usize..8, 1..30),
    ) {
        let (doc, ids) = doc_with_boxes(8);
        let mut selection = SelectionManager::new(limit);
        let mut order: Vec<ObjectId> = Vec::new();
        for pick in picks {
            let id = ids[pick];
            selection.add(&doc, id).unwrap();
            order.retain(|&m| m != id);
            order.push(id);

            prop_assert!(selection.len() <= limit);
            let keep = order.len().saturating_sub(limit);
            prop_assert_eq!(selection.members(), &order[keep..]);
            prop_assert_eq!(selection.primary(), Some(id));
        }
    }
}
