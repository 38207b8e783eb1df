use diagramkit_designer::{
    CanvasObject, Document, Grid, LayerStack, PickParams, PickStyle, Point, RecordingPainter, Rect, Stroke,
    StrokeStyle, ViewItem,
};
use proptest::prelude::*;

fn everything() -> Rect {
    Rect::new(-1.0e6, -1.0e6, 2.0e6, 2.0e6)
}

fn two_layer_doc(rects: &[(f64, f64, f64, f64, bool)]) -> (Document, LayerStack) {
    let mut doc = Document::new("picking");
    let lower = doc.layers()[0].id();
    let upper = doc.add_layer("upper").unwrap();
    for (i, &(x, y, w, h, on_upper)) in rects.iter().enumerate() {
        let layer = if on_upper { upper } else { lower };
        doc.add_object(layer, CanvasObject::rectangle(format!("r{}", i), Rect::new(x, y, w, h)))
            .unwrap();
    }
    let mut stack = LayerStack::new();
    stack.sync_with_document(&doc);
    (doc, stack)
}

#[test]
fn test_upper_layer_wins_pick() {
    let (doc, stack) = two_layer_doc(&[(0.0, 0.0, 50.0, 50.0, true), (0.0, 0.0, 100.0, 100.0, false)]);
    let top = stack.pick_top_at(&doc, Point::new(10.0, 10.0), PickParams::default());
    let upper = doc.layers()[1].objects()[0];
    assert_eq!(top, Some(upper));

    let all = stack.pick_all_at(&doc, Point::new(10.0, 10.0), PickParams::default(), 10);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], upper);
}

#[test]
fn test_hidden_document_layer_is_neither_painted_nor_picked() {
    let (doc, mut stack) = two_layer_doc(&[(0.0, 0.0, 50.0, 50.0, true), (0.0, 0.0, 50.0, 50.0, false)]);
    let upper_layer = doc.layers()[1].id();
    let lower_object = doc.layers()[0].objects()[0];
    stack.set_layer_visible(upper_layer, false);

    let mut painter = RecordingPainter::default();
    assert_eq!(stack.paint(&doc, &mut painter, everything()).unwrap(), 1);
    assert_eq!(painter.objects, vec![lower_object]);
    assert_eq!(
        stack.pick_top_at(&doc, Point::new(5.0, 5.0), PickParams::default()),
        Some(lower_object)
    );
}

#[test]
fn test_stroke_pick_honors_tolerance() {
    let mut doc = Document::new("strokes");
    let layer = doc.layers()[0].id();
    let line = doc
        .add_object(
            layer,
            CanvasObject::stroke(
                "line",
                Stroke::with_points(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)], StrokeStyle::Straight),
            ),
        )
        .unwrap();
    let mut stack = LayerStack::new();
    stack.sync_with_document(&doc);

    let near = Point::new(50.0, 2.0);
    let strict = PickParams::default();
    let loose = PickParams {
        tolerance: 3.0,
        ..PickParams::default()
    };
    assert_eq!(stack.pick_top_at(&doc, near, strict), None);
    assert_eq!(stack.pick_top_at(&doc, near, loose), Some(line));
}

#[test]
fn test_rectangle_pick_returns_topmost_first() {
    let (doc, stack) = two_layer_doc(&[
        (0.0, 0.0, 10.0, 10.0, false),
        (20.0, 0.0, 10.0, 10.0, false),
        (40.0, 0.0, 10.0, 10.0, true),
    ]);
    let picked = stack.pick_in_rectangle(&doc, Rect::new(-1.0, -1.0, 100.0, 20.0), PickStyle::Contained, true);
    let lower = doc.layers()[0].objects();
    let upper = doc.layers()[1].objects();
    assert_eq!(picked, vec![upper[0], lower[1], lower[0]]);
}

#[test]
fn test_grid_is_painted_below_documents_and_handles_above() {
    let (doc, mut stack) = two_layer_doc(&[(0.0, 0.0, 10.0, 10.0, false)]);
    let mut stack_with_grid = LayerStack::with_grid(Grid::new(10.0, 10.0), true);
    stack_with_grid.sync_with_document(&doc);
    stack_with_grid.set_feedback(Some(ViewItem::Marquee(Rect::new(0.0, 0.0, 5.0, 5.0))));

    let mut painter = RecordingPainter::default();
    stack_with_grid.paint(&doc, &mut painter, everything()).unwrap();
    assert!(matches!(painter.view_items.first(), Some(ViewItem::Grid(_))));
    assert!(matches!(painter.view_items.last(), Some(ViewItem::Marquee(_))));

    stack.set_feedback(None);
    let mut plain = RecordingPainter::default();
    stack.paint(&doc, &mut plain, everything()).unwrap();
    assert!(plain.view_items.is_empty());
}

fn rect_strategy() -> impl Strategy<Value = (f64, f64, f64, f64, bool)> {
    (0.0f64..200.0, 0.0f64..200.0, 1.0f64..80.0, 1.0f64..80.0, any::<bool>())
}

proptest! {
    #[test]
    fn prop_pick_order_is_reverse_paint_order(
        rects in prop::collection::vec(rect_strategy(), 1..16),
        px in 0.0f64..280.0,
        py in 0.0f64..280.0,
    ) {
        let (doc, stack) = two_layer_doc(&rects);
        let p = Point::new(px, py);

        let mut painter = RecordingPainter::default();
        stack.paint(&doc, &mut painter, everything()).unwrap();
        let expected: Vec<_> = painter
            .objects
            .iter()
            .rev()
            .copied()
            .filter(|&id| doc.hit_test(id, p, 0.0))
            .collect();

        let picked = stack.pick_all_at(&doc, p, PickParams::default(), usize::MAX);
        prop_assert_eq!(picked, expected);
    }
}
