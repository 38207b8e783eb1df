use diagramkit_designer::{Point, Rect, Size, Viewport};
use diagramkit_settings::EditorConfig;
use proptest::prelude::*;

#[test]
fn test_viewport_from_config_uses_configured_range() {
    let mut config = EditorConfig::default();
    config.viewport.min_scale = 0.5;
    config.viewport.max_scale = 4.0;
    config.viewport.origin_x = -20.0;
    config.viewport.origin_y = 15.0;

    let mut vp = Viewport::from_config(&config, 640.0, 480.0);
    assert_eq!(vp.origin(), Point::new(-20.0, 15.0));
    assert_eq!(vp.scale_range(), (0.5, 4.0));

    vp.set_scale(100.0).unwrap();
    assert_eq!(vp.scale_x(), 4.0);
    vp.set_scale(0.01).unwrap();
    assert_eq!(vp.scale_x(), 0.5);
}

#[test]
fn test_anisotropic_scales_map_each_axis() {
    let mut vp = Viewport::new(800.0, 600.0);
    vp.set_scales(2.0, 0.5).unwrap();
    let v = vp.doc_to_view(Point::new(10.0, 10.0));
    assert_eq!(v, Point::new(20.0, 5.0));
    assert_eq!(vp.doc_to_view_size(Size::new(3.3, 3.3)), Size::new(7.0, 2.0));
}

#[test]
fn test_scroll_then_zoom_then_fit() {
    let mut vp = Viewport::new(400.0, 400.0);
    assert!(vp.scroll_by(50.0, -25.0).unwrap());
    assert_eq!(vp.origin(), Point::new(50.0, -25.0));

    vp.zoom_in().unwrap();
    assert!(vp.scale_x() > 1.0);
    vp.zoom_out().unwrap();
    assert!((vp.scale_x() - 1.0).abs() < 1e-9);

    let target = Rect::new(1000.0, 1000.0, 200.0, 100.0);
    vp.fit_to_bounds(target, 0.05).unwrap();
    assert!(vp.visible_doc_rect().contains_rect(&target));
}

#[test]
fn test_fit_to_flat_and_point_extents() {
    let mut vp = Viewport::new(400.0, 400.0);

    // A horizontal line has no height; its length alone sets the scale.
    assert!(vp.fit_to_bounds(Rect::new(100.0, 50.0, 200.0, 0.0), 0.05).unwrap());
    assert!((vp.scale_x() - 1.8).abs() < 1e-9);
    let center = vp.visible_doc_rect().center();
    assert!((center.x - 200.0).abs() < 1e-9 && (center.y - 50.0).abs() < 1e-9);

    // A point keeps the current scale and is only centered.
    assert!(vp.fit_to_bounds(Rect::new(500.0, 500.0, 0.0, 0.0), 0.05).unwrap());
    assert!((vp.scale_x() - 1.8).abs() < 1e-9);
    let center = vp.visible_doc_rect().center();
    assert!((center.x - 500.0).abs() < 1e-9 && (center.y - 500.0).abs() < 1e-9);
    assert!(!vp.fit_to_bounds(Rect::new(500.0, 500.0, 0.0, 0.0), 0.05).unwrap());
}

#[test]
fn test_visible_rect_tracks_origin_and_scale() {
    let mut vp = Viewport::new(200.0, 100.0);
    vp.set_scale(2.0).unwrap();
    vp.set_origin(Point::new(10.0, 10.0)).unwrap();
    assert_eq!(vp.visible_doc_rect(), Rect::new(10.0, 10.0, 100.0, 50.0));
}

proptest! {
    #[test]
    fn prop_transform_inverse_within_a_pixel(
        x in 0.0f64..2000.0,
        y in 0.0f64..2000.0,
        scale in 0.01f64..10.0,
        ox in -1.0e4f64..1.0e4,
        oy in -1.0e4f64..1.0e4,
    ) {
        let mut vp = Viewport::new(2000.0, 2000.0);
        vp.set_scale(scale).unwrap();
        vp.set_origin(Point::new(ox, oy)).unwrap();

        let p = Point::new(x, y);
        let back = vp.doc_to_view(vp.view_to_doc(p));
        prop_assert!((back.x - p.x).abs() <= 1.0);
        prop_assert!((back.y - p.y).abs() <= 1.0);

        let pixel = vp.doc_to_view_pixel(vp.view_to_doc(p));
        prop_assert!((pixel.x - p.x).abs() <= 1.0);
        prop_assert!((pixel.y - p.y).abs() <= 1.0);
    }

    #[test]
    fn prop_doc_rect_maps_to_covering_pixels(
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        w in 0.0f64..300.0,
        h in 0.0f64..300.0,
        scale in 0.1f64..8.0,
    ) {
        let mut vp = Viewport::new(1000.0, 1000.0);
        vp.set_scale(scale).unwrap();
        let doc = Rect::new(x, y, w, h);
        let pixels = vp.doc_to_view_rect(doc);
        prop_assert_eq!(pixels.x, pixels.x.floor());
        prop_assert_eq!(pixels.y, pixels.y.floor());
        let back = vp.view_to_doc_rect(pixels);
        prop_assert!(back.left() <= doc.left() + 1e-9);
        prop_assert!(back.top() <= doc.top() + 1e-9);
        prop_assert!(back.right() >= doc.right() - 1e-9);
        prop_assert!(back.bottom() >= doc.bottom() - 1e-9);
    }
}
