//! Randomized properties of rect clamping and the view transform.

use pcbcheck::editor::apply_drag;
use pcbcheck::editor::Handle;
use pcbcheck::{inflate_around, safe_rect, PointF, Rect, Size, ViewTransform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HANDLES: [Handle; 9] = [
    Handle::Body,
    Handle::N,
    Handle::S,
    Handle::E,
    Handle::W,
    Handle::NE,
    Handle::NW,
    Handle::SE,
    Handle::SW,
];

fn random_rect(rng: &mut StdRng) -> Rect {
    Rect::new(
        rng.random_range(-300..600),
        rng.random_range(-300..600),
        rng.random_range(-50..400),
        rng.random_range(-50..400),
    )
}

fn assert_safe(r: Rect, size: Size) {
    assert!(r.x >= 0 && r.y >= 0, "{r:?} in {size:?}");
    assert!(r.width >= 1 && r.height >= 1, "{r:?} in {size:?}");
    assert!(r.right() <= size.width as i32, "{r:?} in {size:?}");
    assert!(r.bottom() <= size.height as i32, "{r:?} in {size:?}");
}

#[test]
fn safe_rect_always_fits() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..5000 {
        let size = Size::new(rng.random_range(1..400), rng.random_range(1..400));
        assert_safe(safe_rect(random_rect(&mut rng), size), size);
    }
}

#[test]
fn safe_rect_is_identity_on_fitting_rects() {
    let mut rng = StdRng::seed_from_u64(12);
    for _ in 0..1000 {
        let size = Size::new(rng.random_range(2..300), rng.random_range(2..300));
        let x = rng.random_range(0..size.width as i32);
        let y = rng.random_range(0..size.height as i32);
        let w = rng.random_range(1..=size.width as i32 - x);
        let h = rng.random_range(1..=size.height as i32 - y);
        let r = Rect::new(x, y, w, h);
        assert_eq!(safe_rect(r, size), r);
    }
}

#[test]
fn inflate_around_keeps_center_and_scales_size() {
    let big = Size::new(100_000, 100_000);
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..1000 {
        let r = Rect::new(
            rng.random_range(20_000..40_000),
            rng.random_range(20_000..40_000),
            rng.random_range(1..500),
            rng.random_range(1..500),
        );
        let margin = rng.random_range(0.0..1.0);
        let grown = inflate_around(r, margin, big);
        let expected_w = (f64::from(r.width) * (1.0 + 2.0 * margin)).round() as i32;
        assert_eq!(grown.width, expected_w);
        let (cx, cy) = r.center();
        assert_eq!(grown.x, cx - grown.width / 2);
        assert_eq!(grown.y, cy - grown.height / 2);
    }
}

#[test]
fn inflate_around_zero_margin_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(14);
    for _ in 0..1000 {
        let size = Size::new(rng.random_range(1..300), rng.random_range(1..300));
        let once = inflate_around(random_rect(&mut rng), 0.0, size);
        assert_eq!(inflate_around(once, 0.0, size), once);
        assert_safe(once, size);
    }
}

#[test]
fn view_round_trip_within_a_pixel() {
    let mut rng = StdRng::seed_from_u64(15);
    for _ in 0..2000 {
        let view = ViewTransform::new(
            rng.random_range(0.1..20.0),
            PointF::new(rng.random_range(-500.0..500.0), rng.random_range(-500.0..500.0)),
        );
        let p = PointF::new(rng.random_range(0.0..2000.0), rng.random_range(0.0..2000.0));
        let back = view.view_to_img(view.img_to_view(p));
        assert!((back.x - p.x).abs() <= 1.0 && (back.y - p.y).abs() <= 1.0);
    }
}

#[test]
fn drags_never_leave_the_image() {
    let mut rng = StdRng::seed_from_u64(16);
    for _ in 0..5000 {
        let size = Size::new(rng.random_range(1..300), rng.random_range(1..300));
        let origin = safe_rect(random_rect(&mut rng), size);
        let handle = HANDLES[rng.random_range(0..HANDLES.len())];
        let dx = rng.random_range(-400..400);
        let dy = rng.random_range(-400..400);
        assert_safe(apply_drag(handle, origin, dx, dy, size), size);
    }
}
