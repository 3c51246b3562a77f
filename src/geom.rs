//! Integer image-space rectangles and float view-space geometry.
//!
//! `Rect` uses signed coordinates so that editing gestures can produce
//! transiently out-of-range values; every stored rect goes through
//! [`safe_rect`] before it is used, which restores the invariant
//! `x >= 0, y >= 0, w >= 1, h >= 1` and full containment in the image.

use serde::{Deserialize, Serialize};

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the size of an `image` buffer.
    pub fn of<P: image::Pixel>(img: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        let (width, height) = img.dimensions();
        Self { width, height }
    }
}

/// Axis-aligned integer rectangle `(x, y, width, height)` in image pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Integer center, rounding toward the top-left.
    pub fn center(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }

    /// Returns the rect moved by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Grows the rect around its center by `margin` of its size on each side.
    ///
    /// The result is not clamped; use [`inflate_around`] for a bounded window.
    pub fn inflated(&self, margin: f64) -> Self {
        let (cx, cy) = self.center();
        let width = (f64::from(self.width) * (1.0 + 2.0 * margin)).round() as i32;
        let height = (f64::from(self.height) * (1.0 + 2.0 * margin)).round() as i32;
        Self::new(
            cx.saturating_sub(width / 2),
            cy.saturating_sub(height / 2),
            width,
            height,
        )
    }
}

/// Clamps `rect` into an image of `size`.
///
/// The origin is clamped to the last valid pixel first, then width and height
/// are shrunk to fit and floored at one pixel.
pub fn safe_rect(rect: Rect, size: Size) -> Rect {
    let img_w = size.width.max(1).min(i32::MAX as u32) as i32;
    let img_h = size.height.max(1).min(i32::MAX as u32) as i32;
    let x = rect.x.clamp(0, img_w - 1);
    let y = rect.y.clamp(0, img_h - 1);
    let width = rect.width.min(img_w - x).max(1);
    let height = rect.height.min(img_h - y).max(1);
    Rect::new(x, y, width, height)
}

/// Expands `rect` by `margin` around its center and clamps it into `size`.
pub fn inflate_around(rect: Rect, margin: f64, size: Size) -> Rect {
    safe_rect(rect.inflated(margin), size)
}

/// Point in continuous coordinates (view or image space).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Float rectangle, used for view-space geometry handed to renderers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn from_corners(a: PointF, b: PointF) -> Self {
        Self {
            x: a.x,
            y: a.y,
            width: b.x - a.x,
            height: b.y - a.y,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Half-open containment test matching pixel-grid semantics.
    pub fn contains(&self, p: PointF) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Smallest rect covering both inputs.
    pub fn union(&self, other: &RectF) -> RectF {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        RectF {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{inflate_around, safe_rect, Rect, Size};

    #[test]
    fn safe_rect_pulls_origin_inside() {
        let size = Size::new(100, 50);
        let r = safe_rect(Rect::new(-10, 60, 30, 30), size);
        assert_eq!(r, Rect::new(0, 49, 30, 1));
    }

    #[test]
    fn edges_saturate_on_extreme_rects() {
        let r = Rect::new(i32::MAX - 600, 0, 1000, 10);
        assert_eq!(r.right(), i32::MAX);
        assert_eq!(r.center().0, i32::MAX - 100);
        assert_eq!(r.translated(1000, 0).x, i32::MAX);
        assert_eq!(
            safe_rect(r, Size::new(100, 80)),
            Rect::new(99, 0, 1, 10)
        );
    }

    #[test]
    fn safe_rect_floors_degenerate_sizes() {
        let size = Size::new(20, 20);
        assert_eq!(safe_rect(Rect::new(5, 5, 0, -3), size), Rect::new(5, 5, 1, 1));
    }

    #[test]
    fn inflate_around_keeps_center() {
        let size = Size::new(1000, 1000);
        let r = Rect::new(100, 200, 40, 20);
        let grown = inflate_around(r, 0.3, size);
        assert_eq!(grown.width, 64);
        assert_eq!(grown.height, 32);
        assert_eq!(grown.center(), r.center());
    }

    #[test]
    fn inflate_around_clamps_at_border() {
        let size = Size::new(50, 50);
        let grown = inflate_around(Rect::new(0, 0, 20, 20), 0.5, size);
        assert_eq!(safe_rect(grown, size), grown);
        assert_eq!(grown.x, 0);
        assert_eq!(grown.y, 0);
    }
}
