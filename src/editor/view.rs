//! Image/view coordinate mapping with zoom and pan.

use crate::geom::{PointF, Rect, RectF, Size};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 20.0;
/// Zoom factor applied per wheel notch.
pub const ZOOM_STEP: f32 = 1.1;

/// Maps image space to view space as `view = (image - pan) * zoom`.
///
/// `pan` is the image-space point shown at the view origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    zoom: f32,
    pan: PointF,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: PointF::new(0.0, 0.0),
        }
    }
}

impl ViewTransform {
    /// Creates a transform; `zoom` is clamped into `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn new(zoom: f32, pan: PointF) -> Self {
        Self {
            zoom: clamp_zoom(zoom),
            pan,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> PointF {
        self.pan
    }

    pub fn set_pan(&mut self, pan: PointF) {
        self.pan = pan;
    }

    pub fn img_to_view(&self, p: PointF) -> PointF {
        PointF::new((p.x - self.pan.x) * self.zoom, (p.y - self.pan.y) * self.zoom)
    }

    pub fn view_to_img(&self, v: PointF) -> PointF {
        PointF::new(v.x / self.zoom + self.pan.x, v.y / self.zoom + self.pan.y)
    }

    /// Image pixel under `v`, rounded and clamped into an image of `size`.
    pub fn view_to_pixel(&self, v: PointF, size: Size) -> (i32, i32) {
        let p = self.view_to_img(v);
        let max_x = size.width.saturating_sub(1) as f32;
        let max_y = size.height.saturating_sub(1) as f32;
        (
            p.x.clamp(0.0, max_x).round() as i32,
            p.y.clamp(0.0, max_y).round() as i32,
        )
    }

    /// View-space box of an image rect.
    pub fn rect_to_view(&self, r: Rect) -> RectF {
        let a = self.img_to_view(PointF::new(r.x as f32, r.y as f32));
        let b = self.img_to_view(PointF::new(r.right() as f32, r.bottom() as f32));
        RectF::from_corners(a, b)
    }

    /// Multiplies the zoom by `factor` keeping the image point under `anchor`
    /// fixed in view space.
    pub fn zoom_about(&mut self, anchor: PointF, factor: f32) {
        let fixed = self.view_to_img(anchor);
        self.zoom = clamp_zoom(self.zoom * factor);
        self.pan = PointF::new(
            fixed.x - anchor.x / self.zoom,
            fixed.y - anchor.y / self.zoom,
        );
    }

    /// Pan that moves the view by `delta` view pixels relative to `start_pan`.
    pub fn panned_from(&self, start_pan: PointF, delta: PointF) -> PointF {
        PointF::new(
            start_pan.x - delta.x / self.zoom,
            start_pan.y - delta.y / self.zoom,
        )
    }
}

fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewTransform, MAX_ZOOM, MIN_ZOOM};
    use crate::geom::{PointF, Rect, Size};

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut view = ViewTransform::new(1.5, PointF::new(12.0, 7.0));
        let anchor = PointF::new(100.0, 60.0);
        let before = view.view_to_img(anchor);
        view.zoom_about(anchor, 1.1);
        let after = view.view_to_img(anchor);
        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewTransform::default();
        for _ in 0..100 {
            view.zoom_about(PointF::new(0.0, 0.0), 1.1);
        }
        assert_eq!(view.zoom(), MAX_ZOOM);
        for _ in 0..200 {
            view.zoom_about(PointF::new(0.0, 0.0), 1.0 / 1.1);
        }
        assert_eq!(view.zoom(), MIN_ZOOM);
    }

    #[test]
    fn pixel_lookup_clamps_to_image() {
        let view = ViewTransform::new(2.0, PointF::new(0.0, 0.0));
        let size = Size::new(10, 10);
        assert_eq!(view.view_to_pixel(PointF::new(8.0, 6.0), size), (4, 3));
        assert_eq!(view.view_to_pixel(PointF::new(-5.0, 500.0), size), (0, 9));
    }

    #[test]
    fn rect_maps_with_zoom_and_pan() {
        let view = ViewTransform::new(2.0, PointF::new(5.0, 5.0));
        let r = view.rect_to_view(Rect::new(10, 15, 4, 2));
        assert_eq!((r.x, r.y, r.width, r.height), (10.0, 20.0, 8.0, 4.0));
    }
}
