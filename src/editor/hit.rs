//! Resize handles, hit testing and drag geometry.

use crate::editor::view::ViewTransform;
use crate::geom::{safe_rect, PointF, Rect, RectF, Size};

/// Side of a handle square, and the hit tolerance around its center, in view
/// pixels.
pub const HANDLE_SIZE: f32 = 8.0;

/// Smallest width/height a dragged rect can shrink to, in image pixels.
pub const MIN_ROI_SIDE: i32 = 6;

/// Part of a ROI grabbed by the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    Body,
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

/// Handles in hit-test priority order: corners, then edge midpoints.
pub const HANDLES: [Handle; 8] = [
    Handle::NW,
    Handle::NE,
    Handle::SW,
    Handle::SE,
    Handle::N,
    Handle::S,
    Handle::W,
    Handle::E,
];

/// Pointer shape a renderer should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorKind {
    /// Over empty space; a press starts a new ROI.
    Crosshair,
    Move,
    ResizeNS,
    ResizeEW,
    ResizeNESW,
    ResizeNWSE,
}

impl Handle {
    pub fn cursor(self) -> CursorKind {
        match self {
            Handle::Body => CursorKind::Move,
            Handle::N | Handle::S => CursorKind::ResizeNS,
            Handle::E | Handle::W => CursorKind::ResizeEW,
            Handle::NE | Handle::SW => CursorKind::ResizeNESW,
            Handle::NW | Handle::SE => CursorKind::ResizeNWSE,
        }
    }

    /// Center of this handle on a view-space box; `Body` maps to the center.
    pub fn anchor(self, r: &RectF) -> PointF {
        let cx = r.x + r.width / 2.0;
        let cy = r.y + r.height / 2.0;
        match self {
            Handle::NW => PointF::new(r.x, r.y),
            Handle::NE => PointF::new(r.right(), r.y),
            Handle::SW => PointF::new(r.x, r.bottom()),
            Handle::SE => PointF::new(r.right(), r.bottom()),
            Handle::N => PointF::new(cx, r.y),
            Handle::S => PointF::new(cx, r.bottom()),
            Handle::W => PointF::new(r.x, cy),
            Handle::E => PointF::new(r.right(), cy),
            Handle::Body => PointF::new(cx, cy),
        }
    }
}

/// The 8 handle squares of a view-space box, in priority order.
pub fn handle_rects(r: &RectF) -> [(Handle, RectF); 8] {
    HANDLES.map(|h| {
        let c = h.anchor(r);
        let half = HANDLE_SIZE / 2.0;
        (
            h,
            RectF {
                x: c.x - half,
                y: c.y - half,
                width: HANDLE_SIZE,
                height: HANDLE_SIZE,
            },
        )
    })
}

fn near(p: PointF, q: PointF) -> bool {
    (p.x - q.x).abs() <= HANDLE_SIZE && (p.y - q.y).abs() <= HANDLE_SIZE
}

/// What a view-space point lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    /// List position of the ROI.
    pub position: usize,
    pub handle: Handle,
}

/// Hit-tests `p` against the ROI list.
///
/// Handles are only live on a sole selection (`handles_of`). Bodies are
/// checked last-drawn first so the topmost ROI wins overlaps.
pub fn hit_test(
    view: &ViewTransform,
    rects: &[Rect],
    handles_of: Option<usize>,
    p: PointF,
) -> Option<Hit> {
    if let Some(position) = handles_of {
        if let Some(rect) = rects.get(position) {
            let box_ = view.rect_to_view(*rect);
            if let Some(handle) = HANDLES.into_iter().find(|h| near(p, h.anchor(&box_))) {
                return Some(Hit { position, handle });
            }
        }
    }
    rects
        .iter()
        .enumerate()
        .rev()
        .find(|(_, r)| view.rect_to_view(**r).contains(p))
        .map(|(position, _)| Hit {
            position,
            handle: Handle::Body,
        })
}

/// Applies an image-space drag of `(dx, dy)` to the snapshot `origin`.
///
/// Moving an edge changes position and size inversely so the opposite edge
/// stays put. Sizes are floored at [`MIN_ROI_SIDE`] and the result is
/// clamped into `size`.
pub fn apply_drag(handle: Handle, origin: Rect, dx: i32, dy: i32, size: Size) -> Rect {
    let mut r = origin;
    let (west, east, north, south) = match handle {
        Handle::Body => {
            r = r.translated(dx, dy);
            (false, false, false, false)
        }
        Handle::N => (false, false, true, false),
        Handle::S => (false, false, false, true),
        Handle::E => (false, true, false, false),
        Handle::W => (true, false, false, false),
        Handle::NE => (false, true, true, false),
        Handle::NW => (true, false, true, false),
        Handle::SE => (false, true, false, true),
        Handle::SW => (true, false, false, true),
    };
    if west {
        r.x += dx;
        r.width -= dx;
    }
    if east {
        r.width += dx;
    }
    if north {
        r.y += dy;
        r.height -= dy;
    }
    if south {
        r.height += dy;
    }
    r.width = r.width.max(MIN_ROI_SIDE);
    r.height = r.height.max(MIN_ROI_SIDE);
    safe_rect(r, size)
}
