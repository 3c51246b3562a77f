//! Interactive ROI geometry editor.
//!
//! The editor is toolkit-neutral: a UI forwards pointer, wheel and key events
//! in view coordinates to an [`EditorSession`] and redraws from the geometry
//! it exposes. Pointer handling is a small state machine
//! (`Idle | Panning | Dragging`); all geometry is kept in image space and
//! clamped into the golden image after every change.

pub mod hit;
mod session;
pub mod view;

pub use hit::{apply_drag, hit_test, CursorKind, Handle, Hit, HANDLE_SIZE, MIN_ROI_SIDE};
pub use session::{EditorSession, InteractionState, PASTE_OFFSET};
pub use view::{ViewTransform, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};

/// Pointer button of a press/release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys held during an event.
///
/// `shift` toggles selection membership, speeds up nudging and, at session
/// start, loads the existing store (as does `ctrl`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
    };
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
    };
}

/// Keys the editor reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    C,
    V,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Enter,
}

/// What the UI should do after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorEffect {
    /// Nothing changed.
    None,
    /// Geometry, selection or view changed.
    Redraw,
    /// Only the hover cursor changed.
    Cursor(CursorKind),
    /// The commit key was pressed; call [`EditorSession::commit`].
    CommitRequested,
}
