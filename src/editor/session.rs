use crate::editor::hit::{apply_drag, handle_rects, hit_test, CursorKind, Handle};
use crate::editor::view::{ViewTransform, ZOOM_STEP};
use crate::editor::{EditorEffect, Key, Modifiers, PointerButton};
use crate::geom::{safe_rect, PointF, Rect, RectF, Size};
use crate::image::crop_gray;
use crate::image::io::{load_gray, save_image};
use crate::roi::store::fill_default_names;
use crate::roi::{index_at, RoiDefinition};
use crate::trace::{trace_event, trace_span};
use crate::util::{PcbCheckError, PcbCheckResult};
use crate::workspace::Workspace;
use image::GrayImage;
use std::fs;
use std::path::Path;

/// Offset applied to pasted ROIs, in image pixels.
pub const PASTE_OFFSET: i32 = 10;

const NUDGE: i32 = 1;
const NUDGE_FAST: i32 = 10;

/// Pointer interaction state.
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionState {
    Idle,
    Panning {
        start_view: PointF,
        start_pan: PointF,
    },
    /// Left button held. `targets` holds each affected ROI's list position
    /// and its rect when the drag started.
    Dragging {
        handle: Handle,
        start: (i32, i32),
        targets: Vec<(usize, Rect)>,
    },
}

/// An editing session over one golden image.
#[derive(Clone, Debug)]
pub struct EditorSession {
    golden: GrayImage,
    size: Size,
    workspace: Workspace,
    rois: Vec<RoiDefinition>,
    selection: Vec<usize>,
    last_selected: Option<usize>,
    view: ViewTransform,
    state: InteractionState,
    clipboard: Vec<Rect>,
    active: bool,
}

impl EditorSession {
    /// Starts a session on the golden image at `golden_path`.
    ///
    /// The session starts with no ROIs unless shift or ctrl is held, in
    /// which case the workspace store is loaded.
    pub fn start(
        golden_path: &Path,
        workspace: Workspace,
        modifiers: Modifiers,
    ) -> PcbCheckResult<Self> {
        let golden = load_gray(golden_path)?;
        let rois = if modifiers.shift || modifiers.ctrl {
            workspace.store().load()?
        } else {
            Vec::new()
        };
        trace_event!("editor_start", rois = rois.len());
        Ok(Self::new(golden, workspace, rois))
    }

    /// Starts a session on an already decoded golden image.
    ///
    /// Incoming rects are clamped into the golden image.
    pub fn new(golden: GrayImage, workspace: Workspace, mut rois: Vec<RoiDefinition>) -> Self {
        let size = Size::of(&golden);
        for roi in &mut rois {
            roi.rect = safe_rect(roi.rect, size);
        }
        Self {
            golden,
            size,
            workspace,
            rois,
            selection: Vec::new(),
            last_selected: None,
            view: ViewTransform::default(),
            state: InteractionState::Idle,
            clipboard: Vec::new(),
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn rois(&self) -> &[RoiDefinition] {
        &self.rois
    }

    /// Selected list positions, in selection order.
    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    pub fn last_selected(&self) -> Option<usize> {
        self.last_selected
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn clipboard(&self) -> &[Rect] {
        &self.clipboard
    }

    pub fn golden_size(&self) -> Size {
        self.size
    }

    /// View-space boxes of all ROIs, in list order.
    pub fn roi_view_rects(&self) -> Vec<RectF> {
        self.rois
            .iter()
            .map(|roi| self.view.rect_to_view(roi.rect))
            .collect()
    }

    /// Handle squares of the sole selected ROI, in view space.
    pub fn handle_rects_view(&self) -> Option<[(Handle, RectF); 8]> {
        let position = self.sole_selection()?;
        let rect = self.rois.get(position)?.rect;
        Some(handle_rects(&self.view.rect_to_view(rect)))
    }

    /// View-space bounding box of a multi-selection.
    pub fn selection_view_bounds(&self) -> Option<RectF> {
        if self.selection.len() < 2 {
            return None;
        }
        self.selection
            .iter()
            .filter_map(|&i| self.rois.get(i))
            .map(|roi| self.view.rect_to_view(roi.rect))
            .reduce(|a, b| a.union(&b))
    }

    fn sole_selection(&self) -> Option<usize> {
        match self.selection.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    fn rects(&self) -> Vec<Rect> {
        self.rois.iter().map(|roi| roi.rect).collect()
    }

    pub fn on_press(
        &mut self,
        p: PointF,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> EditorEffect {
        if !self.active || self.state != InteractionState::Idle {
            return EditorEffect::None;
        }
        if button != PointerButton::Left {
            self.state = InteractionState::Panning {
                start_view: p,
                start_pan: self.view.pan(),
            };
            return EditorEffect::None;
        }

        let start = self.view.view_to_pixel(p, self.size);
        let hit = hit_test(&self.view, &self.rects(), self.sole_selection(), p);
        let (handle, targets) = match hit {
            Some(hit) => {
                if modifiers.shift {
                    if let Some(at) = self.selection.iter().position(|&i| i == hit.position) {
                        self.selection.remove(at);
                    } else {
                        self.selection.push(hit.position);
                    }
                } else {
                    self.selection = vec![hit.position];
                }
                self.last_selected = Some(hit.position);

                let targets = if hit.handle == Handle::Body && self.selection.len() > 1 {
                    self.selection
                        .iter()
                        .map(|&i| (i, self.rois[i].rect))
                        .collect()
                } else if self.selection.contains(&hit.position) {
                    vec![(hit.position, self.rois[hit.position].rect)]
                } else {
                    Vec::new()
                };
                (hit.handle, targets)
            }
            None => {
                let position = self.rois.len();
                let (x, y) = start;
                self.rois
                    .push(RoiDefinition::new(index_at(position), Rect::new(x, y, 1, 1)));
                if !modifiers.shift {
                    self.selection.clear();
                }
                self.selection.push(position);
                self.last_selected = Some(position);
                // Zero-size snapshot so the rect spans exactly the drag.
                (Handle::SE, vec![(position, Rect::new(x, y, 0, 0))])
            }
        };
        self.state = InteractionState::Dragging {
            handle,
            start,
            targets,
        };
        EditorEffect::Redraw
    }

    pub fn on_move(&mut self, p: PointF) -> EditorEffect {
        if !self.active {
            return EditorEffect::None;
        }
        match &self.state {
            InteractionState::Idle => {
                let hit = hit_test(&self.view, &self.rects(), self.sole_selection(), p);
                EditorEffect::Cursor(hit.map_or(CursorKind::Crosshair, |h| h.handle.cursor()))
            }
            InteractionState::Panning {
                start_view,
                start_pan,
            } => {
                let delta = PointF::new(p.x - start_view.x, p.y - start_view.y);
                let pan = self.view.panned_from(*start_pan, delta);
                self.view.set_pan(pan);
                EditorEffect::Redraw
            }
            InteractionState::Dragging {
                handle,
                start,
                targets,
            } => {
                if targets.is_empty() {
                    return EditorEffect::None;
                }
                let (cx, cy) = self.view.view_to_pixel(p, self.size);
                let (dx, dy) = (cx - start.0, cy - start.1);
                for &(position, origin) in targets {
                    if let Some(roi) = self.rois.get_mut(position) {
                        roi.rect = apply_drag(*handle, origin, dx, dy, self.size);
                    }
                }
                EditorEffect::Redraw
            }
        }
    }

    /// Ends a pan or drag; multi-drag snapshots are dropped.
    pub fn on_release(&mut self, _button: PointerButton) -> EditorEffect {
        self.state = InteractionState::Idle;
        EditorEffect::None
    }

    /// Zooms by [`ZOOM_STEP`] per notch (negative zooms out), keeping the
    /// image point under `p` fixed.
    pub fn on_wheel(&mut self, p: PointF, notches: i32) -> EditorEffect {
        if !self.active || notches == 0 {
            return EditorEffect::None;
        }
        self.view.zoom_about(p, ZOOM_STEP.powi(notches));
        EditorEffect::Redraw
    }

    pub fn on_key(&mut self, key: Key, modifiers: Modifiers) -> EditorEffect {
        if !self.active {
            return EditorEffect::None;
        }
        let step = if modifiers.shift { NUDGE_FAST } else { NUDGE };
        let changed = match key {
            Key::C if modifiers.ctrl => {
                self.copy();
                false
            }
            Key::V if modifiers.ctrl => self.paste(),
            Key::Delete => self.delete_selected(),
            Key::Left => self.nudge(-step, 0),
            Key::Right => self.nudge(step, 0),
            Key::Up => self.nudge(0, -step),
            Key::Down => self.nudge(0, step),
            Key::Enter => return EditorEffect::CommitRequested,
            _ => false,
        };
        if changed {
            EditorEffect::Redraw
        } else {
            EditorEffect::None
        }
    }

    /// Copies the selected rects to the clipboard.
    pub fn copy(&mut self) {
        self.clipboard = self
            .selection
            .iter()
            .filter_map(|&i| self.rois.get(i))
            .map(|roi| roi.rect)
            .collect();
    }

    /// Appends a shifted copy of every clipboard rect and selects them.
    pub fn paste(&mut self) -> bool {
        if self.clipboard.is_empty() {
            return false;
        }
        self.selection.clear();
        for rect in &self.clipboard {
            let position = self.rois.len();
            let rect = safe_rect(rect.translated(PASTE_OFFSET, PASTE_OFFSET), self.size);
            self.rois.push(RoiDefinition::new(index_at(position), rect));
            self.selection.push(position);
        }
        self.last_selected = self.selection.last().copied();
        true
    }

    /// Removes the selected ROIs; later ROIs shift down to keep indices dense.
    pub fn delete_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let mut doomed = std::mem::take(&mut self.selection);
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        doomed.dedup();
        for position in doomed {
            if position < self.rois.len() {
                self.rois.remove(position);
            }
        }
        self.last_selected = None;
        true
    }

    /// Moves every selected ROI, clamped into the golden image.
    pub fn nudge(&mut self, dx: i32, dy: i32) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        for &position in &self.selection {
            if let Some(roi) = self.rois.get_mut(position) {
                roi.rect = safe_rect(roi.rect.translated(dx, dy), self.size);
            }
        }
        true
    }

    /// Ends the session: stages each ROI's template crop, saves the store,
    /// then moves the staged templates into place.
    ///
    /// Blank names become `ROI<index>`. If staging or the store write fails,
    /// the session stays active and the previous store and templates are left
    /// as they were.
    pub fn commit(&mut self) -> PcbCheckResult<()> {
        if !self.active {
            return Err(PcbCheckError::SessionInactive);
        }
        let _span = trace_span!("editor_commit", rois = self.rois.len()).entered();

        self.workspace
            .ensure_exists()
            .map_err(|err| PcbCheckError::StoreIo {
                path: self.workspace.root().to_path_buf(),
                reason: err.to_string(),
            })?;
        let mut rois = self.rois.clone();
        fill_default_names(&mut rois);
        let staged = self.stage_templates(&mut rois);
        let saved = staged.and_then(|()| self.workspace.store().save(&rois));
        if let Err(err) = saved {
            self.discard_staged(rois.len());
            return Err(err);
        }
        for position in 0..rois.len() {
            let index = index_at(position);
            let staged = self.workspace.staged_template_path(index);
            let target = self.workspace.template_path(index);
            fs::rename(&staged, &target).map_err(|err| PcbCheckError::ImageIo {
                path: target,
                reason: err.to_string(),
            })?;
        }

        trace_event!("editor_committed", rois = rois.len());
        self.rois = rois;
        self.selection.clear();
        self.last_selected = None;
        self.state = InteractionState::Idle;
        self.active = false;
        Ok(())
    }

    /// Writes every template crop under its staged name.
    fn stage_templates(&self, rois: &mut [RoiDefinition]) -> PcbCheckResult<()> {
        for (position, roi) in rois.iter_mut().enumerate() {
            roi.rect = safe_rect(roi.rect, self.size);
            let crop = crop_gray(&self.golden, roi.rect);
            save_image(&crop, self.workspace.staged_template_path(index_at(position)))?;
        }
        Ok(())
    }

    fn discard_staged(&self, count: usize) {
        for position in 0..count {
            let _ = fs::remove_file(self.workspace.staged_template_path(index_at(position)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorSession, InteractionState};
    use crate::editor::{EditorEffect, Key, Modifiers, PointerButton};
    use crate::geom::{PointF, Rect};
    use crate::roi::RoiDefinition;
    use crate::workspace::Workspace;
    use image::GrayImage;

    fn session(rects: &[Rect]) -> EditorSession {
        let rois = rects
            .iter()
            .enumerate()
            .map(|(i, r)| RoiDefinition::new(i + 1, *r))
            .collect();
        EditorSession::new(GrayImage::new(120, 100), Workspace::new("unused"), rois)
    }

    #[test]
    fn right_button_pans() {
        let mut s = session(&[]);
        s.on_press(PointF::new(50.0, 50.0), PointerButton::Right, Modifiers::NONE);
        assert!(matches!(s.state(), InteractionState::Panning { .. }));
        s.on_move(PointF::new(40.0, 30.0));
        assert_eq!(s.view().pan(), PointF::new(10.0, 20.0));
        s.on_release(PointerButton::Right);
        assert_eq!(*s.state(), InteractionState::Idle);
    }

    #[test]
    fn shift_click_toggles_membership() {
        let mut s = session(&[Rect::new(0, 0, 20, 20), Rect::new(50, 50, 20, 20)]);
        s.on_press(PointF::new(10.0, 10.0), PointerButton::Left, Modifiers::NONE);
        s.on_release(PointerButton::Left);
        s.on_press(PointF::new(60.0, 60.0), PointerButton::Left, Modifiers::SHIFT);
        s.on_release(PointerButton::Left);
        assert_eq!(s.selection(), &[0, 1]);
        assert!(s.selection_view_bounds().is_some());
        s.on_press(PointF::new(10.0, 10.0), PointerButton::Left, Modifiers::SHIFT);
        s.on_release(PointerButton::Left);
        assert_eq!(s.selection(), &[1]);
        assert!(s.handle_rects_view().is_some());
    }

    #[test]
    fn shift_creation_extends_selection() {
        let mut s = session(&[Rect::new(0, 0, 20, 20)]);
        s.on_press(PointF::new(10.0, 10.0), PointerButton::Left, Modifiers::NONE);
        s.on_release(PointerButton::Left);
        s.on_press(PointF::new(60.0, 60.0), PointerButton::Left, Modifiers::SHIFT);
        s.on_move(PointF::new(80.0, 75.0));
        s.on_release(PointerButton::Left);
        assert_eq!(s.selection(), &[0, 1]);
        assert_eq!(s.rois()[1].rect, Rect::new(60, 60, 20, 15));
    }

    #[test]
    fn nudge_respects_fast_modifier_and_bounds() {
        let mut s = session(&[Rect::new(5, 5, 20, 20)]);
        s.on_press(PointF::new(15.0, 15.0), PointerButton::Left, Modifiers::NONE);
        s.on_release(PointerButton::Left);
        s.on_key(Key::Right, Modifiers::SHIFT);
        assert_eq!(s.rois()[0].rect, Rect::new(15, 5, 20, 20));
        s.on_key(Key::Up, Modifiers::SHIFT);
        assert_eq!(s.rois()[0].rect, Rect::new(15, 0, 20, 20));
    }

    #[test]
    fn enter_requests_commit() {
        let mut s = session(&[]);
        assert_eq!(
            s.on_key(Key::Enter, Modifiers::NONE),
            EditorEffect::CommitRequested
        );
    }

    #[test]
    fn hover_reports_cursor() {
        let mut s = session(&[Rect::new(10, 10, 30, 30)]);
        assert_eq!(
            s.on_move(PointF::new(20.0, 20.0)),
            EditorEffect::Cursor(crate::editor::CursorKind::Move)
        );
        assert_eq!(
            s.on_move(PointF::new(100.0, 90.0)),
            EditorEffect::Cursor(crate::editor::CursorKind::Crosshair)
        );
    }
}
