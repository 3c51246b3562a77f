//! Verdict overlay drawn on the test image.
//!
//! Each ROI's located rect is outlined green when present and red when
//! missing, with a score bar above it (white tick at the threshold). A banner
//! across the top shows the overall verdict in the same colors.

use crate::geom::Rect;
use crate::inspect::InspectionReport;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as DrawRect;

pub const PRESENT_COLOR: Rgb<u8> = Rgb([40, 220, 90]);
pub const MISSING_COLOR: Rgb<u8> = Rgb([230, 50, 50]);
const TRACK_COLOR: Rgb<u8> = Rgb([40, 40, 40]);
const TICK_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const OUTLINE: i32 = 2;
const BAR_HEIGHT: i32 = 4;
const BAR_GAP: i32 = 2;

pub fn verdict_color(present: bool) -> Rgb<u8> {
    if present {
        PRESENT_COLOR
    } else {
        MISSING_COLOR
    }
}

/// Renders the overlay on a copy of `base`.
pub fn render(base: &RgbImage, report: &InspectionReport) -> RgbImage {
    let mut canvas = base.clone();
    for verdict in &report.verdicts {
        let color = verdict_color(verdict.present);
        outline(&mut canvas, verdict.found, color);
        score_bar(
            &mut canvas,
            verdict.found,
            verdict.score,
            verdict.score_threshold,
            color,
        );
    }
    banner(&mut canvas, report.overall);
    canvas
}

fn to_draw_rect(rect: Rect) -> Option<DrawRect> {
    if rect.width <= 0 || rect.height <= 0 {
        return None;
    }
    Some(DrawRect::at(rect.x, rect.y).of_size(rect.width as u32, rect.height as u32))
}

fn outline(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    for inset in 0..OUTLINE {
        let r = Rect::new(
            rect.x + inset,
            rect.y + inset,
            rect.width - 2 * inset,
            rect.height - 2 * inset,
        );
        if let Some(r) = to_draw_rect(r) {
            draw_hollow_rect_mut(canvas, r, color);
        }
    }
}

fn score_bar(canvas: &mut RgbImage, rect: Rect, score: f32, threshold: f64, color: Rgb<u8>) {
    let above = rect.y - BAR_GAP - BAR_HEIGHT;
    let y = if above >= 0 {
        above
    } else {
        rect.bottom() + BAR_GAP
    };
    let track = Rect::new(rect.x, y, rect.width, BAR_HEIGHT);
    if let Some(r) = to_draw_rect(track) {
        draw_filled_rect_mut(canvas, r, TRACK_COLOR);
    }
    let filled = (f64::from(score.clamp(0.0, 1.0)) * f64::from(rect.width)).round() as i32;
    if let Some(r) = to_draw_rect(Rect::new(rect.x, y, filled, BAR_HEIGHT)) {
        draw_filled_rect_mut(canvas, r, color);
    }
    let tick_x = rect.x + (threshold.clamp(0.0, 1.0) * f64::from(rect.width)).round() as i32;
    if let Some(r) = to_draw_rect(Rect::new(tick_x.min(rect.right() - 1), y, 1, BAR_HEIGHT)) {
        draw_filled_rect_mut(canvas, r, TICK_COLOR);
    }
}

fn banner(canvas: &mut RgbImage, overall: bool) {
    let height = (canvas.height() / 20).max(6) as i32;
    let band = Rect::new(0, 0, canvas.width() as i32, height);
    if let Some(r) = to_draw_rect(band) {
        draw_filled_rect_mut(canvas, r, verdict_color(overall));
    }
}
