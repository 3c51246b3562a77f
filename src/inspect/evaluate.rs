//! Per-ROI presence evaluation.
//!
//! One ROI goes through template selection, search-window selection,
//! correlation, then the score gate and the edge and brightness corroboration
//! checks. Everything here reads the shared images only, so ROIs can be
//! evaluated independently.

use crate::config::{resolve, GlobalConfig, ResolvedRoiConfig, SearchWindow};
use crate::geom::{inflate_around, safe_rect, Rect, Size};
use crate::image::{crop_gray, ScoreMap};
use crate::inspect::PresenceVerdict;
use crate::prep::{bright_ratio, count_nonzero, edge_map, prepare_for_match};
use crate::roi::RoiDefinition;
use crate::search::{Correlator, MatchResult};
use crate::template::{Template, TemplateSource};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{PcbCheckError, PcbCheckResult};
use image::GrayImage;
use std::path::Path;

/// Golden edge counts at or below this make the edge check pass trivially.
pub const MIN_GOLDEN_EDGES: usize = 20;

/// Golden bright ratios at or below this make the brightness check pass
/// trivially.
pub const MIN_GOLDEN_BRIGHT: f64 = 0.01;

/// Images produced while evaluating one ROI, kept for diagnostics.
#[derive(Clone, Debug)]
pub struct RoiArtifacts {
    pub index: usize,
    /// Test-image crop at the located rect.
    pub test_crop: GrayImage,
    /// Edge map of `test_crop`.
    pub test_edges: GrayImage,
    /// Score map of the winning scale, if any scale was evaluated.
    pub score_map: Option<ScoreMap>,
}

/// Verdict and diagnostics for one ROI.
#[derive(Clone, Debug)]
pub struct RoiEvaluation {
    pub verdict: PresenceVerdict,
    pub artifacts: RoiArtifacts,
}

/// Shared inputs for evaluating the ROIs of one run.
pub(crate) struct EvalContext<'a> {
    pub golden: &'a GrayImage,
    /// Test image, already at the golden image's size.
    pub test: &'a GrayImage,
    pub config: &'a GlobalConfig,
    pub correlator: Correlator,
}

/// Picks the search window for a ROI in test-image coordinates.
pub fn search_window(policy: SearchWindow, roi: Rect, size: Size) -> Rect {
    match policy {
        SearchWindow::Explicit(rect) => safe_rect(rect, size),
        SearchWindow::LockToGolden { margin } => inflate_around(roi, margin, size),
        SearchWindow::Left { ratio } => {
            let width = (f64::from(size.width) * ratio) as i32;
            safe_rect(Rect::new(0, 0, width, size.height as i32), size)
        }
        SearchWindow::Full => safe_rect(
            Rect::new(0, 0, size.width as i32, size.height as i32),
            size,
        ),
    }
}

/// Edge check: passes trivially on featureless golden crops.
pub fn edges_ok(golden_edges: usize, test_edges: usize, ratio_threshold: f64) -> bool {
    golden_edges <= MIN_GOLDEN_EDGES
        || test_edges as f64 >= ratio_threshold * golden_edges as f64
}

/// Brightness check: passes trivially when the golden crop has no highlights.
pub fn bright_ok(golden_ratio: f64, test_ratio: f64, ratio_threshold: f64) -> bool {
    golden_ratio <= MIN_GOLDEN_BRIGHT || test_ratio >= ratio_threshold * golden_ratio
}

pub(crate) fn evaluate_roi(
    ctx: &EvalContext<'_>,
    index: usize,
    roi: &RoiDefinition,
    saved_template: &Path,
) -> PcbCheckResult<RoiEvaluation> {
    let _span = trace_span!("evaluate_roi", index = index, roi = roi.name.as_str()).entered();

    let size = Size::of(ctx.golden);
    let roi_rect = safe_rect(roi.rect, size);
    let resolved = resolve(ctx.config, &roi.overrides);
    let template = Template::select(saved_template, ctx.golden, roi_rect);
    let search = search_window(resolved.search, roi_rect, size);

    let matched = match locate(ctx, &template, search) {
        Ok(m) => m,
        Err(PcbCheckError::TemplateTooLarge {
            tpl_width,
            tpl_height,
            ..
        }) => {
            trace_warn!(
                "template_too_large",
                index = index,
                tpl_width = tpl_width,
                tpl_height = tpl_height
            );
            MatchResult {
                found: Rect::new(0, 0, search.width, search.height),
                score: -1.0,
                scale: 1.0,
                score_map: None,
            }
        }
        Err(err) => return Err(err),
    };

    let found = safe_rect(matched.found.translated(search.x, search.y), size);
    let golden_crop = crop_gray(ctx.golden, roi_rect);
    let test_crop = crop_gray(ctx.test, found);
    let test_edges = edge_map(&test_crop);

    let verdict = decide(
        index,
        roi,
        &resolved,
        &matched,
        found,
        search,
        Corroboration {
            edges_golden: count_nonzero(&edge_map(&golden_crop)),
            edges_test: count_nonzero(&test_edges),
            bright_golden: bright_ratio(&golden_crop),
            bright_test: bright_ratio(&test_crop),
        },
        template.source() == TemplateSource::Saved,
    );

    trace_event!(
        "roi_verdict",
        index = index,
        score = verdict.score,
        present = verdict.present,
        edges_golden = verdict.edges_golden,
        edges_test = verdict.edges_test,
        bright_golden = verdict.bright_golden,
        bright_test = verdict.bright_test
    );

    Ok(RoiEvaluation {
        verdict,
        artifacts: RoiArtifacts {
            index,
            test_crop,
            test_edges,
            score_map: matched.score_map,
        },
    })
}

fn locate(ctx: &EvalContext<'_>, template: &Template, search: Rect) -> PcbCheckResult<MatchResult> {
    let edge_match = ctx.config.edge_match;
    let window = crop_gray(ctx.test, search);
    let window = prepare_for_match(&window, edge_match).image;
    if ctx.config.multi_scale {
        ctx.correlator
            .locate_multiscale(&window, template.image(), &ctx.config.scale)
    } else {
        let tpl = prepare_for_match(template.image(), edge_match).image;
        ctx.correlator.locate(&window, &tpl)
    }
}

struct Corroboration {
    edges_golden: usize,
    edges_test: usize,
    bright_golden: f64,
    bright_test: f64,
}

#[allow(clippy::too_many_arguments)]
fn decide(
    index: usize,
    roi: &RoiDefinition,
    resolved: &ResolvedRoiConfig,
    matched: &MatchResult,
    found: Rect,
    search: Rect,
    c: Corroboration,
    saved_template: bool,
) -> PresenceVerdict {
    let score_ok = f64::from(matched.score) >= resolved.score_threshold;
    let edges_ok = edges_ok(c.edges_golden, c.edges_test, resolved.edge_ratio_threshold);
    let bright_ok = bright_ok(c.bright_golden, c.bright_test, resolved.bright_ratio_threshold);
    PresenceVerdict {
        index,
        name: roi.name.clone(),
        present: score_ok && edges_ok && bright_ok,
        score: matched.score,
        score_threshold: resolved.score_threshold,
        found,
        search,
        scale: matched.scale,
        score_ok,
        edges_ok,
        bright_ok,
        edges_golden: c.edges_golden,
        edges_test: c.edges_test,
        bright_golden: c.bright_golden,
        bright_test: c.bright_test,
        saved_template,
    }
}

#[cfg(test)]
mod tests {
    use super::{bright_ok, edges_ok, search_window};
    use crate::config::SearchWindow;
    use crate::geom::{Rect, Size};

    #[test]
    fn edge_check_is_trivial_for_flat_golden() {
        assert!(edges_ok(20, 0, 0.65));
        assert!(!edges_ok(100, 64, 0.65));
        assert!(edges_ok(100, 65, 0.65));
    }

    #[test]
    fn bright_check_is_trivial_without_highlights() {
        assert!(bright_ok(0.01, 0.0, 0.7));
        assert!(!bright_ok(0.2, 0.1, 0.7));
        assert!(bright_ok(0.2, 0.15, 0.7));
    }

    #[test]
    fn left_window_truncates_width() {
        let size = Size::new(101, 50);
        let rect = search_window(SearchWindow::Left { ratio: 0.6 }, Rect::default(), size);
        assert_eq!(rect, Rect::new(0, 0, 60, 50));
    }

    #[test]
    fn lock_window_grows_around_roi() {
        let size = Size::new(200, 200);
        let roi = Rect::new(50, 50, 20, 10);
        let rect = search_window(SearchWindow::LockToGolden { margin: 0.5 }, roi, size);
        assert_eq!(rect, Rect::new(40, 45, 40, 20));
    }

    #[test]
    fn explicit_window_is_clamped() {
        let size = Size::new(100, 100);
        let rect = search_window(
            SearchWindow::Explicit(Rect::new(90, -5, 50, 50)),
            Rect::default(),
            size,
        );
        assert_eq!(rect, Rect::new(90, 0, 10, 50));
    }
}
