//! Presence/absence decision engine.
//!
//! [`Inspector`] runs every ROI through correlation and the corroboration
//! checks, then folds the per-ROI verdicts into one overall result. Inputs are
//! loaded before any work starts, so a missing or undecodable image aborts
//! the run without leaving partial artifacts behind.

use crate::config::GlobalConfig;
use crate::geom::Rect;
use crate::image::io::{load_color, save_image, to_gray};
use crate::roi::{index_at, RoiDefinition};
use crate::search::Correlator;
use crate::trace::{trace_event, trace_span};
use crate::util::{PcbCheckError, PcbCheckResult};
use crate::workspace::Workspace;
use image::imageops::{resize, FilterType};
use image::RgbImage;
use serde::Serialize;
use std::path::Path;

mod evaluate;
pub mod overlay;

pub use evaluate::{
    bright_ok, edges_ok, search_window, RoiArtifacts, RoiEvaluation, MIN_GOLDEN_BRIGHT,
    MIN_GOLDEN_EDGES,
};

use evaluate::{evaluate_roi, EvalContext};

/// Outcome for one ROI.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PresenceVerdict {
    /// 1-based ROI index.
    pub index: usize,
    pub name: String,
    pub present: bool,
    pub score: f32,
    pub score_threshold: f64,
    /// Located template box in test-image coordinates.
    pub found: Rect,
    /// Search window the template was located in.
    pub search: Rect,
    pub scale: f64,
    pub score_ok: bool,
    pub edges_ok: bool,
    pub bright_ok: bool,
    pub edges_golden: usize,
    pub edges_test: usize,
    pub bright_golden: f64,
    pub bright_test: f64,
    /// True if a saved template file was used instead of the golden crop.
    pub saved_template: bool,
}

/// How per-ROI verdicts combine into the overall result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Aggregation {
    /// Every ROI must be present.
    All,
    /// At least one ROI must be present.
    Any,
}

impl Aggregation {
    pub fn from_all_must_be_present(all: bool) -> Self {
        if all {
            Self::All
        } else {
            Self::Any
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "ALL(AND)",
            Self::Any => "ANY(OR)",
        }
    }
}

/// Folds per-ROI presence flags with AND or OR.
pub fn aggregate<I>(present: I, mode: Aggregation) -> bool
where
    I: IntoIterator<Item = bool>,
{
    let mut flags = present.into_iter();
    match mode {
        Aggregation::All => flags.all(|p| p),
        Aggregation::Any => flags.any(|p| p),
    }
}

/// Verdict summary of one inspection run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InspectionReport {
    pub verdicts: Vec<PresenceVerdict>,
    pub mode: Aggregation,
    pub overall: bool,
    pub mean_score: f64,
}

impl InspectionReport {
    /// Builds a report from verdicts ordered by ROI index.
    pub fn new(verdicts: Vec<PresenceVerdict>, mode: Aggregation) -> Self {
        let overall = aggregate(verdicts.iter().map(|v| v.present), mode);
        let mean_score = if verdicts.is_empty() {
            0.0
        } else {
            verdicts.iter().map(|v| f64::from(v.score)).sum::<f64>() / verdicts.len() as f64
        };
        Self {
            verdicts,
            mode,
            overall,
            mean_score,
        }
    }

    /// One-line operator summary, e.g.
    /// `ROIs=2 mode=ALL(AND) avgScore=0.91 result=OK`.
    pub fn summary_line(&self) -> String {
        format!(
            "ROIs={} mode={} avgScore={:.2} result={}",
            self.verdicts.len(),
            self.mode.label(),
            self.mean_score,
            if self.overall { "OK" } else { "NG" }
        )
    }

    /// Operator line for one ROI.
    pub fn roi_line(verdict: &PresenceVerdict) -> String {
        format!(
            "#{} {}: {} score={:.2}/{:.2} edges={}/{} bright={:.3}/{:.3}",
            verdict.index,
            verdict.name,
            if verdict.present { "PRESENT" } else { "MISSING" },
            verdict.score,
            verdict.score_threshold,
            verdict.edges_test,
            verdict.edges_golden,
            verdict.bright_test,
            verdict.bright_golden
        )
    }
}

/// Result of a run: the report plus everything needed to write diagnostics.
#[derive(Clone, Debug)]
pub struct Inspection {
    pub report: InspectionReport,
    pub artifacts: Vec<RoiArtifacts>,
    /// Test image at the golden image's size, the overlay background.
    pub test_image: RgbImage,
}

impl Inspection {
    /// Renders the verdict overlay on the test image.
    pub fn overlay(&self) -> RgbImage {
        overlay::render(&self.test_image, &self.report)
    }

    /// Writes per-ROI crops, edge maps, score maps and the overlay.
    pub fn write_artifacts(&self, workspace: &Workspace) -> PcbCheckResult<()> {
        workspace
            .ensure_exists()
            .map_err(|err| PcbCheckError::ImageIo {
                path: workspace.root().to_path_buf(),
                reason: err.to_string(),
            })?;
        for art in &self.artifacts {
            save_image(&art.test_crop, workspace.test_crop_path(art.index))?;
            save_image(&art.test_edges, workspace.test_edges_path(art.index))?;
            if let Some(map) = &art.score_map {
                save_image(&map.to_jet_image(), workspace.score_map_path(art.index))?;
            }
        }
        save_image(&self.overlay(), workspace.overlay_path())
    }
}

/// Runs inspections with one immutable configuration.
#[derive(Clone, Debug)]
pub struct Inspector {
    config: GlobalConfig,
}

impl Inspector {
    pub fn new(config: GlobalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Loads both images, then inspects them.
    ///
    /// Saved templates are looked up in `workspace`.
    pub fn inspect_paths(
        &self,
        golden: &Path,
        test: &Path,
        rois: &[RoiDefinition],
        workspace: &Workspace,
    ) -> PcbCheckResult<Inspection> {
        let golden = load_color(golden)?;
        let test = load_color(test)?;
        self.inspect(&golden, &test, rois, workspace)
    }

    /// Inspects `test` against `golden` for every ROI.
    ///
    /// A test image whose size differs from the golden image is resized to it
    /// first, so ROI coordinates apply to both.
    pub fn inspect(
        &self,
        golden: &RgbImage,
        test: &RgbImage,
        rois: &[RoiDefinition],
        workspace: &Workspace,
    ) -> PcbCheckResult<Inspection> {
        self.config.validate()?;
        if rois.is_empty() {
            return Err(PcbCheckError::NoRois);
        }
        let _span = trace_span!("inspect", rois = rois.len()).entered();

        let test_image = if test.dimensions() == golden.dimensions() {
            test.clone()
        } else {
            trace_event!(
                "test_resized",
                from_width = test.width(),
                from_height = test.height()
            );
            resize(test, golden.width(), golden.height(), FilterType::Triangle)
        };
        let golden_gray = to_gray(golden);
        let test_gray = to_gray(&test_image);
        let ctx = EvalContext {
            golden: &golden_gray,
            test: &test_gray,
            config: &self.config,
            correlator: Correlator::new(self.config.edge_match).with_parallel(self.config.parallel),
        };

        let evaluations = self.evaluate_all(&ctx, rois, workspace)?;
        let (verdicts, artifacts): (Vec<_>, Vec<_>) = evaluations
            .into_iter()
            .map(|e| (e.verdict, e.artifacts))
            .unzip();
        let report = InspectionReport::new(
            verdicts,
            Aggregation::from_all_must_be_present(self.config.all_must_be_present),
        );
        trace_event!(
            "inspection_done",
            overall = report.overall,
            mean_score = report.mean_score
        );
        Ok(Inspection {
            report,
            artifacts,
            test_image,
        })
    }

    fn evaluate_all(
        &self,
        ctx: &EvalContext<'_>,
        rois: &[RoiDefinition],
        workspace: &Workspace,
    ) -> PcbCheckResult<Vec<RoiEvaluation>> {
        #[cfg(feature = "rayon")]
        if self.config.parallel {
            use rayon::prelude::*;
            // Indexed collect keeps ROI order.
            return rois
                .par_iter()
                .enumerate()
                .map(|(pos, roi)| {
                    let index = index_at(pos);
                    evaluate_roi(ctx, index, roi, &workspace.template_path(index))
                })
                .collect();
        }
        rois.iter()
            .enumerate()
            .map(|(pos, roi)| {
                let index = index_at(pos);
                evaluate_roi(ctx, index, roi, &workspace.template_path(index))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{aggregate, Aggregation, InspectionReport, PresenceVerdict};
    use crate::geom::Rect;

    fn verdict(index: usize, present: bool, score: f32) -> PresenceVerdict {
        PresenceVerdict {
            index,
            name: format!("ROI{index}"),
            present,
            score,
            score_threshold: 0.7,
            found: Rect::new(0, 0, 1, 1),
            search: Rect::new(0, 0, 1, 1),
            scale: 1.0,
            score_ok: present,
            edges_ok: true,
            bright_ok: true,
            edges_golden: 0,
            edges_test: 0,
            bright_golden: 0.0,
            bright_test: 0.0,
            saved_template: false,
        }
    }

    #[test]
    fn and_or_aggregation() {
        assert!(!aggregate([true, false], Aggregation::All));
        assert!(aggregate([true, false], Aggregation::Any));
        assert!(aggregate([true, true], Aggregation::All));
        assert!(!aggregate([false, false], Aggregation::Any));
    }

    #[test]
    fn summary_line_format() {
        let report = InspectionReport::new(
            vec![verdict(1, true, 0.9), verdict(2, false, 0.3)],
            Aggregation::All,
        );
        assert_eq!(
            report.summary_line(),
            "ROIs=2 mode=ALL(AND) avgScore=0.60 result=NG"
        );
        let any = InspectionReport::new(report.verdicts.clone(), Aggregation::Any);
        assert!(any.summary_line().ends_with("mode=ANY(OR) avgScore=0.60 result=OK"));
    }
}
