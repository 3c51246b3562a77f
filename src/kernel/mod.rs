//! Correlation kernel implementations.
//!
//! Scores follow the normalized cross-correlation (ZNCC) convention in
//! `[-1, 1]`. Degenerate denominators are resolved the usual way: a flat
//! template scores `1.0` everywhere, and a flat image window scores `0.0`.

use crate::image::{ImageView, ScoreMap};
use crate::template::TemplatePlan;
use crate::util::{PcbCheckError, PcbCheckResult};

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;

/// Per-window variance (sum of squares) at or below which a window is flat.
pub const MIN_VAR_I: f64 = 1e-6;

/// Kernel trait for scoring and dense scan operations.
pub trait Kernel {
    /// Computes the score at a single placement (top-left coordinates).
    ///
    /// The placement must leave the template fully inside `image`.
    fn score_at(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize) -> f32;

    /// Scores every valid placement and returns the dense score map.
    fn score_map(image: ImageView<'_, u8>, plan: &TemplatePlan) -> PcbCheckResult<ScoreMap>;
}

/// Returns the score-map dimensions, or an error if the template does not fit.
pub(crate) fn map_dims(
    image: &ImageView<'_, u8>,
    plan: &TemplatePlan,
) -> PcbCheckResult<(usize, usize)> {
    let (img_width, img_height) = (image.width(), image.height());
    let (tpl_width, tpl_height) = (plan.width(), plan.height());
    if img_width < tpl_width || img_height < tpl_height {
        return Err(PcbCheckError::TemplateTooLarge {
            tpl_width,
            tpl_height,
            img_width,
            img_height,
        });
    }
    Ok((img_width - tpl_width + 1, img_height - tpl_height + 1))
}

/// Scores the full valid placement range with the default kernel.
pub fn zncc_score_map(image: ImageView<'_, u8>, plan: &TemplatePlan) -> PcbCheckResult<ScoreMap> {
    <scalar::ZnccScalar as Kernel>::score_map(image, plan)
}
