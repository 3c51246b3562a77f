//! Template localization inside a search window.
//!
//! The correlator scores every integer offset of a prepared template inside a
//! prepared search window and keeps the best one. Multi-scale search repeats
//! this for a sweep of template scale factors to absorb small magnification
//! drift between captures.

use crate::config::ScaleRange;
use crate::geom::{safe_rect, Rect, Size};
use crate::image::{ImageView, ScoreMap};
use crate::kernel::Kernel;
use crate::prep::prepare_for_match;
use crate::template::TemplatePlan;
use crate::trace::{trace_event, trace_span};
use crate::util::PcbCheckResult;
use image::imageops::{resize, FilterType};
use image::GrayImage;

/// Smallest template side allowed in a multi-scale sweep.
pub const MIN_SCALED_SIDE: u32 = 10;

/// Best placement of a template inside a search window.
#[derive(Clone, Debug)]
pub struct MatchResult {
    /// Located template box, in search-window coordinates.
    pub found: Rect,
    /// Correlation score in `[-1, 1]`; `-1` when no scale could be evaluated.
    pub score: f32,
    /// Scale factor the best score was found at.
    pub scale: f64,
    /// Dense scores of the winning scale, for diagnostics only.
    pub score_map: Option<ScoreMap>,
}

/// Normalized cross-correlation template locator.
#[derive(Clone, Copy, Debug)]
pub struct Correlator {
    edge_match: bool,
    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    parallel: bool,
}

impl Correlator {
    /// Creates a correlator; `edge_match` selects the preparation used for
    /// rescaled templates in multi-scale search.
    pub fn new(edge_match: bool) -> Self {
        Self {
            edge_match,
            parallel: false,
        }
    }

    /// Enables the row-parallel kernel when the `rayon` feature is built in.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Finds the best placement of a prepared template at scale 1.0.
    pub fn locate(&self, search: &GrayImage, template: &GrayImage) -> PcbCheckResult<MatchResult> {
        let _span = trace_span!("locate").entered();
        let map = self.score_map(search, template)?;
        let (x, y, score) = map.max_loc();
        let found = safe_rect(
            Rect::new(
                x as i32,
                y as i32,
                template.width() as i32,
                template.height() as i32,
            ),
            Size::of(search),
        );
        trace_event!("locate_done", x = x, y = y, score = score);
        Ok(MatchResult {
            found,
            score,
            scale: 1.0,
            score_map: Some(map),
        })
    }

    /// Sweeps template scales over `range` and keeps the best placement.
    ///
    /// `template_gray` is the unprepared template; each rescaled copy is
    /// prepared before matching. Scales whose template is smaller than
    /// [`MIN_SCALED_SIDE`] or not strictly smaller than the window are skipped.
    /// Ties keep the smallest scale.
    pub fn locate_multiscale(
        &self,
        search: &GrayImage,
        template_gray: &GrayImage,
        range: &ScaleRange,
    ) -> PcbCheckResult<MatchResult> {
        let _span = trace_span!("locate_multiscale").entered();
        let (tpl_w, tpl_h) = template_gray.dimensions();
        let mut best = MatchResult {
            found: safe_rect(
                Rect::new(0, 0, tpl_w as i32, tpl_h as i32),
                Size::of(search),
            ),
            score: -1.0,
            scale: 1.0,
            score_map: None,
        };

        for scale in range.factors() {
            let width = scaled_side(tpl_w, scale);
            let height = scaled_side(tpl_h, scale);
            if width < MIN_SCALED_SIDE
                || height < MIN_SCALED_SIDE
                || width >= search.width()
                || height >= search.height()
            {
                continue;
            }

            let scaled = if (width, height) == (tpl_w, tpl_h) {
                template_gray.clone()
            } else {
                resize(template_gray, width, height, FilterType::Triangle)
            };
            let prepared = prepare_for_match(&scaled, self.edge_match);
            let map = self.score_map(search, &prepared.image)?;
            let (x, y, score) = map.max_loc();
            trace_event!("scale_scored", scale = scale, score = score);
            if score > best.score {
                best = MatchResult {
                    found: safe_rect(
                        Rect::new(x as i32, y as i32, width as i32, height as i32),
                        Size::of(search),
                    ),
                    score,
                    scale,
                    score_map: Some(map),
                };
            }
        }
        Ok(best)
    }

    fn score_map(&self, search: &GrayImage, template: &GrayImage) -> PcbCheckResult<ScoreMap> {
        let plan = TemplatePlan::from_view(ImageView::from_gray(template)?)?;
        let view = ImageView::from_gray(search)?;
        #[cfg(feature = "rayon")]
        if self.parallel {
            return <crate::kernel::rayon::ZnccRowParallel as Kernel>::score_map(view, &plan);
        }
        <crate::kernel::scalar::ZnccScalar as Kernel>::score_map(view, &plan)
    }
}

/// Side length of a template side scaled by `scale`, truncated.
fn scaled_side(side: u32, scale: f64) -> u32 {
    (f64::from(side) * scale + 1e-6).floor().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::{scaled_side, Correlator};
    use crate::config::ScaleRange;
    use crate::geom::Rect;
    use image::{GrayImage, Luma};

    fn textured(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            Luma([(((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF) as u8])
        })
    }

    #[test]
    fn locate_finds_embedded_patch() {
        let search = textured(60, 50);
        let template = image::imageops::crop_imm(&search, 17, 11, 20, 15).to_image();
        let result = Correlator::new(true).locate(&search, &template).unwrap();
        assert_eq!(result.found, Rect::new(17, 11, 20, 15));
        assert!(result.score > 0.999);
        let map = result.score_map.unwrap();
        assert_eq!((map.width(), map.height()), (41, 36));
    }

    #[test]
    fn multiscale_skips_oversized_scales() {
        let search = textured(30, 30);
        let template = textured(30, 30);
        let result = Correlator::new(true)
            .locate_multiscale(&search, &template, &ScaleRange::default())
            .unwrap();
        // Only 0.90 and 0.95 leave the template strictly smaller.
        assert!(result.scale < 1.0);
        assert!(result.score_map.is_some());
    }

    #[test]
    fn multiscale_without_valid_scale_reports_minus_one() {
        let search = textured(12, 12);
        let template = textured(8, 8);
        let result = Correlator::new(false)
            .locate_multiscale(&search, &template, &ScaleRange::default())
            .unwrap();
        assert_eq!(result.score, -1.0);
        assert!(result.score_map.is_none());
        assert_eq!(result.found, Rect::new(0, 0, 8, 8));
    }

    #[test]
    fn scaled_side_truncates() {
        assert_eq!(scaled_side(40, 0.95), 38);
        assert_eq!(scaled_side(40, 1.0), 40);
        assert_eq!(scaled_side(25, 1.1), 27);
    }
}
