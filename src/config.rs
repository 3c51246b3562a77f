//! Global inspection configuration and per-ROI overrides.
//!
//! A ROI may override a handful of global values. Overrides are kept sparse in
//! [`RoiOverrides`] and merged with the global [`GlobalConfig`] in exactly one
//! place, [`resolve`], which yields a fully populated [`ResolvedRoiConfig`].

use crate::geom::Rect;
use crate::util::{PcbCheckError, PcbCheckResult};
use serde::{Deserialize, Serialize};

/// Template scale sweep used by multi-scale matching.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self {
            min: 0.90,
            max: 1.10,
            step: 0.05,
        }
    }
}

impl ScaleRange {
    /// Scale factors from `min` to `max` inclusive, ascending.
    ///
    /// Factors are computed as `min + i * step` so the sweep does not drift;
    /// a small tolerance keeps `max` itself in the sweep.
    pub fn factors(&self) -> Vec<f64> {
        if !(self.step > 0.0) || self.max < self.min {
            return Vec::new();
        }
        let count = ((self.max - self.min) / self.step + 1e-9).floor() as usize + 1;
        (0..count)
            .map(|i| self.min + i as f64 * self.step)
            .collect()
    }

    /// True if `scale` is inside the sweep range, up to float drift.
    pub fn contains(&self, scale: f64) -> bool {
        scale >= self.min - 1e-9 && scale <= self.max + 1e-9
    }
}

/// Process-wide inspection defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Minimum correlation score for a ROI to count as present.
    pub score_threshold: f64,
    /// Required test/golden edge-pixel ratio.
    pub edge_ratio_threshold: f64,
    /// Required test/golden bright-pixel ratio.
    pub bright_ratio_threshold: f64,
    /// Restrict unlocked searches to the left part of the test image.
    pub use_left_search: bool,
    /// Width fraction of the left search window.
    pub left_search_ratio: f64,
    /// Sweep template scales instead of matching at 1.0 only.
    pub multi_scale: bool,
    pub scale: ScaleRange,
    /// Correlate gradient magnitude instead of shading-normalized gray.
    pub edge_match: bool,
    /// Overall verdict is AND over ROIs when set, OR otherwise.
    pub all_must_be_present: bool,
    /// Search only a neighborhood of each ROI's own position.
    pub lock_to_golden: bool,
    /// Neighborhood margin as a fraction of the ROI size, per side.
    pub lock_margin: f64,
    /// Evaluate ROIs in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.70,
            edge_ratio_threshold: 0.65,
            bright_ratio_threshold: 0.70,
            use_left_search: true,
            left_search_ratio: 0.60,
            multi_scale: false,
            scale: ScaleRange::default(),
            edge_match: true,
            all_must_be_present: true,
            lock_to_golden: true,
            lock_margin: 0.30,
            parallel: false,
        }
    }
}

impl GlobalConfig {
    /// Checks that the configuration can drive an inspection run.
    pub fn validate(&self) -> PcbCheckResult<()> {
        let thresholds = [
            self.score_threshold,
            self.edge_ratio_threshold,
            self.bright_ratio_threshold,
        ];
        if thresholds.iter().any(|t| !t.is_finite()) {
            return Err(PcbCheckError::InvalidInput("thresholds must be finite"));
        }
        if !(self.left_search_ratio > 0.0 && self.left_search_ratio <= 1.0) {
            return Err(PcbCheckError::InvalidInput(
                "left_search_ratio must be in (0, 1]",
            ));
        }
        if !(self.lock_margin >= 0.0) {
            return Err(PcbCheckError::InvalidInput("lock_margin must be >= 0"));
        }
        if self.multi_scale && (self.scale.min <= 0.0 || self.scale.factors().is_empty()) {
            return Err(PcbCheckError::InvalidInput(
                "scale range needs 0 < min <= max and step > 0",
            ));
        }
        Ok(())
    }
}

/// Sparse per-ROI overrides; `None` means "use the global value".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiOverrides {
    pub score_threshold: Option<f64>,
    pub edge_ratio_threshold: Option<f64>,
    pub bright_ratio_threshold: Option<f64>,
    pub use_left_search: Option<bool>,
    pub left_search_ratio: Option<f64>,
    /// Explicit search window in test-image coordinates; wins over every
    /// other search policy.
    pub search_rect: Option<Rect>,
}

impl RoiOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// How the search window for a ROI is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SearchWindow {
    /// Use this rect, clamped into the test image.
    Explicit(Rect),
    /// The ROI's own rect grown by `margin` on each side.
    LockToGolden { margin: f64 },
    /// The leftmost `ratio` of the test image width, full height.
    Left { ratio: f64 },
    /// The whole test image.
    Full,
}

/// Fully resolved settings for one ROI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedRoiConfig {
    pub score_threshold: f64,
    pub edge_ratio_threshold: f64,
    pub bright_ratio_threshold: f64,
    pub search: SearchWindow,
}

/// Merges `overrides` over `base`.
///
/// Search precedence: explicit rect, then lock-to-golden, then the left
/// window if left search is on, else the full image.
pub fn resolve(base: &GlobalConfig, overrides: &RoiOverrides) -> ResolvedRoiConfig {
    let search = if let Some(rect) = overrides.search_rect {
        SearchWindow::Explicit(rect)
    } else if base.lock_to_golden {
        SearchWindow::LockToGolden {
            margin: base.lock_margin,
        }
    } else if overrides.use_left_search.unwrap_or(base.use_left_search) {
        SearchWindow::Left {
            ratio: overrides
                .left_search_ratio
                .unwrap_or(base.left_search_ratio),
        }
    } else {
        SearchWindow::Full
    };

    ResolvedRoiConfig {
        score_threshold: overrides.score_threshold.unwrap_or(base.score_threshold),
        edge_ratio_threshold: overrides
            .edge_ratio_threshold
            .unwrap_or(base.edge_ratio_threshold),
        bright_ratio_threshold: overrides
            .bright_ratio_threshold
            .unwrap_or(base.bright_ratio_threshold),
        search,
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve, GlobalConfig, RoiOverrides, ScaleRange, SearchWindow};
    use crate::geom::Rect;

    #[test]
    fn default_scale_sweep_hits_one() {
        let factors = ScaleRange::default().factors();
        assert_eq!(factors.len(), 5);
        assert!((factors[2] - 1.0).abs() < 1e-12);
        assert!((factors[4] - 1.10).abs() < 1e-12);
    }

    #[test]
    fn overrides_win_over_globals() {
        let base = GlobalConfig::default();
        let overrides = RoiOverrides {
            score_threshold: Some(0.5),
            ..RoiOverrides::default()
        };
        let resolved = resolve(&base, &overrides);
        assert_eq!(resolved.score_threshold, 0.5);
        assert_eq!(resolved.edge_ratio_threshold, 0.65);
        assert_eq!(resolved.search, SearchWindow::LockToGolden { margin: 0.30 });
    }

    #[test]
    fn explicit_search_rect_beats_lock() {
        let rect = Rect::new(1, 2, 30, 40);
        let overrides = RoiOverrides {
            search_rect: Some(rect),
            ..RoiOverrides::default()
        };
        let resolved = resolve(&GlobalConfig::default(), &overrides);
        assert_eq!(resolved.search, SearchWindow::Explicit(rect));
    }

    #[test]
    fn unlocked_search_honors_left_override() {
        let base = GlobalConfig {
            lock_to_golden: false,
            ..GlobalConfig::default()
        };
        let left_off = RoiOverrides {
            use_left_search: Some(false),
            ..RoiOverrides::default()
        };
        assert_eq!(resolve(&base, &left_off).search, SearchWindow::Full);

        let narrow = RoiOverrides {
            left_search_ratio: Some(0.25),
            ..RoiOverrides::default()
        };
        assert_eq!(
            resolve(&base, &narrow).search,
            SearchWindow::Left { ratio: 0.25 }
        );
    }

    #[test]
    fn validate_rejects_bad_ratio() {
        let cfg = GlobalConfig {
            left_search_ratio: 0.0,
            ..GlobalConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(GlobalConfig::default().validate().is_ok());
    }
}
