//! Template plan precomputation for normalized cross-correlation.

use crate::image::ImageView;
use crate::util::{PcbCheckError, PcbCheckResult};

/// Variance (per pixel) below which a template is treated as flat.
pub(crate) const FLAT_VARIANCE: f64 = 1e-8;

/// Precomputed statistics and zero-mean buffer for correlation.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f64,
    var_t: f64,
    zero_mean: Vec<f64>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    ///
    /// Flat templates are accepted; [`TemplatePlan::is_flat`] reports them so
    /// the kernel can apply the degenerate-denominator convention.
    pub fn from_view(tpl: ImageView<'_, u8>) -> PcbCheckResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(PcbCheckError::InvalidDimensions { width, height })?;

        let mut sum = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(PcbCheckError::BufferTooSmall {
                needed: count,
                got: y * width,
            })?;
            sum += row.iter().map(|&v| f64::from(v)).sum::<f64>();
        }
        let mean = sum / count as f64;

        let mut zero_mean = Vec::with_capacity(count);
        let mut var_t = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(PcbCheckError::BufferTooSmall {
                needed: count,
                got: y * width,
            })?;
            for &value in row {
                let centered = f64::from(value) - mean;
                var_t += centered * centered;
                zero_mean.push(centered);
            }
        }

        Ok(Self {
            width,
            height,
            mean,
            var_t,
            zero_mean,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the mean.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn zero_mean(&self) -> &[f64] {
        &self.zero_mean
    }

    /// True when the template has (numerically) no intensity variation.
    pub fn is_flat(&self) -> bool {
        self.var_t / (self.width * self.height) as f64 <= FLAT_VARIANCE
    }
}
