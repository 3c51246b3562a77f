//! Scalar reference kernel for score evaluation.

use crate::image::{ImageView, ScoreMap};
use crate::kernel::{map_dims, Kernel, MIN_VAR_I};
use crate::template::TemplatePlan;
use crate::util::PcbCheckResult;

/// Scalar ZNCC kernel.
pub struct ZnccScalar;

impl Kernel for ZnccScalar {
    fn score_at(image: ImageView<'_, u8>, tpl: &TemplatePlan, x: usize, y: usize) -> f32 {
        let tpl_width = tpl.width();
        let tpl_height = tpl.height();
        if x + tpl_width > image.width() || y + tpl_height > image.height() {
            return f32::NEG_INFINITY;
        }
        if tpl.is_flat() {
            return 1.0;
        }

        let t_prime = tpl.zero_mean();
        let n = (tpl_width * tpl_height) as f64;
        let mut dot = 0.0f64;
        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;

        for ty in 0..tpl_height {
            let Some(img_row) = image.row(y + ty) else {
                return f32::NEG_INFINITY;
            };
            let base = ty * tpl_width;
            for (tx, &pixel) in img_row[x..x + tpl_width].iter().enumerate() {
                let value = f64::from(pixel);
                dot += t_prime[base + tx] * value;
                sum_i += value;
                sum_i2 += value * value;
            }
        }

        let var_i = sum_i2 - (sum_i * sum_i) / n;
        if var_i <= MIN_VAR_I {
            return 0.0;
        }
        let score = dot / (tpl.var_t() * var_i).sqrt();
        if score.is_finite() {
            score.clamp(-1.0, 1.0) as f32
        } else {
            0.0
        }
    }

    fn score_map(image: ImageView<'_, u8>, tpl: &TemplatePlan) -> PcbCheckResult<ScoreMap> {
        let (map_width, map_height) = map_dims(&image, tpl)?;
        let mut scores = Vec::with_capacity(map_width * map_height);
        for y in 0..map_height {
            for x in 0..map_width {
                scores.push(Self::score_at(image, tpl, x, y));
            }
        }
        ScoreMap::from_vec(scores, map_width, map_height)
    }
}
