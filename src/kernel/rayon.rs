//! Rayon row-parallel kernel (feature-gated).
//!
//! Rows of the score map are computed independently and concatenated in row
//! order, so the result is identical to the scalar kernel.

use crate::image::{ImageView, ScoreMap};
use crate::kernel::scalar::ZnccScalar;
use crate::kernel::{map_dims, Kernel};
use crate::template::TemplatePlan;
use crate::util::PcbCheckResult;
use rayon::prelude::*;

/// Row-parallel ZNCC kernel.
pub struct ZnccRowParallel;

impl Kernel for ZnccRowParallel {
    fn score_at(image: ImageView<'_, u8>, tpl: &TemplatePlan, x: usize, y: usize) -> f32 {
        <ZnccScalar as Kernel>::score_at(image, tpl, x, y)
    }

    fn score_map(image: ImageView<'_, u8>, tpl: &TemplatePlan) -> PcbCheckResult<ScoreMap> {
        let (map_width, map_height) = map_dims(&image, tpl)?;
        let rows: Vec<Vec<f32>> = (0..map_height)
            .into_par_iter()
            .map(|y| {
                (0..map_width)
                    .map(|x| Self::score_at(image, tpl, x, y))
                    .collect()
            })
            .collect();
        ScoreMap::from_vec(rows.concat(), map_width, map_height)
    }
}

#[cfg(test)]
mod tests {
    use super::ZnccRowParallel;
    use crate::image::ImageView;
    use crate::kernel::scalar::ZnccScalar;
    use crate::kernel::Kernel;
    use crate::template::TemplatePlan;

    #[test]
    fn parallel_matches_scalar() {
        let data: Vec<u8> = (0..40 * 30)
            .map(|i| ((i * 37 + (i / 40) * 11) & 0xFF) as u8)
            .collect();
        let view = ImageView::from_slice(&data, 40, 30).unwrap();
        let patch: Vec<u8> = (8..15)
            .flat_map(|y| data[y * 40 + 10..y * 40 + 19].iter().copied())
            .collect();
        let plan = TemplatePlan::from_view(ImageView::from_slice(&patch, 9, 7).unwrap()).unwrap();
        let a = <ZnccScalar as Kernel>::score_map(view, &plan).unwrap();
        let b = <ZnccRowParallel as Kernel>::score_map(view, &plan).unwrap();
        assert_eq!(a, b);
    }
}
