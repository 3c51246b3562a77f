//! Auxiliary measures that back up a correlation score.
//!
//! Correlation alone rates a near-uniform patch of bare substrate highly
//! against a similarly uniform template. Edge density and the share of bright
//! pixels are cheap to compute and drop sharply when a component is missing.

use crate::prep::{blur_f32, shade_normalize, to_u8, LIGHT_SIGMA};
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::{close, open};

/// Lower hysteresis threshold for the edge detector.
pub const CANNY_LOW: f32 = 30.0;

/// Upper hysteresis threshold for the edge detector.
pub const CANNY_HIGH: f32 = 90.0;

/// Shading-normalized level above which a pixel counts as bright.
pub const BRIGHT_CUTOFF: u8 = 200;

/// Binary edge map of a grayscale crop.
///
/// Shading normalization, a light blur, Canny, then a 3x3 opening followed by
/// a 3x3 closing to drop speckle.
pub fn edge_map(gray: &GrayImage) -> GrayImage {
    let norm = shade_normalize(gray);
    let smooth = to_u8(&blur_f32(&norm, LIGHT_SIGMA));
    let edges = canny(&smooth, CANNY_LOW, CANNY_HIGH);
    let opened = open(&edges, Norm::LInf, 1);
    close(&opened, Norm::LInf, 1)
}

/// Fraction of pixels brighter than [`BRIGHT_CUTOFF`] after shading
/// normalization.
pub fn bright_ratio(gray: &GrayImage) -> f64 {
    let norm = shade_normalize(gray);
    let total = norm.as_raw().len();
    if total == 0 {
        return 0.0;
    }
    let bright = norm.as_raw().iter().filter(|&&v| v > BRIGHT_CUTOFF).count();
    bright as f64 / total as f64
}
