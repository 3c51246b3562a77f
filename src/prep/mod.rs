//! Matching-ready image preparation.
//!
//! Correlation runs either on a gradient-magnitude image or on a
//! shading-normalized grayscale image. Gradient matching is preferred; patches
//! with almost no gradient response (bare substrate) fall back to shading
//! normalization, where illumination variation is the only usable signal.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

pub mod corroborate;

pub use corroborate::{bright_ratio, edge_map, BRIGHT_CUTOFF};

/// Gaussian sigma equivalent to a 3x3 smoothing kernel.
pub const LIGHT_SIGMA: f32 = 0.8;

/// Gaussian sigma equivalent to a 35x35 kernel, used as the shading estimate.
pub const SHADING_SIGMA: f32 = 5.6;

/// Level a locally flat region maps to after shading normalization.
pub const MID_GRAY: f32 = 128.0;

/// Gradient images with fewer non-zero pixels than this are treated as flat.
pub const MIN_GRADIENT_PIXELS: usize = 30;

/// Which representation a prepared image ended up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrepKind {
    /// Smoothed Sobel gradient magnitude.
    Gradient,
    /// Grayscale divided by its heavily blurred copy.
    Shading,
}

/// A matching-ready image together with the representation chosen for it.
#[derive(Clone, Debug)]
pub struct Prepared {
    pub image: GrayImage,
    pub kind: PrepKind,
}

/// Prepares `gray` for correlation.
///
/// With `edge_match` enabled the gradient magnitude is used unless it has fewer
/// than [`MIN_GRADIENT_PIXELS`] non-zero pixels; otherwise, and whenever
/// `edge_match` is off, the shading-normalized image is used.
pub fn prepare_for_match(gray: &GrayImage, edge_match: bool) -> Prepared {
    if edge_match {
        let mag = gradient_magnitude(gray);
        if count_nonzero(&mag) >= MIN_GRADIENT_PIXELS {
            return Prepared {
                image: mag,
                kind: PrepKind::Gradient,
            };
        }
    }
    Prepared {
        image: shade_normalize(gray),
        kind: PrepKind::Shading,
    }
}

/// Equal-weighted sum of absolute 3x3 Sobel responses, lightly smoothed.
pub fn gradient_magnitude(gray: &GrayImage) -> GrayImage {
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    let mag = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let ax = saturate_abs(gx.get_pixel(x, y)[0]);
        let ay = saturate_abs(gy.get_pixel(x, y)[0]);
        Luma([(0.5 * ax + 0.5 * ay).round().min(255.0) as u8])
    });
    to_u8(&blur_f32(&mag, LIGHT_SIGMA))
}

fn saturate_abs(v: i16) -> f32 {
    f32::from(v.unsigned_abs().min(255))
}

/// Divides `gray` by a heavily blurred copy of itself, scaled so that a flat
/// region maps to [`MID_GRAY`].
pub fn shade_normalize(gray: &GrayImage) -> GrayImage {
    let background = blur_f32(gray, SHADING_SIGMA);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let bg = background.get_pixel(x, y)[0];
        if bg < 0.5 {
            return Luma([0]);
        }
        let v = f32::from(gray.get_pixel(x, y)[0]) * MID_GRAY / bg;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Gaussian-blurs an 8-bit image in `f32` to avoid intermediate rounding.
pub(crate) fn blur_f32(gray: &GrayImage, sigma: f32) -> ImageBuffer<Luma<f32>, Vec<f32>> {
    let f = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([f32::from(gray.get_pixel(x, y)[0])])
    });
    gaussian_blur_f32(&f, sigma)
}

/// Rounds an `f32` image back to 8 bits with saturation.
pub(crate) fn to_u8(img: &ImageBuffer<Luma<f32>, Vec<f32>>) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([img.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
    })
}

/// Number of pixels with a non-zero value.
pub fn count_nonzero(img: &GrayImage) -> usize {
    img.as_raw().iter().filter(|&&v| v != 0).count()
}
