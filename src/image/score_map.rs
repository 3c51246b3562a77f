//! Dense correlation score maps and their false-color rendering.
//!
//! A score map holds one correlation value per candidate offset of a template
//! inside a search window, so its size is
//! `(window_w - tpl_w + 1) x (window_h - tpl_h + 1)`.

use crate::util::{PcbCheckError, PcbCheckResult};
use image::{Rgb, RgbImage};

/// Owned contiguous `f32` score grid.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMap {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl ScoreMap {
    /// Wraps a row-major score buffer of exactly `width * height` values.
    pub fn from_vec(data: Vec<f32>, width: usize, height: usize) -> PcbCheckResult<Self> {
        if width == 0 || height == 0 {
            return Err(PcbCheckError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(PcbCheckError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(PcbCheckError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the score at offset `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Returns the first maximum in row-major order as `(x, y, score)`.
    pub fn max_loc(&self) -> (usize, usize, f32) {
        let mut best = (0usize, f32::NEG_INFINITY);
        for (idx, &value) in self.data.iter().enumerate() {
            if value > best.1 {
                best = (idx, value);
            }
        }
        (best.0 % self.width, best.0 / self.width, best.1)
    }

    /// Renders the map min-max normalized to `[0, 255]` through a jet palette.
    pub fn to_jet_image(&self) -> RgbImage {
        let (lo, hi) = self
            .data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = hi - lo;
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let v = self.data[y as usize * self.width + x as usize];
            let level = if range > f32::EPSILON {
                ((v - lo) / range * 255.0).round()
            } else {
                0.0
            };
            jet(level / 255.0)
        })
    }
}

/// Jet palette lookup for `t` in `[0, 1]`: blue through cyan, yellow to red.
fn jet(t: f32) -> Rgb<u8> {
    let channel = |offset: f32| {
        let v = (1.5 - (4.0 * t - offset).abs()).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    };
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

#[cfg(test)]
mod tests {
    use super::ScoreMap;

    #[test]
    fn max_loc_returns_first_maximum() {
        let map = ScoreMap::from_vec(vec![0.1, 0.9, 0.3, 0.9], 2, 2).unwrap();
        assert_eq!(map.max_loc(), (1, 0, 0.9));
    }

    #[test]
    fn jet_rendering_spans_palette_ends() {
        let map = ScoreMap::from_vec(vec![-1.0, 1.0], 2, 1).unwrap();
        let img = map.to_jet_image();
        let cold = img.get_pixel(0, 0);
        let hot = img.get_pixel(1, 0);
        assert!(cold[2] > cold[0]);
        assert!(hot[0] > hot[2]);
    }

    #[test]
    fn rejects_mismatched_length() {
        assert!(ScoreMap::from_vec(vec![0.0; 3], 2, 2).is_err());
    }
}
