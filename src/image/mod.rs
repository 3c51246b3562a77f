//! Image views, crops, score maps and file I/O.
//!
//! `ImageView` is a borrowed 2D view into a contiguous row-major buffer. The
//! correlation kernels read it row by row; everything else works on owned
//! `image` buffers.

use crate::geom::{safe_rect, Rect, Size};
use crate::util::{PcbCheckError, PcbCheckResult};
use image::GrayImage;

pub mod io;
pub mod score_map;

pub use score_map::ScoreMap;

/// Borrowed contiguous 2D image view.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
}

impl<'a> ImageView<'a, u8> {
    /// Creates a view over an 8-bit grayscale buffer.
    pub fn from_gray(img: &'a GrayImage) -> PcbCheckResult<Self> {
        Self::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
    }
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a view over `width * height` row-major elements.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> PcbCheckResult<Self> {
        if width == 0 || height == 0 {
            return Err(PcbCheckError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(PcbCheckError::InvalidDimensions { width, height })?;
        if data.len() < needed {
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

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns row `y` as a slice of length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.width)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }
}

/// Copies the region `rect` (clamped into the image first) out of `img`.
pub fn crop_gray(img: &GrayImage, rect: Rect) -> GrayImage {
    let r = safe_rect(rect, Size::of(img));
    image::imageops::crop_imm(img, r.x as u32, r.y as u32, r.width as u32, r.height as u32)
        .to_image()
}

#[cfg(test)]
mod tests {
    use super::{crop_gray, ImageView};
    use crate::geom::Rect;
    use crate::util::PcbCheckError;
    use image::GrayImage;

    #[test]
    fn rows_follow_buffer_layout() {
        let data: Vec<u8> = (0u8..12).collect();
        let view = ImageView::from_slice(&data, 4, 3).unwrap();
        assert_eq!(view.row(1).unwrap(), &[4u8, 5, 6, 7]);
        assert!(view.row(3).is_none());
    }

    #[test]
    fn view_rejects_short_buffer() {
        let data = [0u8; 7];
        let err = ImageView::from_slice(&data, 4, 2).err().unwrap();
        assert_eq!(err, PcbCheckError::BufferTooSmall { needed: 8, got: 7 });
        let err = ImageView::from_slice(&data, 0, 2).err().unwrap();
        assert_eq!(err, PcbCheckError::InvalidDimensions { width: 0, height: 2 });
    }

    #[test]
    fn crop_clamps_to_image() {
        let img = GrayImage::from_fn(10, 10, |x, y| image::Luma([(x + 10 * y) as u8]));
        let crop = crop_gray(&img, Rect::new(8, 8, 5, 5));
        assert_eq!(crop.dimensions(), (2, 2));
        assert_eq!(crop.get_pixel(0, 0)[0], 88);
    }
}
