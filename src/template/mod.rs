//! Per-ROI templates and correlation planning.

use crate::geom::Rect;
use crate::image::crop_gray;
use crate::image::io::load_gray_if_present;
use image::GrayImage;
use std::path::Path;

mod plan;

pub use plan::TemplatePlan;

/// Where a template's pixels came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateSource {
    /// An operator-supplied (or editor-derived) file on disk.
    Saved,
    /// Cropped from the golden image at the ROI rect.
    GoldenCrop,
}

/// Grayscale template patch searched for in the test image.
#[derive(Clone, Debug)]
pub struct Template {
    image: GrayImage,
    source: TemplateSource,
}

impl Template {
    /// Wraps an existing grayscale patch.
    pub fn new(image: GrayImage, source: TemplateSource) -> Self {
        Self { image, source }
    }

    /// Uses the saved template at `saved` if it decodes, else crops the golden
    /// image at `roi`.
    pub fn select(saved: &Path, golden_gray: &GrayImage, roi: Rect) -> Self {
        match load_gray_if_present(saved) {
            Some(image) => Self::new(image, TemplateSource::Saved),
            None => Self::new(crop_gray(golden_gray, roi), TemplateSource::GoldenCrop),
        }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn source(&self) -> TemplateSource {
        self.source
    }
}
