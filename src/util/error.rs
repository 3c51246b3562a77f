//! Error types for pcbcheck.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for pcbcheck operations.
pub type PcbCheckResult<T> = std::result::Result<T, PcbCheckError>;

/// Errors that can occur while inspecting boards or editing ROIs.
///
/// Geometry problems during interactive editing are never reported here: rects
/// are clamped into the image instead. Malformed ROI store lines are skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PcbCheckError {
    /// Width or height is zero or overflows.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Backing buffer is shorter than the view requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The template does not fit inside the search window.
    #[error("template {tpl_width}x{tpl_height} larger than search window {img_width}x{img_height}")]
    TemplateTooLarge {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// An input image path does not resolve to a file.
    #[error("input image not found: {path}")]
    InputMissing { path: PathBuf },
    /// An input image exists but decodes to nothing usable.
    #[error("failed to decode {path}: {reason}")]
    DecodeFailure { path: PathBuf, reason: String },
    /// Writing an image artifact or template failed.
    #[error("image write failed for {path}: {reason}")]
    ImageIo { path: PathBuf, reason: String },
    /// Reading or writing the ROI store failed.
    #[error("roi store i/o failed for {path}: {reason}")]
    StoreIo { path: PathBuf, reason: String },
    /// The ROI list is empty, so there is nothing to inspect.
    #[error("no ROIs defined")]
    NoRois,
    /// An editor command arrived after the session was committed.
    #[error("editor session is not active")]
    SessionInactive,
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
