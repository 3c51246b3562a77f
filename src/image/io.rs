//! Loading and saving images via the `image` crate.

use crate::util::{PcbCheckError, PcbCheckResult};
use image::{DynamicImage, GrayImage, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extensions considered when picking the newest test image in a folder.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

fn open_checked(path: &Path) -> PcbCheckResult<DynamicImage> {
    if !path.is_file() {
        return Err(PcbCheckError::InputMissing {
            path: path.to_path_buf(),
        });
    }
    let img = image::open(path).map_err(|err| PcbCheckError::DecodeFailure {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(PcbCheckError::DecodeFailure {
            path: path.to_path_buf(),
            reason: "empty image".to_string(),
        });
    }
    Ok(img)
}

/// Loads an image from disk as 8-bit RGB.
pub fn load_color<P: AsRef<Path>>(path: P) -> PcbCheckResult<RgbImage> {
    Ok(open_checked(path.as_ref())?.to_rgb8())
}

/// Loads an image from disk and converts it to 8-bit grayscale.
pub fn load_gray<P: AsRef<Path>>(path: P) -> PcbCheckResult<GrayImage> {
    Ok(open_checked(path.as_ref())?.to_luma8())
}

/// Loads a grayscale image if the file exists and decodes to a non-empty image.
pub fn load_gray_if_present<P: AsRef<Path>>(path: P) -> Option<GrayImage> {
    load_gray(path).ok()
}

/// Converts an RGB image to grayscale.
pub fn to_gray(img: &RgbImage) -> GrayImage {
    DynamicImage::ImageRgb8(img.clone()).to_luma8()
}

/// Writes an image, inferring the format from the extension.
pub fn save_image<P, Q>(img: &image::ImageBuffer<P, Vec<u8>>, path: Q) -> PcbCheckResult<()>
where
    P: image::PixelWithColorType<Subpixel = u8>,
    Q: AsRef<Path>,
{
    let path = path.as_ref();
    img.save(path).map_err(|err| PcbCheckError::ImageIo {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Returns the most recently modified image file directly inside `dir`.
///
/// Only files whose extension is in [`IMAGE_EXTENSIONS`] (case-insensitive)
/// are considered. Returns `None` if the folder is missing or has no match.
pub fn latest_image_in<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);
        if !is_image || !path.is_file() {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|meta| meta.modified()) else {
            continue;
        };
        if best.as_ref().map_or(true, |(time, _)| modified > *time) {
            best = Some((modified, path));
        }
    }
    best.map(|(_, path)| path)
}

/// Picks the test image path: the newest image in `folder` when given and
/// non-empty, otherwise `explicit`.
pub fn resolve_test_path(explicit: &Path, folder: Option<&Path>) -> PathBuf {
    folder
        .and_then(latest_image_in)
        .unwrap_or_else(|| explicit.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::{latest_image_in, load_color, resolve_test_path};
    use crate::util::PcbCheckError;
    use std::fs;
    use std::path::Path;

    #[test]
    fn missing_file_is_input_missing() {
        let err = load_color("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, PcbCheckError::InputMissing { .. }));
    }

    #[test]
    fn undecodable_file_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"not a png").unwrap();
        let err = load_color(&path).unwrap_err();
        assert!(matches!(err, PcbCheckError::DecodeFailure { .. }));
    }

    #[test]
    fn latest_ignores_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("board.PNG"), b"x").unwrap();
        let latest = latest_image_in(dir.path()).unwrap();
        assert_eq!(latest.file_name().unwrap(), "board.PNG");
    }

    #[test]
    fn resolve_falls_back_to_explicit_path() {
        let explicit = Path::new("test.jpg");
        let resolved = resolve_test_path(explicit, Some(Path::new("no/such/folder")));
        assert_eq!(resolved, explicit);
    }
}
