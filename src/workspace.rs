//! On-disk layout of an inspection workspace.
//!
//! All files live directly in one folder and are named by the ROI's 1-based
//! index, zero-padded to two digits, so concurrent per-ROI writers never
//! collide.

use crate::roi::RoiStore;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the ROI store inside a workspace.
pub const STORE_FILE: &str = "roi.txt";
/// File name of the combined overlay image.
pub const OVERLAY_FILE: &str = "result_vis.png";
/// File name of the machine-readable verdict summary.
pub const REPORT_FILE: &str = "result.json";

/// Folder holding the ROI store, template overrides and diagnostic artifacts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the workspace folder if needed.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    pub fn store(&self) -> RoiStore {
        RoiStore::new(self.root.join(STORE_FILE))
    }

    /// Saved template for ROI `index`; read by inspection, written on commit.
    pub fn template_path(&self, index: usize) -> PathBuf {
        self.indexed("golden_roi", index)
    }

    /// Template written during an editor commit, renamed to
    /// [`Workspace::template_path`] once the store is saved.
    pub fn staged_template_path(&self, index: usize) -> PathBuf {
        self.root.join(format!("golden_roi_{index:02}.staged.png"))
    }

    /// Located test-image crop for ROI `index`.
    pub fn test_crop_path(&self, index: usize) -> PathBuf {
        self.indexed("test_roi", index)
    }

    /// Edge map of the located test crop for ROI `index`.
    pub fn test_edges_path(&self, index: usize) -> PathBuf {
        self.indexed("test_edges", index)
    }

    /// False-color score map for ROI `index`.
    pub fn score_map_path(&self, index: usize) -> PathBuf {
        self.indexed("score_map", index)
    }

    pub fn overlay_path(&self) -> PathBuf {
        self.root.join(OVERLAY_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    fn indexed(&self, stem: &str, index: usize) -> PathBuf {
        self.root.join(format!("{stem}_{index:02}.png"))
    }
}

#[cfg(test)]
mod tests {
    use super::Workspace;
    use std::path::Path;

    #[test]
    fn indexed_names_are_zero_padded() {
        let ws = Workspace::new("/tmp/ws");
        assert_eq!(ws.template_path(3), Path::new("/tmp/ws/golden_roi_03.png"));
        assert_eq!(
            ws.staged_template_path(3),
            Path::new("/tmp/ws/golden_roi_03.staged.png")
        );
        assert_eq!(ws.score_map_path(12), Path::new("/tmp/ws/score_map_12.png"));
        assert_eq!(ws.store().path(), Path::new("/tmp/ws/roi.txt"));
    }
}
