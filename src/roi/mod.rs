//! ROI definitions and their persisted store.
//!
//! A ROI's index is not stored on the definition: it is always its 1-based
//! position in the list it belongs to, so deleting or reordering ROIs can never
//! leave a stale index behind.

use crate::config::RoiOverrides;
use crate::geom::Rect;
use serde::{Deserialize, Serialize};

pub mod store;

pub use store::{format_line, format_store, parse_line, parse_store, RoiStore};

/// One region expected to contain a component, in golden-image coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiDefinition {
    pub name: String,
    pub rect: Rect,
    #[serde(default)]
    pub overrides: RoiOverrides,
}

impl RoiDefinition {
    /// A ROI with the default name for `index` and no overrides.
    pub fn new(index: usize, rect: Rect) -> Self {
        Self {
            name: default_name(index),
            rect,
            overrides: RoiOverrides::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_overrides(mut self, overrides: RoiOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Default display name for the ROI at 1-based `index`.
pub fn default_name(index: usize) -> String {
    format!("ROI{index}")
}

/// 1-based index of the ROI stored at list position `position`.
pub fn index_at(position: usize) -> usize {
    position + 1
}
