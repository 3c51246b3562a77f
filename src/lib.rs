//! pcbcheck inspects PCB photographs for missing components.
//!
//! Each ROI of a known-good golden image is located in a test image with
//! zero-mean normalized cross-correlation, then corroborated with edge-density
//! and brightness checks before the per-ROI verdicts are folded into one
//! overall result. The [`editor`] module provides the interactive geometry
//! editor that produces the ROI list, persisted by [`roi::RoiStore`].
//!
//! Optional features: `rayon` evaluates ROIs and score-map rows in parallel,
//! `tracing` emits spans and events for each stage.

pub mod config;
pub mod editor;
pub mod geom;
pub mod image;
pub mod inspect;
pub mod kernel;
pub mod prep;
pub mod roi;
pub mod search;
pub mod template;
mod trace;
pub mod util;
pub mod workspace;

pub use config::{resolve, GlobalConfig, ResolvedRoiConfig, RoiOverrides, ScaleRange, SearchWindow};
pub use editor::{EditorEffect, EditorSession, Key, Modifiers, PointerButton, ViewTransform};
pub use geom::{inflate_around, safe_rect, PointF, Rect, RectF, Size};
pub use self::image::{ImageView, ScoreMap};
pub use inspect::{aggregate, Aggregation, Inspection, InspectionReport, Inspector, PresenceVerdict};
pub use roi::{RoiDefinition, RoiStore};
pub use search::{Correlator, MatchResult};
pub use template::{Template, TemplatePlan};
pub use util::{PcbCheckError, PcbCheckResult};
pub use workspace::Workspace;
