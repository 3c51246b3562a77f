//! Line-oriented ROI store codec.
//!
//! One ROI per line:
//!
//! ```text
//! x y w h | name=U7 | score=0.8 | edge=0.5 | bright=0.6 | left=false | leftratio=0.4 | search=0,0,320,240
//! ```
//!
//! The geometry head is required; lines whose head does not parse are
//! skipped. Override tokens are optional, unknown keys are ignored, and a value
//! that fails to parse leaves only that override unset. Names are written
//! trimmed, with `|` and line breaks replaced by `_`.

use crate::geom::Rect;
use crate::roi::{default_name, index_at, RoiDefinition};
use crate::util::{PcbCheckError, PcbCheckResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Parses a whole store file; blank and malformed lines are skipped.
///
/// Indices (and default names) are assigned densely in line order.
pub fn parse_store(text: &str) -> Vec<RoiDefinition> {
    let mut rois = Vec::new();
    for line in text.lines() {
        if let Some(roi) = parse_line(line, index_at(rois.len())) {
            rois.push(roi);
        }
    }
    rois
}

/// Parses one store line for the ROI at 1-based `index`.
pub fn parse_line(line: &str, index: usize) -> Option<RoiDefinition> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut parts = line.split('|').map(str::trim).filter(|p| !p.is_empty());
    let rect = parse_rect(parts.next()?, &[' ', '\t', ','])?;

    let mut roi = RoiDefinition::new(index, rect);
    for token in parts {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        apply_token(&mut roi, &key.trim().to_ascii_lowercase(), value.trim());
    }
    Some(roi)
}

fn apply_token(roi: &mut RoiDefinition, key: &str, value: &str) {
    let o = &mut roi.overrides;
    match key {
        "name" => roi.name = value.to_string(),
        "score" | "scoreth" => set_parsed(&mut o.score_threshold, value.parse().ok()),
        "edge" | "edgeth" | "edgeratio" => {
            set_parsed(&mut o.edge_ratio_threshold, value.parse().ok())
        }
        "bright" | "brightth" => set_parsed(&mut o.bright_ratio_threshold, value.parse().ok()),
        "left" | "useleft" | "leftsearch" => set_parsed(&mut o.use_left_search, parse_bool(value)),
        "leftratio" => set_parsed(&mut o.left_search_ratio, value.parse().ok()),
        "search" => set_parsed(&mut o.search_rect, parse_rect(value, &[' ', '\t', ',', ';'])),
        _ => {}
    }
}

fn set_parsed<T>(slot: &mut Option<T>, parsed: Option<T>) {
    if parsed.is_some() {
        *slot = parsed;
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_rect(text: &str, separators: &[char]) -> Option<Rect> {
    let mut nums = text
        .split(|c| separators.contains(&c))
        .filter(|s| !s.is_empty())
        .map(str::parse::<i32>);
    let x = nums.next()?.ok()?;
    let y = nums.next()?.ok()?;
    let width = nums.next()?.ok()?;
    let height = nums.next()?.ok()?;
    Some(Rect::new(x, y, width, height))
}

/// Formats one ROI as a store line, omitting unset overrides.
pub fn format_line(roi: &RoiDefinition) -> String {
    let r = roi.rect;
    let mut tokens = vec![format!("{} {} {} {}", r.x, r.y, r.width, r.height)];
    let name = store_name(&roi.name);
    if !name.is_empty() {
        tokens.push(format!("name={name}"));
    }
    let o = &roi.overrides;
    if let Some(v) = o.score_threshold {
        tokens.push(format!("score={v}"));
    }
    if let Some(v) = o.edge_ratio_threshold {
        tokens.push(format!("edge={v}"));
    }
    if let Some(v) = o.bright_ratio_threshold {
        tokens.push(format!("bright={v}"));
    }
    if let Some(v) = o.use_left_search {
        tokens.push(format!("left={v}"));
    }
    if let Some(v) = o.left_search_ratio {
        tokens.push(format!("leftratio={v}"));
    }
    if let Some(s) = o.search_rect {
        tokens.push(format!("search={},{},{},{}", s.x, s.y, s.width, s.height));
    }
    tokens.join(" | ")
}

fn store_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if matches!(c, '|' | '\n' | '\r') { '_' } else { c })
        .collect()
}

/// Formats a ROI list as store text, one line per ROI.
pub fn format_store(rois: &[RoiDefinition]) -> String {
    let mut text = String::new();
    for roi in rois {
        text.push_str(&format_line(roi));
        text.push('\n');
    }
    text
}

/// ROI store backed by a text file.
#[derive(Clone, Debug)]
pub struct RoiStore {
    path: PathBuf,
}

impl RoiStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the ROI list; a missing file means no ROIs.
    pub fn load(&self) -> PcbCheckResult<Vec<RoiDefinition>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse_store(&text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(self.io_error(err)),
        }
    }

    /// Writes the ROI list, replacing the previous file only once the new
    /// content is fully on disk.
    pub fn save(&self, rois: &[RoiDefinition]) -> PcbCheckResult<()> {
        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        fs::write(&tmp, format_store(rois)).map_err(|err| self.io_error(err))?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(err));
        }
        Ok(())
    }

    fn io_error(&self, err: std::io::Error) -> PcbCheckError {
        PcbCheckError::StoreIo {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}

/// Fills blank names with the default name for each position.
pub(crate) fn fill_default_names(rois: &mut [RoiDefinition]) {
    for (position, roi) in rois.iter_mut().enumerate() {
        if roi.name.trim().is_empty() {
            roi.name = default_name(index_at(position));
        }
    }
}
