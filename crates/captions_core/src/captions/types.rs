//! Core caption data types.

use std::path::Path;
use std::sync::Arc;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::error::ParseError;

/// Supported caption formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionsFormat {
    /// WebVTT (.vtt)
    #[default]
    Vtt,
    /// SubRip (.srt)
    Srt,
    /// SubStation Alpha (.ssa)
    Ssa,
    /// Advanced SubStation Alpha (.ass)
    Ass,
}

impl CaptionsFormat {
    /// Detect format from file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::from_name(&ext)
    }

    /// Parse a format name (`vtt`, `srt`, `ssa`, `ass`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "vtt" | "webvtt" => Some(Self::Vtt),
            "srt" => Some(Self::Srt),
            "ssa" => Some(Self::Ssa),
            "ass" => Some(Self::Ass),
            _ => None,
        }
    }

    /// Get the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Vtt => "vtt",
            Self::Srt => "srt",
            Self::Ssa => "ssa",
            Self::Ass => "ass",
        }
    }

    /// Detect format from content.
    pub fn detect(content: &str) -> Self {
        let content_lower = content.to_lowercase();

        if content_lower.contains("[script info]")
            || content_lower.contains("[v4+ styles]")
            || content_lower.contains("[v4 styles]")
            || content_lower.contains("[events]")
        {
            return if content_lower.contains("[v4+ styles]") {
                Self::Ass
            } else {
                Self::Ssa
            };
        }

        if content.trim_start_matches('\u{feff}').trim().starts_with("WEBVTT") {
            return Self::Vtt;
        }

        Self::Srt
    }
}

/// Insertion-ordered string map.
///
/// Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap {
    entries: Vec<(String, String)>,
}

/// Header metadata (`key:value` pairs after the signature, or `[Script Info]`).
pub type HeaderMetadata = OrderedMap;

/// Presentational hints attached to a cue (SSA/ASS styles).
pub type Presentation = OrderedMap;

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry of `other` over this map.
    pub fn merge(&mut self, other: &OrderedMap) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }
}

impl Serialize for OrderedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Cue writing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WritingMode {
    /// Horizontal text.
    #[default]
    #[serde(rename = "none")]
    Horizontal,
    /// Vertical, growing right to left.
    #[serde(rename = "rl")]
    Rl,
    /// Vertical, growing left to right.
    #[serde(rename = "lr")]
    Lr,
}

impl WritingMode {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "rl" => Some(Self::Rl),
            "lr" => Some(Self::Lr),
            _ => None,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::Horizontal)
    }
}

/// Alignment of the cue box relative to its line position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineAlign {
    #[default]
    Start,
    Center,
    End,
}

impl LineAlign {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "start" => Some(Self::Start),
            "center" => Some(Self::Center),
            "end" => Some(Self::End),
            _ => None,
        }
    }
}

/// Alignment of the cue box relative to its text position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionAlign {
    LineLeft,
    Center,
    LineRight,
    #[default]
    Auto,
}

impl PositionAlign {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "line-left" => Some(Self::LineLeft),
            "center" => Some(Self::Center),
            "line-right" => Some(Self::LineRight),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Text alignment inside the cue box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueAlign {
    Start,
    #[default]
    Center,
    End,
    Left,
    Right,
}

impl CueAlign {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "start" => Some(Self::Start),
            "center" => Some(Self::Center),
            "end" => Some(Self::End),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Region scrolling behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionScroll {
    #[default]
    None,
    Up,
}

/// A named display area that cues may be anchored to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Region identifier, unique within one parse.
    pub id: String,
    /// Width as a percentage of the viewport.
    pub width: f64,
    /// Number of text lines the region shows.
    pub lines: u32,
    /// Anchor point inside the region (percentages).
    pub region_anchor_x: f64,
    pub region_anchor_y: f64,
    /// Anchor point inside the viewport (percentages).
    pub viewport_anchor_x: f64,
    pub viewport_anchor_y: f64,
    pub scroll: RegionScroll,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            id: String::new(),
            width: 100.0,
            lines: 3,
            region_anchor_x: 0.0,
            region_anchor_y: 100.0,
            viewport_anchor_x: 0.0,
            viewport_anchor_y: 100.0,
            scroll: RegionScroll::None,
        }
    }
}

/// A timed piece of caption text with its display settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cue {
    /// Cue identifier (the line preceding the timing line).
    pub id: String,
    /// Start time in seconds.
    pub start_time: f64,
    /// End time in seconds.
    pub end_time: f64,
    /// Raw cue text, lines joined with `\n`.
    pub text: String,
    /// Region this cue is rendered in, shared with the parse result.
    #[serde(serialize_with = "serialize_region_id")]
    pub region: Option<Arc<Region>>,
    pub vertical: WritingMode,
    /// `true` when `line` is a line index, `false` when it is a percentage.
    pub snap_to_lines: bool,
    /// Line position; `None` means `auto`.
    pub line: Option<f64>,
    pub line_align: LineAlign,
    /// Text position percentage; `None` means `auto`.
    pub position: Option<f64>,
    pub position_align: PositionAlign,
    /// Box size as a percentage.
    pub size: f64,
    pub align: CueAlign,
    /// Presentational hints from SSA/ASS styles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation: Option<Presentation>,
}

fn serialize_region_id<S: Serializer>(
    region: &Option<Arc<Region>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match region {
        Some(region) => serializer.serialize_some(&region.id),
        None => serializer.serialize_none(),
    }
}

impl Cue {
    /// Create a cue with default settings.
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            start_time,
            end_time,
            text: text.into(),
            region: None,
            vertical: WritingMode::Horizontal,
            snap_to_lines: true,
            line: None,
            line_align: LineAlign::Start,
            position: None,
            position_align: PositionAlign::Auto,
            size: 100.0,
            align: CueAlign::Center,
            presentation: None,
        }
    }

    /// Whether the cue is showing at `time` (inclusive on both ends).
    pub fn is_active_at(&self, time: f64) -> bool {
        self.start_time <= time && time <= self.end_time
    }

    /// Whether the cue references exactly this region instance.
    pub fn is_in_region(&self, region: &Arc<Region>) -> bool {
        self.region
            .as_ref()
            .is_some_and(|own| Arc::ptr_eq(own, region))
    }

    /// Whether the cue is laid out inside its region rather than on its own.
    pub fn renders_in_region(&self) -> bool {
        self.region.is_some()
            && self.size == 100.0
            && self.vertical.is_horizontal()
            && self.line.is_none()
    }
}

/// Aggregate output of one parse run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedCaptions {
    pub metadata: HeaderMetadata,
    pub regions: Vec<Arc<Region>>,
    pub cues: Vec<Cue>,
    /// `None` when error collection was not requested.
    pub errors: Option<Vec<ParseError>>,
}

impl ParsedCaptions {
    /// Look up a region by id.
    pub fn region(&self, id: &str) -> Option<&Arc<Region>> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Cues active at `time`, in source order.
    pub fn cues_at(&self, time: f64) -> impl Iterator<Item = &Cue> {
        self.cues.iter().filter(move |c| c.is_active_at(time))
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
