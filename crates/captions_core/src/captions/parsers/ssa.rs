//! SSA/ASS section parser.
//!
//! # Format Overview
//!
//! ```text
//! [Script Info]
//! Title: Example
//!
//! [V4+ Styles]
//! Format: Name, Fontname, Fontsize, PrimaryColour, Alignment, MarginL
//! Style: Default,Arial,20,&H00FFFFFF,2,10
//!
//! [Events]
//! Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
//! Dialogue: 0,0:00:01.00,0:00:04.00,Default,Bob,0,0,0,,{\b1}Hello,\Nworld!
//! ```
//!
//! Styles become presentational hints on each cue; `Alignment` maps onto
//! the cue's `line`/`line_align`/`align` settings. `[V4+ Styles]` uses
//! numpad alignment codes, older `[V4 Styles]` the legacy 1-11 codes.

use std::collections::HashMap;

use tracing::debug;

use crate::captions::error::ParseError;
use crate::captions::timing::parse_ssa_timestamp;
use crate::captions::types::{
    Cue, CueAlign, HeaderMetadata, LineAlign, ParsedCaptions, Presentation,
};

use super::context::ParseContext;
use super::vtt::append_text;
use super::CaptionsParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Info,
    Styles,
    Events,
    /// Sections we do not interpret (`[Fonts]`, `[Graphics]`, ...).
    Other,
}

/// Where a style places its cues.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    line: f64,
    line_align: LineAlign,
    align: CueAlign,
}

impl Placement {
    /// Legacy SSA codes: 1-3 bottom, 5-7 top, 9-11 middle.
    fn from_legacy(code: u32) -> Option<Self> {
        let vertical = match code {
            1..=3 => 2,
            5..=7 => 0,
            9..=11 => 1,
            _ => return None,
        };
        Some(Self::from_grid(vertical, (code - 1) % 4))
    }

    /// ASS numpad codes: 1-3 bottom, 4-6 middle, 7-9 top.
    fn from_numpad(code: u32) -> Option<Self> {
        let vertical = match code {
            1..=3 => 2,
            4..=6 => 1,
            7..=9 => 0,
            _ => return None,
        };
        Some(Self::from_grid(vertical, (code - 1) % 3))
    }

    /// `vertical`: 0 top, 1 middle, 2 bottom. `horizontal`: 0 left, 1 center, 2 right.
    fn from_grid(vertical: u32, horizontal: u32) -> Self {
        let (line, line_align) = match vertical {
            0 => (0.0, LineAlign::Start),
            1 => (50.0, LineAlign::Center),
            _ => (100.0, LineAlign::End),
        };
        let align = match horizontal {
            0 => CueAlign::Start,
            1 => CueAlign::Center,
            _ => CueAlign::End,
        };
        Self {
            line,
            line_align,
            align,
        }
    }

    fn apply(&self, cue: &mut Cue) {
        cue.line = Some(self.line);
        cue.snap_to_lines = false;
        cue.line_align = self.line_align;
        cue.align = self.align;
    }
}

#[derive(Debug, Clone, Default)]
struct Style {
    presentation: Presentation,
    placement: Option<Placement>,
}

/// RGBA color from an SSA/ASS color value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// SSA alpha: 0 is opaque, 255 transparent.
    pub a: u8,
}

impl SsaColor {
    /// Parse `&HAABBGGRR`, `&HBBGGRR` or a decimal BGR value.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let raw = match value.strip_prefix("&H").or_else(|| value.strip_prefix("&h")) {
            Some(hex) => u32::from_str_radix(hex.trim_end_matches('&'), 16).ok()?,
            None => value.parse::<i64>().ok().map(|v| v as u32)?,
        };
        Some(Self {
            r: (raw & 0xFF) as u8,
            g: ((raw >> 8) & 0xFF) as u8,
            b: ((raw >> 16) & 0xFF) as u8,
            a: ((raw >> 24) & 0xFF) as u8,
        })
    }

    /// CSS-like `rgba(r, g, b, alpha)` with alpha in `0..=1`.
    pub fn to_rgba(&self) -> String {
        let alpha = f64::from(255 - self.a) / 255.0;
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, trim_number(alpha))
    }
}

fn trim_number(value: f64) -> String {
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// SSA/ASS parser.
#[derive(Debug)]
pub struct SsaParser {
    section: Section,
    numpad_alignment: bool,
    /// Lowercased field names of the current section's `Format:` line.
    format: Option<Vec<String>>,
    styles: HashMap<String, Style>,
    metadata: HeaderMetadata,
    cues: Vec<Cue>,
    cue: Option<Cue>,
}

impl Default for SsaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SsaParser {
    pub fn new() -> Self {
        Self {
            section: Section::None,
            numpad_alignment: true,
            format: None,
            styles: HashMap::new(),
            metadata: HeaderMetadata::new(),
            cues: Vec::new(),
            cue: None,
        }
    }

    /// Switch section on a `[...]` header line.
    fn enter_section(&mut self, line: &str, ctx: &mut ParseContext<'_>) -> bool {
        let Some(name) = line
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        else {
            return false;
        };
        self.commit_cue(ctx);

        let lower = name.trim().to_lowercase();
        self.format = None;
        self.section = if lower.ends_with("styles") {
            self.numpad_alignment = lower.contains('+');
            Section::Styles
        } else if lower.ends_with("events") {
            Section::Events
        } else if lower == "script info" {
            Section::Info
        } else {
            Section::Other
        };
        debug!(section = name, "Entered section");
        true
    }

    fn commit_cue(&mut self, ctx: &mut ParseContext<'_>) {
        if let Some(cue) = self.cue.take() {
            debug!(start = cue.start_time, end = cue.end_time, "Dialogue committed");
            ctx.emit_cue(&cue);
            self.cues.push(cue);
        }
    }

    fn parse_info_line(&mut self, line: &str) {
        if line.starts_with(';') || line.starts_with('!') {
            return;
        }
        if let Some((key, value)) = line.split_once(':') {
            self.metadata.insert(key.trim(), value.trim());
        }
    }

    fn parse_style(
        &mut self,
        body: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        let Some(format) = self.format.as_ref() else {
            return ctx.report(|| ParseError::missing_format("Style", line_number));
        };

        let values: Vec<&str> = body.split(',').map(str::trim).collect();
        let field = |name: &str| {
            format
                .iter()
                .position(|f| f == name)
                .and_then(|i| values.get(i).copied())
                .filter(|v| !v.is_empty())
        };

        let Some(name) = field("name") else {
            return Ok(());
        };
        let name = name.trim_start_matches('*').to_string();

        let mut presentation = Presentation::new();
        if let Some(font) = field("fontname") {
            presentation.insert("font-family", font);
        }
        if let Some(size) = field("fontsize") {
            presentation.insert("font-size", format!("{}px", size));
        }
        for (key, target) in [
            ("primarycolour", "color"),
            ("secondarycolour", "secondary-color"),
            ("outlinecolour", "outline-color"),
            ("tertiarycolour", "outline-color"),
            ("backcolour", "background-color"),
        ] {
            if let Some(color) = field(key).and_then(SsaColor::parse) {
                presentation.insert(target, color.to_rgba());
            }
        }
        if field("bold").is_some_and(is_enabled) {
            presentation.insert("font-weight", "bold");
        }
        if field("italic").is_some_and(is_enabled) {
            presentation.insert("font-style", "italic");
        }
        let decorations: Vec<&str> = [("underline", "underline"), ("strikeout", "line-through")]
            .into_iter()
            .filter(|(key, _)| field(key).is_some_and(is_enabled))
            .map(|(_, value)| value)
            .collect();
        if !decorations.is_empty() {
            presentation.insert("text-decoration", decorations.join(" "));
        }
        if let Some(spacing) = field("spacing").filter(|v| !is_zero(v)) {
            presentation.insert("letter-spacing", format!("{}px", spacing));
        }
        let scale_x = field("scalex").unwrap_or("100");
        let scale_y = field("scaley").unwrap_or("100");
        let angle = field("angle").unwrap_or("0");
        if scale_x != "100" || scale_y != "100" || !is_zero(angle) {
            presentation.insert(
                "transform",
                format!(
                    "scale({}, {}) rotate(-{}deg)",
                    percent_to_ratio(scale_x),
                    percent_to_ratio(scale_y),
                    angle
                ),
            );
        }
        if let Some(outline) = field("outline") {
            presentation.insert("outline-width", format!("{}px", outline));
        }
        if let Some(shadow) = field("shadow") {
            presentation.insert("shadow-width", format!("{}px", shadow));
        }
        insert_margins(&mut presentation, &field);

        let placement = field("alignment")
            .and_then(|v| v.parse::<u32>().ok())
            .and_then(|code| {
                if self.numpad_alignment {
                    Placement::from_numpad(code)
                } else {
                    Placement::from_legacy(code)
                }
            });

        debug!(style = %name, "Style parsed");
        self.styles.insert(
            name,
            Style {
                presentation,
                placement,
            },
        );
        Ok(())
    }

    fn parse_dialogue(
        &mut self,
        body: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        let Some(format) = self.format.as_ref() else {
            return ctx.report(|| ParseError::missing_format("Dialogue", line_number));
        };

        let values: Vec<&str> = body.splitn(format.len().max(1), ',').collect();
        let field = |name: &str| {
            format
                .iter()
                .position(|f| f == name)
                .and_then(|i| values.get(i).copied())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let start_text = field("start").unwrap_or("");
        let end_text = field("end").unwrap_or("");
        let start = parse_ssa_timestamp(start_text);
        let end = parse_ssa_timestamp(end_text);
        if start.is_none() {
            ctx.report(|| ParseError::bad_start_time(start_text, line_number))?;
        }
        if end.is_none() {
            ctx.report(|| ParseError::bad_end_time(end_text, line_number))?;
        }
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(());
        };
        if end <= start {
            return ctx.report(|| ParseError::bad_time_range(start_text, end_text, line_number));
        }

        // Commas inside the text field are normalized to `, `
        let raw_text = values
            .get(format.len().saturating_sub(1))
            .map(|rest| rest.split(',').map(str::trim).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        let mut text = convert_text(&raw_text);
        if let Some(name) = field("name") {
            text = format!("<v {}>{}", name, text);
        }

        let mut cue = Cue::new(start, end, text);
        let style = field("style").and_then(|name| self.styles.get(name.trim_start_matches('*')));
        let mut presentation = style.map(|s| s.presentation.clone()).unwrap_or_default();
        if let Some(placement) = style.and_then(|s| s.placement) {
            placement.apply(&mut cue);
        }
        let mut overrides = Presentation::new();
        insert_margins(&mut overrides, &|name: &str| field(name).filter(|v| !is_zero(v)));
        presentation.merge(&overrides);
        if !presentation.is_empty() {
            cue.presentation = Some(presentation);
        }

        self.cue = Some(cue);
        Ok(())
    }

    fn parse_line(
        &mut self,
        line: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        match self.section {
            Section::None | Section::Other => {
                self.enter_section(line, ctx);
            }
            Section::Info => {
                if line.trim().is_empty() {
                    self.section = Section::None;
                } else if !self.enter_section(line, ctx) {
                    self.parse_info_line(line);
                }
            }
            Section::Styles => {
                if line.trim().is_empty() {
                    self.section = Section::None;
                } else if let Some(body) = strip_field(line, "Format") {
                    self.format = Some(parse_format(body));
                } else if let Some(body) = strip_field(line, "Style") {
                    self.parse_style(body, line_number, ctx)?;
                } else {
                    self.enter_section(line, ctx);
                }
            }
            Section::Events => {
                if line.trim().is_empty() {
                    self.commit_cue(ctx);
                } else if let Some(body) = strip_field(line, "Dialogue") {
                    self.commit_cue(ctx);
                    self.parse_dialogue(body, line_number, ctx)?;
                } else if strip_field(line, "Comment").is_some() {
                    self.commit_cue(ctx);
                } else if !self.enter_section(line, ctx) {
                    if let Some(cue) = self.cue.as_mut() {
                        append_text(cue, &convert_text(line.trim()));
                    } else if let Some(body) = strip_field(line, "Format") {
                        self.format = Some(parse_format(body));
                    }
                }
            }
        }
        Ok(())
    }
}

impl CaptionsParser for SsaParser {
    fn parse(
        &mut self,
        line: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        let line = if line_number == 1 {
            line.trim_start_matches('\u{feff}')
        } else {
            line
        };
        self.parse_line(line, line_number, ctx)
    }

    fn finish(&mut self, cancelled: bool) -> ParsedCaptions {
        if cancelled {
            debug!(cues = self.cues.len(), "Parse cancelled");
        }
        self.cue = None;
        ParsedCaptions {
            metadata: std::mem::take(&mut self.metadata),
            regions: Vec::new(),
            cues: std::mem::take(&mut self.cues),
            errors: None,
        }
    }
}

/// `Name: body` -> `body`, case-insensitive on the name.
fn strip_field<'l>(line: &'l str, name: &str) -> Option<&'l str> {
    let (key, body) = line.split_once(':')?;
    key.trim().eq_ignore_ascii_case(name).then_some(body)
}

fn parse_format(body: &str) -> Vec<String> {
    body.split(',').map(|f| f.trim().to_lowercase()).collect()
}

/// Strip `{...}` override blocks and convert `\N`, `\n`, `\h`.
fn convert_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let block: String = chars.clone().take_while(|&c| c != '}').collect();
                let closed = chars.clone().nth(block.chars().count()) == Some('}');
                if closed && !block.is_empty() {
                    for _ in 0..=block.chars().count() {
                        chars.next();
                    }
                } else {
                    out.push(c);
                }
            }
            '\\' => match chars.peek() {
                Some('N') | Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('h') => {
                    chars.next();
                    out.push('\u{a0}');
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }
    out
}

fn insert_margins<'v>(presentation: &mut Presentation, field: &dyn Fn(&str) -> Option<&'v str>) {
    for (key, target) in [
        ("marginl", "margin-left"),
        ("marginr", "margin-right"),
        ("marginv", "margin-vertical"),
    ] {
        if let Some(value) = field(key) {
            presentation.insert(target, format!("{}px", value));
        }
    }
}

fn is_enabled(value: &str) -> bool {
    value == "-1" || value == "1"
}

fn is_zero(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(|v| v == 0.0)
}

fn percent_to_ratio(value: &str) -> String {
    value
        .parse::<f64>()
        .map(|v| trim_number(v / 100.0))
        .unwrap_or_else(|_| "1".to_string())
}
