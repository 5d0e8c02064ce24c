//! Block-structured caption parser (WebVTT and SubRip dialects).
//!
//! # Format Overview
//!
//! ```text
//! WEBVTT
//! Kind: captions
//!
//! REGION
//! id:fred width:40%
//!
//! NOTE anything until the next blank line
//!
//! intro
//! 00:00:01.000 --> 00:00:04.000 region:fred align:start
//! Hello, world!
//! ```
//!
//! Blocks are separated by blank lines. A cue's identifier is whatever line
//! preceded its timing line. SubRip shares the cue block handling but has no
//! header, regions, notes or settings (see `srt.rs`).

use std::sync::Arc;

use tracing::debug;

use crate::captions::error::ParseError;
use crate::captions::timing::{parse_srt_timestamp, parse_vtt_timestamp};
use crate::captions::types::{Cue, HeaderMetadata, ParsedCaptions, Region};
use crate::captions::units::{is_settings_line, split_setting};

use super::context::ParseContext;
use super::settings::{apply_cue_settings, apply_region_settings};
use super::CaptionsParser;

/// Per-format hooks of the block parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    WebVtt,
    SubRip,
}

impl Dialect {
    /// Required first-line token, if any.
    pub fn signature(&self) -> Option<&'static str> {
        match self {
            Dialect::WebVtt => Some("WEBVTT"),
            Dialect::SubRip => None,
        }
    }

    /// Whether timing lines and cue blocks carry settings.
    pub fn has_settings(&self) -> bool {
        matches!(self, Dialect::WebVtt)
    }

    pub fn parse_timestamp(&self, text: &str) -> Option<f64> {
        match self {
            Dialect::WebVtt => parse_vtt_timestamp(text),
            Dialect::SubRip => parse_srt_timestamp(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Block {
    None,
    Header,
    Cue,
    Region,
    Note,
}

/// Line-at-a-time block parser.
#[derive(Debug)]
pub struct TextParser {
    pub(super) dialect: Dialect,
    pub(super) block: Block,
    pub(super) metadata: HeaderMetadata,
    pub(super) regions: Vec<Arc<Region>>,
    pub(super) cues: Vec<Cue>,
    pub(super) cue: Option<Cue>,
    pub(super) region: Option<Region>,
    pub(super) prev_line: String,
}

impl TextParser {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            block: Block::None,
            metadata: HeaderMetadata::new(),
            regions: Vec::new(),
            cues: Vec::new(),
            cue: None,
            region: None,
            prev_line: String::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn parse_webvtt_line(
        &mut self,
        line: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        if line.is_empty() {
            if self.cue.is_some() || self.region.is_some() {
                self.commit_open(ctx);
            } else if self.block == Block::Header {
                self.parse_header(line, line_number, ctx)?;
                debug!(entries = self.metadata.len(), "Header parsed");
                ctx.emit_metadata(&self.metadata);
            }
            self.block = Block::None;
            return Ok(());
        }

        match self.block {
            Block::Header => self.parse_header(line, line_number, ctx)?,
            Block::Cue => {
                if let Some(cue) = self.cue.as_mut() {
                    if cue.text.is_empty() && is_settings_line(line) {
                        apply_cue_settings(
                            cue,
                            line.split_whitespace(),
                            &self.regions,
                            line_number,
                            ctx,
                        )?;
                    } else {
                        append_text(cue, line);
                    }
                }
            }
            Block::Region => {
                if let Some(region) = self.region.as_mut() {
                    apply_region_settings(region, line.split_whitespace(), line_number, ctx)?;
                }
            }
            Block::Note => {}
            Block::None => {
                if line.starts_with("NOTE") {
                    self.block = Block::Note;
                } else if let Some(rest) = line.strip_prefix("REGION") {
                    let mut region = Region::default();
                    let rest = rest.strip_prefix(':').unwrap_or(rest);
                    if rest.starts_with(char::is_whitespace) {
                        apply_region_settings(
                            &mut region,
                            rest.split_whitespace(),
                            line_number,
                            ctx,
                        )?;
                    }
                    self.region = Some(region);
                    self.block = Block::Region;
                } else if line.contains("-->") {
                    self.parse_timing(line, line_number, ctx)?;
                } else if line_number == 1 {
                    self.parse_header(line, line_number, ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Signature check on line 1, `key:value` metadata afterwards.
    fn parse_header(
        &mut self,
        line: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        let Some(signature) = self.dialect.signature() else {
            return Ok(());
        };

        if line_number == 1 {
            if line.starts_with(signature) {
                self.block = Block::Header;
            } else {
                ctx.report(|| ParseError::bad_signature(signature, line_number))?;
            }
        } else if let Some((key, value)) = split_setting(line) {
            self.metadata.insert(key.trim(), value.trim());
        }
        Ok(())
    }

    /// Parse a `start --> end [settings...]` line and open a cue.
    ///
    /// The cue block is entered even when the timing is invalid so the rest
    /// of the block is skipped.
    pub(super) fn parse_timing(
        &mut self,
        line: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        self.block = Block::Cue;

        let (start_text, trailing) = split_timing_line(line);
        let mut tokens = trailing.split_whitespace();
        let end_text = tokens.next().unwrap_or("");

        let start = self.dialect.parse_timestamp(start_text);
        let end = self.dialect.parse_timestamp(end_text);

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
            ctx.report(|| ParseError::bad_time_range(start_text, end_text, line_number))?;
            return Ok(());
        }

        let mut cue = Cue::new(start, end, "");
        cue.id = self.prev_line.clone();
        if self.dialect.has_settings() {
            apply_cue_settings(&mut cue, tokens, &self.regions, line_number, ctx)?;
        } else {
            // SubRip keeps leftovers such as `X1:` coordinates as text
            cue.text = tokens.collect::<Vec<_>>().join(" ");
        }
        self.cue = Some(cue);
        Ok(())
    }

    /// Commit the open cue, or else the open region.
    pub(super) fn commit_open(&mut self, ctx: &mut ParseContext<'_>) {
        if let Some(cue) = self.cue.take() {
            debug!(id = %cue.id, start = cue.start_time, end = cue.end_time, "Cue committed");
            ctx.emit_cue(&cue);
            self.cues.push(cue);
        } else if let Some(region) = self.region.take() {
            debug!(id = %region.id, "Region committed");
            ctx.emit_region(&region);
            let region = Arc::new(region);
            match self.regions.iter().position(|r| r.id == region.id) {
                Some(index) => self.regions[index] = region,
                None => self.regions.push(region),
            }
        }
    }
}

impl CaptionsParser for TextParser {
    fn init(&mut self, ctx: &ParseContext<'_>) {
        if ctx.is_strict() && self.dialect.signature().is_some() {
            self.block = Block::Header;
        }
    }

    fn parse(
        &mut self,
        line: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        let result = match self.dialect {
            Dialect::WebVtt => self.parse_webvtt_line(line, line_number, ctx),
            Dialect::SubRip => self.parse_subrip_line(line, line_number, ctx),
        };
        self.prev_line.clear();
        self.prev_line.push_str(line);
        result
    }

    fn finish(&mut self, cancelled: bool) -> ParsedCaptions {
        if cancelled {
            debug!(cues = self.cues.len(), "Parse cancelled");
        }
        self.cue = None;
        self.region = None;
        ParsedCaptions {
            metadata: std::mem::take(&mut self.metadata),
            regions: std::mem::take(&mut self.regions),
            cues: std::mem::take(&mut self.cues),
            errors: None,
        }
    }
}

pub(super) fn append_text(cue: &mut Cue, line: &str) {
    if !cue.text.is_empty() {
        cue.text.push('\n');
    }
    cue.text.push_str(line);
}

/// Split a timing line at the first `-->` followed by whitespace.
///
/// Without such a separator the whole line is the start text.
fn split_timing_line(line: &str) -> (&str, &str) {
    let mut from = 0;
    while let Some(offset) = line[from..].find("-->") {
        let at = from + offset;
        let after = &line[at + 3..];
        if after.starts_with(char::is_whitespace) {
            return (line[..at].trim_end(), after.trim_start());
        }
        from = at + 3;
    }
    (line, "")
}
