//! Cue and region settings grammar.
//!
//! Each token has the shape `name:value` or `name=value`; tokens without a
//! separator are ignored. Unknown names and malformed values produce one
//! diagnostic per token and never abort the block.

use std::sync::Arc;

use crate::captions::error::{ParseError, SettingScope};
use crate::captions::types::{
    CueAlign, Cue, LineAlign, PositionAlign, Region, RegionScroll, WritingMode,
};
use crate::captions::units::{
    parse_coords, parse_count, parse_float, parse_percentage, split_setting,
};

use super::context::ParseContext;

/// Apply cue settings tokens to `cue`.
///
/// `regions` are the regions committed so far; `region:` looks them up by id.
pub fn apply_cue_settings<'t>(
    cue: &mut Cue,
    tokens: impl IntoIterator<Item = &'t str>,
    regions: &[Arc<Region>],
    line: usize,
    ctx: &mut ParseContext<'_>,
) -> Result<(), ParseError> {
    for token in tokens {
        let Some((name, value)) = split_setting(token) else {
            continue;
        };

        let valid = match name {
            "region" => {
                if let Some(region) = regions.iter().find(|r| r.id == value) {
                    cue.region = Some(Arc::clone(region));
                }
                true
            }
            "vertical" => match WritingMode::from_keyword(value) {
                Some(mode) => {
                    cue.vertical = mode;
                    cue.region = None;
                    true
                }
                None => false,
            },
            "line" => apply_line(cue, value),
            "position" => apply_position(cue, value),
            "size" => match parse_percentage(value) {
                Some(size) => {
                    cue.size = size;
                    if size < 100.0 {
                        cue.region = None;
                    }
                    true
                }
                None => false,
            },
            "align" => match CueAlign::from_keyword(value) {
                Some(align) => {
                    cue.align = align;
                    true
                }
                None => false,
            },
            _ => {
                ctx.report(|| ParseError::unknown_setting(SettingScope::Cue, name, value, line))?;
                continue;
            }
        };

        if !valid {
            ctx.report(|| ParseError::bad_setting_value(SettingScope::Cue, name, value, line))?;
        }
    }
    Ok(())
}

/// `line:<number|percentage>[,<start|center|end>]`
fn apply_line(cue: &mut Cue, value: &str) -> bool {
    let (position, align) = split_alignment(value);
    let mut valid = true;

    if position.contains('%') {
        match parse_percentage(position) {
            Some(percent) => {
                cue.line = Some(percent);
                cue.snap_to_lines = false;
            }
            None => valid = false,
        }
    } else {
        match parse_float(position) {
            Some(number) => {
                cue.line = Some(number);
                cue.snap_to_lines = true;
            }
            None => valid = false,
        }
    }

    if let Some(align) = align {
        match LineAlign::from_keyword(align) {
            Some(align) => cue.line_align = align,
            None => valid = false,
        }
    }

    if cue.line.is_some() {
        cue.region = None;
    }
    valid
}

/// `position:<percentage>[,<line-left|center|line-right|auto>]`
fn apply_position(cue: &mut Cue, value: &str) -> bool {
    let (position, align) = split_alignment(value);
    let mut valid = true;

    match parse_percentage(position) {
        Some(percent) => cue.position = Some(percent),
        None => valid = false,
    }

    if let Some(align) = align {
        match PositionAlign::from_keyword(align) {
            Some(align) => cue.position_align = align,
            None => valid = false,
        }
    }
    valid
}

fn split_alignment(value: &str) -> (&str, Option<&str>) {
    match value.split_once(',') {
        Some((position, align)) => (position, Some(align)),
        None => (value, None),
    }
}

/// Apply region settings tokens to `region`.
pub fn apply_region_settings<'t>(
    region: &mut Region,
    tokens: impl IntoIterator<Item = &'t str>,
    line: usize,
    ctx: &mut ParseContext<'_>,
) -> Result<(), ParseError> {
    for token in tokens {
        let Some((name, value)) = split_setting(token) else {
            continue;
        };

        let valid = match name {
            "id" => {
                region.id = value.to_string();
                true
            }
            "width" => parse_percentage(value)
                .map(|width| region.width = width)
                .is_some(),
            "lines" => parse_count(value)
                .map(|lines| region.lines = lines)
                .is_some(),
            "regionanchor" => parse_coords(value)
                .map(|(x, y)| {
                    region.region_anchor_x = x;
                    region.region_anchor_y = y;
                })
                .is_some(),
            "viewportanchor" => parse_coords(value)
                .map(|(x, y)| {
                    region.viewport_anchor_x = x;
                    region.viewport_anchor_y = y;
                })
                .is_some(),
            "scroll" => {
                if value == "up" {
                    region.scroll = RegionScroll::Up;
                    true
                } else {
                    false
                }
            }
            _ => {
                ctx.report(|| {
                    ParseError::unknown_setting(SettingScope::Region, name, value, line)
                })?;
                continue;
            }
        };

        if !valid {
            ctx.report(|| ParseError::bad_setting_value(SettingScope::Region, name, value, line))?;
        }
    }
    Ok(())
}
