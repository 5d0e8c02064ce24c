//! Standalone cue placement.
//!
//! A cue's display box is derived from its size, position and alignment
//! settings, then moved to its line and pushed clear of other boxes.

use serde::{Deserialize, Serialize};

use crate::captions::{Cue, CueAlign, LineAlign, PositionAlign, WritingMode};

use super::collision::avoid_box_collisions_with_step;
use super::geometry::{Axis, LayoutBox};

/// Base direction of caption text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ltr" => Some(Self::Ltr),
            "rtl" => Some(Self::Rtl),
            _ => None,
        }
    }
}

/// Line number the cue is placed at; `auto` resolves to the last line.
pub fn computed_line(cue: &Cue) -> f64 {
    match cue.line {
        Some(line) => line,
        None if cue.snap_to_lines => -1.0,
        None => 100.0,
    }
}

/// Text position percentage, derived from `align` when `auto`.
pub fn computed_position(cue: &Cue) -> f64 {
    if let Some(position) = cue.position {
        return position;
    }
    match cue.align {
        CueAlign::Start | CueAlign::Left => 0.0,
        CueAlign::End | CueAlign::Right => 100.0,
        CueAlign::Center => 50.0,
    }
}

/// Position alignment, derived from `align` and text direction when `auto`.
///
/// Never returns [`PositionAlign::Auto`].
pub fn computed_position_align(cue: &Cue, direction: TextDirection) -> PositionAlign {
    if cue.position_align != PositionAlign::Auto {
        return cue.position_align;
    }
    match (cue.align, direction) {
        (CueAlign::Start, TextDirection::Ltr) | (CueAlign::End, TextDirection::Rtl) => {
            PositionAlign::LineLeft
        }
        (CueAlign::Start, TextDirection::Rtl) | (CueAlign::End, TextDirection::Ltr) => {
            PositionAlign::LineRight
        }
        (CueAlign::Center, _) => PositionAlign::Center,
        (CueAlign::Left, _) => PositionAlign::LineLeft,
        (CueAlign::Right, _) => PositionAlign::LineRight,
    }
}

/// Box size percentage after clamping to the room left by the position.
pub fn computed_size(cue: &Cue, direction: TextDirection) -> f64 {
    let position = computed_position(cue);
    let max_size = match computed_position_align(cue, direction) {
        PositionAlign::LineLeft => 100.0 - position,
        PositionAlign::Center if position <= 50.0 => position * 2.0,
        PositionAlign::Center => (100.0 - position) * 2.0,
        _ => position,
    };
    cue.size.min(max_size)
}

/// Starting display box for a cue.
///
/// `content_extent` is the measured height of a horizontal cue (width of a
/// vertical one). Horizontal and `lr` cues start at the top/left edge,
/// `rl` cues at the right edge.
pub fn cue_display_box(
    container: &LayoutBox,
    cue: &Cue,
    direction: TextDirection,
    content_extent: f64,
) -> LayoutBox {
    let size = computed_size(cue, direction);
    let position = computed_position(cue);
    let offset = match computed_position_align(cue, direction) {
        PositionAlign::Center => position - size / 2.0,
        PositionAlign::LineRight => position - size,
        _ => position,
    };

    match cue.vertical {
        WritingMode::Horizontal => LayoutBox::new(
            container.left + container.width * offset / 100.0,
            container.top,
            container.width * size / 100.0,
            content_extent,
        ),
        WritingMode::Lr => LayoutBox::new(
            container.left,
            container.top + container.height * offset / 100.0,
            content_extent,
            container.height * size / 100.0,
        ),
        WritingMode::Rl => LayoutBox::new(
            container.right - content_extent,
            container.top + container.height * offset / 100.0,
            content_extent,
            container.height * size / 100.0,
        ),
    }
}

/// Move a cue's display box to its line and clear it of `placed`.
///
/// `line_height` is one rendered text line; it is the snapping unit for
/// line-indexed cues.
pub fn position_cue(
    container: &LayoutBox,
    cue: &Cue,
    display: LayoutBox,
    line_height: f64,
    placed: &[LayoutBox],
    step: f64,
) -> LayoutBox {
    let line = computed_line(cue);
    let horizontal = cue.vertical.is_horizontal();

    let (start, axes) = if cue.snap_to_lines {
        snap_to_line(container, cue.vertical, display, line, line_height)
    } else {
        let extent = if horizontal {
            container.height
        } else {
            container.width
        };
        let own = if horizontal {
            display.height
        } else {
            display.width
        };
        let shift = match cue.line_align {
            LineAlign::Start => 0.0,
            LineAlign::Center => own / 2.0,
            LineAlign::End => own,
        };
        let leading = extent * line / 100.0 - shift;

        if horizontal {
            (
                display.at(display.left, container.top + leading),
                vec![Axis::NegY, Axis::PosY, Axis::NegX, Axis::PosX],
            )
        } else {
            (
                display.at(container.left + leading, display.top),
                vec![Axis::NegX, Axis::PosX, Axis::NegY, Axis::PosY],
            )
        }
    };

    avoid_box_collisions_with_step(container, start, placed, &axes, step)
}

fn snap_to_line(
    container: &LayoutBox,
    mode: WritingMode,
    display: LayoutBox,
    line: f64,
    line_height: f64,
) -> (LayoutBox, Vec<Axis>) {
    let (mut axes, extent) = match mode {
        WritingMode::Horizontal => (vec![Axis::PosY, Axis::NegY], container.height),
        WritingMode::Lr => (vec![Axis::PosX, Axis::NegX], container.width),
        WritingMode::Rl => (vec![Axis::NegX, Axis::PosX], container.width),
    };
    let initial_axis = axes[0];

    let mut position = line_height * line.round();
    let max_position = extent + line_height;
    if line_height > 0.0 && position.abs() > max_position {
        position = position.signum() * (max_position / line_height).ceil() * line_height;
    }

    if line < 0.0 {
        position += extent;
        axes.reverse();
    }

    (display.moved(initial_axis, position), axes)
}
