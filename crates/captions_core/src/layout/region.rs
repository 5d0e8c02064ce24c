//! Region placement.

use crate::captions::Region;

use super::collision::avoid_box_collisions_with_step;
use super::geometry::{Axis, LayoutBox};

/// Axis order tried when a region collides.
pub const REGION_AXES: [Axis; 4] = [Axis::NegY, Axis::PosY, Axis::NegX, Axis::PosX];

/// Rendered measurements of the cues showing in a region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionMetrics {
    /// Heights of the region's active cues, oldest first.
    pub cue_heights: Vec<f64>,
    pub line_height: f64,
    /// Combined top and bottom padding of one cue.
    pub padding_y: f64,
    /// Top margin of one cue.
    pub margin_top: f64,
}

/// Height a region needs to show its newest cues within its line budget.
///
/// Cues are walked newest first. A cue that does not fit the remaining
/// lines contributes a partial block of the lines left.
pub fn region_height(region: &Region, metrics: &RegionMetrics) -> f64 {
    let budget = i64::from(region.lines);
    let mut height = 0.0;
    let mut active_lines: i64 = 0;

    for &cue_height in metrics.cue_heights.iter().rev() {
        let new_lines = if metrics.line_height > 0.0 {
            ((cue_height - metrics.padding_y) / metrics.line_height).round() as i64
        } else {
            0
        };
        let remaining = budget - active_lines;

        if new_lines <= remaining {
            height += cue_height + metrics.margin_top;
        } else if remaining > 0 {
            height += metrics.padding_y / 2.0
                + metrics.margin_top
                + 1.0
                + metrics.line_height * remaining as f64;
        }

        active_lines += new_lines;
        if active_lines > budget {
            break;
        }
    }

    height
}

/// The region's natural box: `width%` of the container wide, placed so the
/// region anchor lands on the viewport anchor.
pub fn region_box(container: &LayoutBox, region: &Region, height: f64) -> LayoutBox {
    let width = container.width * region.width / 100.0;
    let anchor_x = container.left + container.width * region.viewport_anchor_x / 100.0;
    let anchor_y = container.top + container.height * region.viewport_anchor_y / 100.0;
    LayoutBox::new(
        anchor_x - width * region.region_anchor_x / 100.0,
        anchor_y - height * region.region_anchor_y / 100.0,
        width,
        height,
    )
}

/// Clear a region's box of `placed`.
pub fn position_region(
    container: &LayoutBox,
    start: LayoutBox,
    placed: &[LayoutBox],
    step: f64,
) -> LayoutBox {
    avoid_box_collisions_with_step(container, start, placed, &REGION_AXES, step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::collision::DEFAULT_COLLISION_STEP;

    fn metrics(heights: &[f64]) -> RegionMetrics {
        RegionMetrics {
            cue_heights: heights.to_vec(),
            line_height: 20.0,
            padding_y: 4.0,
            margin_top: 2.0,
        }
    }

    #[test]
    fn all_cues_fit() {
        let region = Region {
            lines: 3,
            ..Default::default()
        };
        // one line and two lines
        let height = region_height(&region, &metrics(&[24.0, 44.0]));
        assert_eq!(height, 24.0 + 2.0 + 44.0 + 2.0);
    }

    #[test]
    fn oldest_cue_is_cut_to_remaining_lines() {
        let region = Region {
            lines: 3,
            ..Default::default()
        };
        // newest takes two lines, the older two-line cue only gets one
        let height = region_height(&region, &metrics(&[44.0, 44.0]));
        assert_eq!(height, (44.0 + 2.0) + (2.0 + 2.0 + 1.0 + 20.0));
    }

    #[test]
    fn zero_line_height_counts_no_lines() {
        let region = Region::default();
        let mut m = metrics(&[10.0, 10.0]);
        m.line_height = 0.0;
        assert_eq!(region_height(&region, &m), 24.0);
    }

    #[test]
    fn default_region_anchors_bottom_left() {
        let container = LayoutBox::new(0.0, 0.0, 640.0, 360.0);
        let rect = region_box(&container, &Region::default(), 60.0);
        assert_eq!(rect, LayoutBox::new(0.0, 300.0, 640.0, 60.0));
    }

    #[test]
    fn centered_anchor() {
        let container = LayoutBox::new(0.0, 0.0, 600.0, 400.0);
        let region = Region {
            width: 50.0,
            region_anchor_x: 50.0,
            region_anchor_y: 50.0,
            viewport_anchor_x: 50.0,
            viewport_anchor_y: 50.0,
            ..Default::default()
        };
        let rect = region_box(&container, &region, 100.0);
        assert_eq!(rect, LayoutBox::new(150.0, 150.0, 300.0, 100.0));
    }

    #[test]
    fn overlapping_region_moves_up() {
        let container = LayoutBox::new(0.0, 0.0, 640.0, 360.0);
        let start = region_box(&container, &Region::default(), 60.0);
        let other = LayoutBox::new(0.0, 320.0, 640.0, 40.0);
        let rect = position_region(&container, start, &[other], DEFAULT_COLLISION_STEP);
        assert!(rect.is_within(&container));
        assert!(rect.bottom < other.top);
    }
}
