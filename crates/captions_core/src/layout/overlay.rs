//! One layout pass over the cues showing at a given time.
//!
//! Active cues are walked newest first. Each standalone cue, and each
//! region once, is positioned against the boxes placed before it. Starting
//! boxes are remembered between passes so a cue keeps its spot while it
//! stays on screen.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::captions::{Cue, Region};
use crate::config::LayoutSettings;

use super::collision::DEFAULT_COLLISION_STEP;
use super::cue::{computed_size, cue_display_box, position_cue, TextDirection};
use super::geometry::{LayoutBox, RelativeBox};
use super::region::{position_region, region_box, region_height, RegionMetrics};

/// Rendering measurements supplied by the caller.
pub trait LayoutMeasurer {
    /// Extent of a standalone cue's content across its lines (height for a
    /// horizontal cue, width for a vertical one), given `available` room
    /// along the text direction.
    fn cue_extent(&self, cue: &Cue, available: f64) -> f64;

    /// Height of one rendered line of `cue`.
    fn line_height(&self, cue: &Cue) -> f64;

    /// Measurements of the cues showing in `region`, oldest first.
    fn region_metrics(&self, region: &Region, cues: &[&Cue]) -> RegionMetrics;
}

/// What a placed box belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKey {
    /// Index into the cue slice given to [`OverlayLayout::layout`].
    Cue(usize),
    /// Region id.
    Region(String),
}

/// A positioned cue or region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub target: LayoutKey,
    pub rect: LayoutBox,
}

/// Layout state for one display surface.
#[derive(Debug, Clone)]
pub struct OverlayLayout {
    container: LayoutBox,
    direction: TextDirection,
    step: f64,
    starting_boxes: HashMap<LayoutKey, RelativeBox>,
}

impl OverlayLayout {
    pub fn new(container: LayoutBox) -> Self {
        Self {
            container,
            direction: TextDirection::default(),
            step: DEFAULT_COLLISION_STEP,
            starting_boxes: HashMap::new(),
        }
    }

    /// Create a layout using the configured step and text direction.
    pub fn with_settings(container: LayoutBox, settings: &LayoutSettings) -> Self {
        Self {
            direction: settings.direction,
            step: settings.collision_step,
            ..Self::new(container)
        }
    }

    pub fn container(&self) -> &LayoutBox {
        &self.container
    }

    /// Resize the surface. Remembered starting boxes keep their insets.
    pub fn set_container(&mut self, container: LayoutBox) {
        self.container = container;
    }

    pub fn direction(&self) -> TextDirection {
        self.direction
    }

    /// Change the text direction. Display boxes depend on it, so the
    /// remembered starting boxes are dropped.
    pub fn set_direction(&mut self, direction: TextDirection) {
        if self.direction != direction {
            self.direction = direction;
            self.reset();
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of remembered starting boxes.
    pub fn remembered(&self) -> usize {
        self.starting_boxes.len()
    }

    /// Forget all starting boxes.
    pub fn reset(&mut self) {
        self.starting_boxes.clear();
    }

    /// Position every cue active at `time`.
    ///
    /// Placements come out in placement order: newest cue first.
    pub fn layout(
        &mut self,
        time: f64,
        cues: &[Cue],
        measurer: &dyn LayoutMeasurer,
    ) -> Vec<Placement> {
        let mut active: Vec<usize> = (0..cues.len())
            .filter(|&i| cues[i].is_active_at(time))
            .collect();
        active.sort_by(|&a, &b| {
            cues[a]
                .start_time
                .total_cmp(&cues[b].start_time)
                .then(cues[a].end_time.total_cmp(&cues[b].end_time))
        });

        let mut placed: Vec<LayoutBox> = Vec::with_capacity(active.len());
        let mut placements = Vec::with_capacity(active.len());
        let mut seen_regions: HashSet<&str> = HashSet::new();

        for &index in active.iter().rev() {
            let cue = &cues[index];
            let region = cue.region.as_ref().filter(|_| cue.renders_in_region());

            let (target, rect) = match region {
                Some(region) => {
                    if !seen_regions.insert(region.id.as_str()) {
                        continue;
                    }
                    // Grouped by id: a redefined region leaves older cues
                    // holding the earlier definition.
                    let members: Vec<&Cue> = active
                        .iter()
                        .map(|&i| &cues[i])
                        .filter(|c| {
                            c.renders_in_region()
                                && c.region.as_ref().is_some_and(|r| r.id == region.id)
                        })
                        .collect();
                    let rect = self.place_region(region, &members, measurer, &placed);
                    (LayoutKey::Region(region.id.clone()), rect)
                }
                None => {
                    let rect = self.place_cue(index, cue, measurer, &placed);
                    (LayoutKey::Cue(index), rect)
                }
            };

            placed.push(rect);
            placements.push(Placement { target, rect });
        }

        debug!(time, active = active.len(), placed = placements.len(), "Layout pass");
        placements
    }

    fn place_cue(
        &mut self,
        index: usize,
        cue: &Cue,
        measurer: &dyn LayoutMeasurer,
        placed: &[LayoutBox],
    ) -> LayoutBox {
        let container = self.container;
        let direction = self.direction;

        let start = *self
            .starting_boxes
            .entry(LayoutKey::Cue(index))
            .or_insert_with(|| {
                let span = if cue.vertical.is_horizontal() {
                    container.width
                } else {
                    container.height
                };
                let available = span * computed_size(cue, direction) / 100.0;
                let extent = measurer.cue_extent(cue, available);
                let display = cue_display_box(&container, cue, direction, extent);
                RelativeBox::from_boxes(&container, &display)
            });

        position_cue(
            &container,
            cue,
            start.resolve(&container),
            measurer.line_height(cue),
            placed,
            self.step,
        )
    }

    fn place_region(
        &mut self,
        region: &Region,
        members: &[&Cue],
        measurer: &dyn LayoutMeasurer,
        placed: &[LayoutBox],
    ) -> LayoutBox {
        let container = self.container;
        let metrics = measurer.region_metrics(region, members);
        let height = region_height(region, &metrics);
        let natural = region_box(&container, region, height);

        let start = self
            .starting_boxes
            .entry(LayoutKey::Region(region.id.clone()))
            .or_insert_with(|| RelativeBox::from_boxes(&container, &natural))
            .resolve(&container)
            .resized(natural.width, natural.height);

        position_region(&container, start, placed, self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct FixedMeasurer;

    const LINE: f64 = 20.0;
    const PADDING: f64 = 4.0;

    fn height_of(cue: &Cue) -> f64 {
        cue.text.lines().count().max(1) as f64 * LINE + PADDING
    }

    impl LayoutMeasurer for FixedMeasurer {
        fn cue_extent(&self, cue: &Cue, _available: f64) -> f64 {
            height_of(cue)
        }

        fn line_height(&self, _cue: &Cue) -> f64 {
            LINE
        }

        fn region_metrics(&self, _region: &Region, cues: &[&Cue]) -> RegionMetrics {
            RegionMetrics {
                cue_heights: cues.iter().map(|c| height_of(c)).collect(),
                line_height: LINE,
                padding_y: PADDING,
                margin_top: 0.0,
            }
        }
    }

    fn container() -> LayoutBox {
        LayoutBox::new(0.0, 0.0, 640.0, 360.0)
    }

    fn no_overlaps(placements: &[Placement]) {
        for (i, a) in placements.iter().enumerate() {
            for b in &placements[i + 1..] {
                assert!(!a.rect.collides_with(&b.rect), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn active_cues_stack_newest_at_bottom() {
        let cues = vec![
            Cue::new(0.0, 10.0, "first"),
            Cue::new(1.0, 10.0, "second"),
            Cue::new(20.0, 30.0, "later"),
        ];
        let mut layout = OverlayLayout::new(container());
        let placements = layout.layout(5.0, &cues, &FixedMeasurer);

        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].target, LayoutKey::Cue(1));
        assert_eq!(placements[1].target, LayoutKey::Cue(0));
        assert!(placements[1].rect.bottom < placements[0].rect.top);
        for placement in &placements {
            assert!(placement.rect.is_within(&container()));
        }
        no_overlaps(&placements);
    }

    #[test]
    fn region_cues_are_placed_once() {
        let region = Arc::new(Region {
            id: "r".to_string(),
            width: 50.0,
            ..Default::default()
        });
        let mut a = Cue::new(0.0, 10.0, "a");
        a.region = Some(Arc::clone(&region));
        let mut b = Cue::new(0.0, 10.0, "b");
        b.region = Some(Arc::clone(&region));
        let solo = Cue::new(0.0, 10.0, "solo");

        let mut layout = OverlayLayout::new(container());
        let placements = layout.layout(1.0, &[a, b, solo], &FixedMeasurer);

        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].target, LayoutKey::Cue(2));
        assert_eq!(placements[1].target, LayoutKey::Region("r".to_string()));
        assert_eq!(placements[1].rect.width, 320.0);
        assert_eq!(placements[1].rect.height, 2.0 * (LINE + PADDING));
        no_overlaps(&placements);
    }

    #[test]
    fn redefined_region_keeps_all_members() {
        use crate::captions::{parse_text, ParseOptions};

        let text = "WEBVTT\n\nREGION\nid:a\nwidth:50%\n\n\
                    00:00.000 --> 00:05.000 region:a\nfirst\n\n\
                    REGION\nid:a\nwidth:50%\n\n\
                    00:00.000 --> 00:05.000 region:a\nsecond\n";
        let parsed = parse_text(text, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.cues.len(), 2);
        let (a, b) = (&parsed.cues[0], &parsed.cues[1]);
        assert!(!Arc::ptr_eq(a.region.as_ref().unwrap(), b.region.as_ref().unwrap()));

        let mut layout = OverlayLayout::new(container());
        let placements = layout.layout(1.0, &parsed.cues, &FixedMeasurer);
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].target, LayoutKey::Region("a".to_string()));
        assert_eq!(placements[0].rect.height, 2.0 * (LINE + PADDING));
    }

    #[test]
    fn cue_with_line_leaves_its_region() {
        let region = Arc::new(Region {
            id: "r".to_string(),
            ..Default::default()
        });
        let mut cue = Cue::new(0.0, 10.0, "x");
        cue.region = Some(region);
        cue.line = Some(0.0);

        let mut layout = OverlayLayout::new(container());
        let placements = layout.layout(1.0, &[cue], &FixedMeasurer);
        assert_eq!(placements[0].target, LayoutKey::Cue(0));
        assert_eq!(placements[0].rect.top, 0.0);
    }

    #[test]
    fn starting_boxes_are_remembered_until_reset() {
        let cues = vec![Cue::new(0.0, 10.0, "a"), Cue::new(0.0, 10.0, "b")];
        let mut layout = OverlayLayout::new(container());
        let first = layout.layout(1.0, &cues, &FixedMeasurer);
        assert_eq!(layout.remembered(), 2);

        let second = layout.layout(2.0, &cues, &FixedMeasurer);
        assert_eq!(first, second);

        layout.reset();
        assert_eq!(layout.remembered(), 0);
    }

    #[test]
    fn direction_change_drops_starting_boxes() {
        let cues = vec![Cue::new(0.0, 10.0, "a")];
        let mut layout = OverlayLayout::new(container());
        layout.layout(1.0, &cues, &FixedMeasurer);
        layout.set_direction(TextDirection::Rtl);
        assert_eq!(layout.remembered(), 0);
        assert_eq!(layout.direction(), TextDirection::Rtl);
    }

    #[test]
    fn settings_configure_step_and_direction() {
        let settings = LayoutSettings {
            collision_step: 4.0,
            direction: TextDirection::Rtl,
        };
        let layout = OverlayLayout::with_settings(container(), &settings);
        assert_eq!(layout.step(), 4.0);
        assert_eq!(layout.direction(), TextDirection::Rtl);
    }

    #[test]
    fn nothing_active() {
        let cues = vec![Cue::new(0.0, 1.0, "a")];
        let mut layout = OverlayLayout::new(container());
        assert!(layout.layout(5.0, &cues, &FixedMeasurer).is_empty());
    }
}
