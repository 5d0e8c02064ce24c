//! Caption layout engine.
//!
//! Places cue and region boxes inside a display container so they do not
//! overlap. Pure geometry: text measurement comes from the caller through
//! [`LayoutMeasurer`].
//!
//! # Components
//!
//! - **geometry**: Boxes, axes and container-relative insets
//! - **collision**: Greedy collision-avoidance placement
//! - **cue**: Display box and line resolution for standalone cues
//! - **region**: Region height and anchoring
//! - **overlay**: One layout pass over the active cues

pub mod collision;
pub mod cue;
pub mod geometry;
pub mod overlay;
pub mod region;

pub use collision::{avoid_box_collisions, avoid_box_collisions_with_step, DEFAULT_COLLISION_STEP};
pub use cue::{
    computed_line, computed_position, computed_position_align, computed_size, cue_display_box,
    position_cue, TextDirection,
};
pub use geometry::{Axis, LayoutBox, RelativeBox};
pub use overlay::{LayoutKey, LayoutMeasurer, OverlayLayout, Placement};
pub use region::{position_region, region_box, region_height, RegionMetrics, REGION_AXES};
