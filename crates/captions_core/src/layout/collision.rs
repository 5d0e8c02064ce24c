//! Greedy collision-avoidance placement.
//!
//! A candidate box is pushed along each axis in turn until it sits inside
//! the container without touching any previously placed box. The first
//! axis that gets there wins. When none does, the position that left the
//! least area outside the container is kept.

use tracing::trace;

use super::geometry::{Axis, LayoutBox};

/// Distance added to every move, in layout units.
pub const DEFAULT_COLLISION_STEP: f64 = 8.0;

/// Place `start` inside `container` avoiding `placed`, using the default step.
pub fn avoid_box_collisions(
    container: &LayoutBox,
    start: LayoutBox,
    placed: &[LayoutBox],
    axes: &[Axis],
) -> LayoutBox {
    avoid_box_collisions_with_step(container, start, placed, axes, DEFAULT_COLLISION_STEP)
}

/// Place `start` inside `container` avoiding `placed`.
///
/// A non-positive or non-finite `step` falls back to the default so every
/// move makes progress.
pub fn avoid_box_collisions_with_step(
    container: &LayoutBox,
    start: LayoutBox,
    placed: &[LayoutBox],
    axes: &[Axis],
    step: f64,
) -> LayoutBox {
    let step = if step.is_finite() && step > 0.0 {
        step
    } else {
        DEFAULT_COLLISION_STEP
    };

    let mut best = start;
    let mut best_badness = badness(container, &start);

    for &axis in axes {
        let mut candidate = start;

        loop {
            let delta = if candidate.is_out_of_bounds(container, axis) {
                0.0
            } else if candidate.is_within(container) {
                match candidate.find_collision(placed) {
                    Some(avoid) => move_delta(axis, &candidate, avoid),
                    None => break,
                }
            } else {
                break;
            };
            candidate.translate(axis, delta + step);
            trace!(%axis, top = candidate.top, left = candidate.left, "Moved layout box");
        }

        if candidate.is_within(container) {
            return candidate;
        }

        let candidate_badness = badness(container, &candidate);
        if candidate_badness < best_badness {
            best = candidate;
            best_badness = candidate_badness;
        }
    }

    best
}

/// Share of the box's area lying outside the container.
///
/// Normalized by the candidate's own area rather than the container's: a
/// box fully inside scores 0 whatever its size, and one fully outside
/// scores 1. Lower is better.
fn badness(container: &LayoutBox, candidate: &LayoutBox) -> f64 {
    1.0 - candidate.intersection_ratio(container)
}

/// Distance that takes `candidate` just past the far edge of `avoid`.
fn move_delta(axis: Axis, candidate: &LayoutBox, avoid: &LayoutBox) -> f64 {
    match axis {
        Axis::PosX => avoid.right - candidate.left,
        Axis::NegX => candidate.right - avoid.left,
        Axis::PosY => avoid.bottom - candidate.top,
        Axis::NegY => candidate.bottom - avoid.top,
    }
}
