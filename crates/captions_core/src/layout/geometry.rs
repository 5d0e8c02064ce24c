//! Axis-aligned boxes used by the layout engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction a box can be moved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "+x")]
    PosX,
    #[serde(rename = "-x")]
    NegX,
    #[serde(rename = "+y")]
    PosY,
    #[serde(rename = "-y")]
    NegY,
}

impl Axis {
    /// Whether this axis moves along x.
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Axis::PosX | Axis::NegX)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::PosX => "+x",
            Axis::NegX => "-x",
            Axis::PosY => "+y",
            Axis::NegY => "-y",
        };
        f.write_str(name)
    }
}

/// An axis-aligned rectangle.
///
/// Width and height are cached; every constructor and move keeps them
/// consistent with the edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutBox {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutBox {
    /// Create a box from its origin and size.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            right: left + width,
            bottom: top + height,
            width,
            height,
        }
    }

    /// Create a box from its four edges.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            top,
            left,
            right,
            bottom,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Same size, new origin.
    pub fn at(&self, left: f64, top: f64) -> Self {
        Self::new(left, top, self.width, self.height)
    }

    /// Same origin, new size.
    pub fn resized(&self, width: f64, height: f64) -> Self {
        Self::new(self.left, self.top, width, height)
    }

    /// Translate in place along `axis` by `delta`.
    pub fn translate(&mut self, axis: Axis, delta: f64) {
        match axis {
            Axis::PosX => {
                self.left += delta;
                self.right += delta;
            }
            Axis::NegX => {
                self.left -= delta;
                self.right -= delta;
            }
            Axis::PosY => {
                self.top += delta;
                self.bottom += delta;
            }
            Axis::NegY => {
                self.top -= delta;
                self.bottom -= delta;
            }
        }
    }

    /// Copy translated along `axis` by `delta`.
    pub fn moved(mut self, axis: Axis, delta: f64) -> Self {
        self.translate(axis, delta);
        self
    }

    /// Overlap test. Touching edges count as a collision.
    pub fn collides_with(&self, other: &LayoutBox) -> bool {
        self.left <= other.right
            && self.right >= other.left
            && self.top <= other.bottom
            && self.bottom >= other.top
    }

    /// First box in `boxes` that this box collides with.
    pub fn find_collision<'b>(&self, boxes: &'b [LayoutBox]) -> Option<&'b LayoutBox> {
        boxes.iter().find(|other| self.collides_with(other))
    }

    /// Whether this box lies entirely inside `container`.
    pub fn is_within(&self, container: &LayoutBox) -> bool {
        self.top >= container.top
            && self.bottom <= container.bottom
            && self.left >= container.left
            && self.right <= container.right
    }

    /// Whether the box sticks out of `container` on the side that moving
    /// along `axis` brings back inside.
    pub fn is_out_of_bounds(&self, container: &LayoutBox, axis: Axis) -> bool {
        match axis {
            Axis::PosX => self.left < container.left,
            Axis::NegX => self.right > container.right,
            Axis::PosY => self.top < container.top,
            Axis::NegY => self.bottom > container.bottom,
        }
    }

    /// Fraction of this box's area covered by `other`, in `0..=1`.
    ///
    /// Zero-area boxes report 0.
    pub fn intersection_ratio(&self, other: &LayoutBox) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        let x = (self.right.min(other.right) - self.left.max(other.left)).max(0.0);
        let y = (self.bottom.min(other.bottom) - self.top.max(other.top)).max(0.0);
        (x * y / area).min(1.0)
    }
}

/// A box stored as insets from its container's edges.
///
/// Survives container resizes: resolving against a new container keeps the
/// distance to each edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativeBox {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl RelativeBox {
    pub fn from_boxes(container: &LayoutBox, inner: &LayoutBox) -> Self {
        Self {
            top: inner.top - container.top,
            left: inner.left - container.left,
            right: container.right - inner.right,
            bottom: container.bottom - inner.bottom,
        }
    }

    /// Absolute box inside `container`.
    pub fn resolve(&self, container: &LayoutBox) -> LayoutBox {
        LayoutBox::from_edges(
            container.left + self.left,
            container.top + self.top,
            container.right - self.right,
            container.bottom - self.bottom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_agree() {
        let a = LayoutBox::new(10.0, 20.0, 30.0, 40.0);
        let b = LayoutBox::from_edges(10.0, 20.0, 40.0, 60.0);
        assert_eq!(a, b);
        assert_eq!(a.area(), 1200.0);
    }

    #[test]
    fn translate_keeps_size() {
        let base = LayoutBox::new(0.0, 0.0, 10.0, 10.0);
        let moved = base.moved(Axis::PosX, 5.0).moved(Axis::NegY, 3.0);
        assert_eq!(moved.left, 5.0);
        assert_eq!(moved.right, 15.0);
        assert_eq!(moved.top, -3.0);
        assert_eq!(moved.bottom, 7.0);
        assert_eq!(moved.width, 10.0);
        assert_eq!(moved.height, 10.0);
    }

    #[test]
    fn touching_edges_collide() {
        let a = LayoutBox::new(0.0, 0.0, 10.0, 10.0);
        let b = LayoutBox::new(10.0, 0.0, 10.0, 10.0);
        let c = LayoutBox::new(10.5, 0.0, 10.0, 10.0);
        assert!(a.collides_with(&b));
        assert!(!a.collides_with(&c));
        assert_eq!(a.find_collision(&[c, b]), Some(&b));
    }

    #[test]
    fn containment_and_bounds() {
        let container = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let inside = LayoutBox::new(10.0, 10.0, 20.0, 20.0);
        assert!(inside.is_within(&container));
        assert!(container.is_within(&container));

        let below = LayoutBox::new(10.0, 90.0, 20.0, 20.0);
        assert!(!below.is_within(&container));
        assert!(below.is_out_of_bounds(&container, Axis::NegY));
        assert!(!below.is_out_of_bounds(&container, Axis::PosY));

        let left = LayoutBox::new(-5.0, 10.0, 20.0, 20.0);
        assert!(left.is_out_of_bounds(&container, Axis::PosX));
        assert!(!left.is_out_of_bounds(&container, Axis::NegX));
    }

    #[test]
    fn intersection_ratio_is_relative_to_self() {
        let container = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let half_out = LayoutBox::new(0.0, 90.0, 10.0, 20.0);
        assert!((half_out.intersection_ratio(&container) - 0.5).abs() < 1e-12);
        assert_eq!(container.intersection_ratio(&container), 1.0);

        let apart = LayoutBox::new(200.0, 200.0, 10.0, 10.0);
        assert_eq!(apart.intersection_ratio(&container), 0.0);

        let empty = LayoutBox::new(5.0, 5.0, 0.0, 10.0);
        assert_eq!(empty.intersection_ratio(&container), 0.0);
    }

    #[test]
    fn relative_box_follows_container() {
        let container = LayoutBox::new(0.0, 0.0, 100.0, 50.0);
        let inner = LayoutBox::new(10.0, 5.0, 30.0, 10.0);
        let relative = RelativeBox::from_boxes(&container, &inner);
        assert_eq!(relative.resolve(&container), inner);

        let shifted = LayoutBox::new(50.0, 50.0, 100.0, 50.0);
        let resolved = relative.resolve(&shifted);
        assert_eq!(resolved.left, 60.0);
        assert_eq!(resolved.top, 55.0);
        assert_eq!(resolved.width, 30.0);
    }

    #[test]
    fn axis_display() {
        assert_eq!(Axis::PosY.to_string(), "+y");
        assert_eq!(Axis::NegX.to_string(), "-x");
        assert!(Axis::NegX.is_horizontal());
    }
}
