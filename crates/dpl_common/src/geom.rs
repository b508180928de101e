//! Integer die geometry in database units (DBU).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the die, in DBU.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i64,
    /// Vertical coordinate.
    pub y: i64,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Rectilinear distance to `other`.
    pub fn manhattan(self, other: Point) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle, half-open on the high edges.
///
/// `xl <= xh` and `yl <= yh` always hold for rectangles built with
/// [`Rect::new`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Low x edge.
    pub xl: i64,
    /// Low y edge.
    pub yl: i64,
    /// High x edge.
    pub xh: i64,
    /// High y edge.
    pub yh: i64,
}

impl Rect {
    /// Creates a rectangle from two opposite corners in any order.
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self {
            xl: x0.min(x1),
            yl: y0.min(y1),
            xh: x0.max(x1),
            yh: y0.max(y1),
        }
    }

    /// Creates a rectangle from an origin and a size.
    pub fn from_origin(origin: Point, width: i64, height: i64) -> Self {
        Self::new(origin.x, origin.y, origin.x + width, origin.y + height)
    }

    /// Horizontal extent.
    pub fn width(&self) -> i64 {
        self.xh - self.xl
    }

    /// Vertical extent.
    pub fn height(&self) -> i64 {
        self.yh - self.yl
    }

    /// Area in square DBU.
    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    /// Lower-left corner.
    pub fn ll(&self) -> Point {
        Point::new(self.xl, self.yl)
    }

    /// Geometric center, rounded toward negative infinity.
    pub fn center(&self) -> Point {
        Point::new(
            (self.xl + self.xh).div_euclid(2),
            (self.yl + self.yh).div_euclid(2),
        )
    }

    /// Returns `true` if `other` lies entirely within this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.xl >= self.xl && other.xh <= self.xh && other.yl >= self.yl && other.yh <= self.yh
    }

    /// Returns `true` if the interiors of the two rectangles intersect.
    ///
    /// Rectangles that merely abut do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.xl < other.xh && other.xl < self.xh && self.yl < other.yh && other.yl < self.yh
    }

    /// Smallest rectangle covering both.
    pub fn merge(&self, other: &Rect) -> Rect {
        Rect {
            xl: self.xl.min(other.xl),
            yl: self.yl.min(other.yl),
            xh: self.xh.max(other.xh),
            yh: self.yh.max(other.yh),
        }
    }

    /// Clamps `pt` into the closed rectangle.
    pub fn closest_pt_inside(&self, pt: Point) -> Point {
        Point::new(pt.x.clamp(self.xl, self.xh), pt.y.clamp(self.yl, self.yh))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) - ({}, {})", self.xl, self.yl, self.xh, self.yh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_corners() {
        let r = Rect::new(10, 20, 0, 5);
        assert_eq!(r, Rect { xl: 0, yl: 5, xh: 10, yh: 20 });
        assert_eq!(r.area(), 150);
    }

    #[test]
    fn abutting_rects_do_not_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 20, 10);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(9, 9, 11, 11)));
    }

    #[test]
    fn containment() {
        let outer = Rect::new(0, 0, 100, 100);
        assert!(outer.contains(&Rect::new(0, 0, 100, 100)));
        assert!(!outer.contains(&Rect::new(-1, 0, 10, 10)));
    }

    #[test]
    fn closest_point_clamps() {
        let r = Rect::new(10, 10, 20, 20);
        assert_eq!(r.closest_pt_inside(Point::new(0, 15)), Point::new(10, 15));
        assert_eq!(r.closest_pt_inside(Point::new(30, 30)), Point::new(20, 20));
    }

    #[test]
    fn manhattan_distance() {
        assert_eq!(Point::new(0, 0).manhattan(Point::new(-3, 4)), 7);
    }
}
