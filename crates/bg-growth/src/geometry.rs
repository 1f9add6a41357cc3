//! Straight-line segment tests used to keep the triangulation planar.

use rstar::{AABB, RTreeObject};

use bg_core::Point;

/// `true` if `a`, `b`, `c` make a strict counter-clockwise turn.
#[inline]
pub fn ccw(a: Point, b: Point, c: Point) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

/// Proper intersection of segments `ab` and `cd`.
///
/// Segments sharing an endpoint never intersect properly, which is what lets
/// several accepted edges fan out of one POI.  Collinear overlap is not
/// detected.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    if a == c || a == d || b == c || b == d {
        return false;
    }
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}

/// A straight segment between two node positions, indexable by `rstar`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn properly_intersects(&self, other: &Segment) -> bool {
        segments_intersect(self.start, self.end, other.start, other.end)
    }
}

impl RTreeObject for Segment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.start.to_array(), self.end.to_array())
    }
}
