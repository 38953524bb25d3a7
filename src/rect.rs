//! Rectangles and points in surface coordinates

use serde::{Deserialize, Serialize};

// ============================================================================
// Point
// ============================================================================

/// A polygon vertex in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

impl From<(i16, i16)> for Point {
    fn from((x, y): (i16, i16)) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle: signed origin, unsigned extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i16,
    pub y: i16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    /// Build from wide integers. Negative extents collapse to zero,
    /// origins truncate to 16 bits the same way pixel coordinates do.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x: x as i16,
            y: y as i16,
            w: w.clamp(0, u16::MAX as i32) as u16,
            h: h.clamp(0, u16::MAX as i32) as u16,
        }
    }

    /// Inclusive corners, swapped into order
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        let (y1, y2) = if y1 > y2 { (y2, y1) } else { (y1, y2) };
        Self::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1)
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x as i32
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y as i32
    }

    /// Exclusive right edge
    #[inline]
    pub fn right(&self) -> i32 {
        self.x as i32 + self.w as i32
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y as i32 + self.h as i32
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let x1 = self.left().min(other.left());
        let y1 = self.top().min(other.top());
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Largest rectangle inside both. Disjoint inputs give zero width/height
    /// with the origin at the larger of the two starts.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x1 = self.left().max(other.left());
        let y1 = self.top().max(other.top());
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        Rect::new(x1, y1, (x2 - x1).max(0), (y2 - y1).max(0))
    }

    /// True when the intersection has area
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersection(other).is_empty()
    }
}

/// Union of two rects (free-function form)
pub fn rect_union(a: &Rect, b: &Rect) -> Rect {
    a.union(b)
}

/// Intersection of two rects; the flag says whether it is non-empty
pub fn rect_intersect(a: &Rect, b: &Rect) -> (Rect, bool) {
    let r = a.intersection(b);
    (r, !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_is_bounding_box() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 5, 5, 20);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0, 0, 25, 25));
        // Contains both inputs
        assert!(u.contains(0, 0) && u.contains(24, 24));
        assert_eq!(rect_union(&b, &a), u);
    }

    #[test]
    fn test_intersection_overlap_and_disjoint() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Rect::new(5, 5, 5, 5));

        let c = Rect::new(50, 50, 3, 3);
        let (r, hit) = rect_intersect(&a, &c);
        assert!(!hit);
        assert_eq!(r.w, 0);
        assert_eq!(r.h, 0);
    }

    #[test]
    fn test_negative_extent_clamps() {
        let r = Rect::new(3, 4, -5, 2);
        assert_eq!(r.w, 0);
        assert!(r.is_empty());
    }

    #[test]
    fn test_from_corners_orders() {
        assert_eq!(Rect::from_corners(9, 9, 0, 0), Rect::new(0, 0, 10, 10));
    }
}
