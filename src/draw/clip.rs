//! Cohen–Sutherland line clipping against a surface's clip rectangle

use bitflags::bitflags;

use crate::surface::Surface;

bitflags! {
    /// Which clip edges a point lies beyond
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Outcode: u8 {
        const LEFT = 0x1;
        const RIGHT = 0x2;
        const BOTTOM = 0x4;
        const TOP = 0x8;
    }
}

/// Inclusive clip bounds
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClipBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ClipBox {
    pub fn of(surface: &Surface) -> Self {
        Self {
            left: surface.clip_xmin(),
            top: surface.clip_ymin(),
            right: surface.clip_xmax(),
            bottom: surface.clip_ymax(),
        }
    }

    pub fn encode(&self, x: i32, y: i32) -> Outcode {
        let mut code = Outcode::empty();
        if x < self.left {
            code |= Outcode::LEFT;
        } else if x > self.right {
            code |= Outcode::RIGHT;
        }
        if y < self.top {
            code |= Outcode::TOP;
        } else if y > self.bottom {
            code |= Outcode::BOTTOM;
        }
        code
    }
}

/// Clip the segment in place. Returns `false` when nothing is left to draw.
/// Endpoints may come back swapped.
pub(crate) fn clip_line(bounds: ClipBox, x1: &mut i32, y1: &mut i32, x2: &mut i32, y2: &mut i32) -> bool {
    // Each pass pins one endpoint to one edge; a handful always suffices
    for _ in 0..16 {
        let mut code1 = bounds.encode(*x1, *y1);
        let mut code2 = bounds.encode(*x2, *y2);
        if (code1 | code2).is_empty() {
            return true;
        }
        if code1.intersects(code2) {
            return false;
        }
        if code1.is_empty() {
            std::mem::swap(x1, x2);
            std::mem::swap(y1, y2);
            std::mem::swap(&mut code1, &mut code2);
        }
        let m = if *x2 != *x1 {
            (*y2 - *y1) as f32 / (*x2 - *x1) as f32
        } else {
            1.0
        };
        if code1.contains(Outcode::LEFT) {
            *y1 += ((bounds.left - *x1) as f32 * m) as i32;
            *x1 = bounds.left;
        } else if code1.contains(Outcode::RIGHT) {
            *y1 += ((bounds.right - *x1) as f32 * m) as i32;
            *x1 = bounds.right;
        } else if code1.contains(Outcode::BOTTOM) {
            if *x2 != *x1 {
                *x1 += ((bounds.bottom - *y1) as f32 / m) as i32;
            }
            *y1 = bounds.bottom;
        } else if code1.contains(Outcode::TOP) {
            if *x2 != *x1 {
                *x1 += ((bounds.top - *y1) as f32 / m) as i32;
            }
            *y1 = bounds.top;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> ClipBox {
        ClipBox {
            left: 0,
            top: 0,
            right: 9,
            bottom: 9,
        }
    }

    #[test]
    fn test_inside_accepted_unchanged() {
        let (mut x1, mut y1, mut x2, mut y2) = (1, 2, 8, 7);
        assert!(clip_line(bounds(), &mut x1, &mut y1, &mut x2, &mut y2));
        assert_eq!((x1, y1, x2, y2), (1, 2, 8, 7));
    }

    #[test]
    fn test_outside_rejected() {
        let (mut x1, mut y1, mut x2, mut y2) = (-5, -5, -1, 20);
        assert!(!clip_line(bounds(), &mut x1, &mut y1, &mut x2, &mut y2));
        let (mut x1, mut y1, mut x2, mut y2) = (20, 3, 30, 3);
        assert!(!clip_line(bounds(), &mut x1, &mut y1, &mut x2, &mut y2));
    }

    #[test]
    fn test_horizontal_crossing_clipped_to_edges() {
        let (mut x1, mut y1, mut x2, mut y2) = (-10, 4, 20, 4);
        assert!(clip_line(bounds(), &mut x1, &mut y1, &mut x2, &mut y2));
        let (lo, hi) = (x1.min(x2), x1.max(x2));
        assert_eq!((lo, hi, y1, y2), (0, 9, 4, 4));
    }

    #[test]
    fn test_diagonal_crossing_stays_inside() {
        let (mut x1, mut y1, mut x2, mut y2) = (-5, -5, 15, 15);
        assert!(clip_line(bounds(), &mut x1, &mut y1, &mut x2, &mut y2));
        for (x, y) in [(x1, y1), (x2, y2)] {
            assert!(bounds().encode(x, y).is_empty());
        }
    }

    #[test]
    fn test_vertical_line_clipped() {
        let (mut x1, mut y1, mut x2, mut y2) = (3, -4, 3, 40);
        assert!(clip_line(bounds(), &mut x1, &mut y1, &mut x2, &mut y2));
        assert_eq!((x1.min(x2), y1.min(y2), y1.max(y2)), (3, 0, 9));
    }
}
