//! Cubic Bézier curves, flattened into line segments

use super::Canvas;
use crate::rect::{Point, Rect};
use crate::surface::Color;

/// Forward-difference stepper for one coordinate of a cubic
#[derive(Debug, Clone, Copy)]
struct Cubic {
    v: f32,
    d1: f32,
    d2: f32,
    d3: f32,
}

impl Cubic {
    fn new(p0: i16, p1: i16, p2: i16, p3: i16, delta: f32) -> Self {
        let (p0, p1, p2, p3) = (p0 as f32, p1 as f32, p2 as f32, p3 as f32);
        let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
        let b = 3.0 * p0 - 6.0 * p1 + 3.0 * p2;
        let c = -3.0 * p0 + 3.0 * p1;
        let d2 = delta * delta;
        let d3 = d2 * delta;
        Self {
            v: p0,
            d1: a * d3 + b * d2 + c * delta,
            d2: 6.0 * a * d3 + 2.0 * b * d2,
            d3: 6.0 * a * d3,
        }
    }

    #[inline]
    fn step(&mut self) {
        self.v += self.d1;
        self.d1 += self.d2;
        self.d2 += self.d3;
    }
}

/// Segment count for a quality level: 2^quality with quality in 1..=15
fn segments(quality: u8) -> u32 {
    1 << quality.clamp(1, 15)
}

impl Canvas<'_> {
    /// Curve from `start` to `end` pulled toward the two control points.
    /// Higher `quality` means more, shorter segments.
    pub fn bezier(&mut self, start: Point, c1: Point, c2: Point, end: Point, quality: u8, color: Color) {
        self.bezier_with(start, c1, c2, end, quality, "bezier", |c, x1, y1, x2, y2| {
            c.line(x1, y1, x2, y2, color);
        });
    }

    pub fn bezier_blend(&mut self, start: Point, c1: Point, c2: Point, end: Point, quality: u8, color: Color, alpha: u8) {
        self.bezier_with(start, c1, c2, end, quality, "bezier_blend", |c, x1, y1, x2, y2| {
            c.line_blend(x1, y1, x2, y2, color, alpha);
        });
    }

    fn bezier_with(
        &mut self,
        start: Point,
        c1: Point,
        c2: Point,
        end: Point,
        quality: u8,
        op: &'static str,
        mut segment: impl FnMut(&mut Canvas<'_>, i16, i16, i16, i16),
    ) {
        let Some(_lock) = self.acquire(op) else {
            return;
        };
        let n = segments(quality);
        let delta = 1.0 / n as f32;
        let mut bx = Cubic::new(start.x, c1.x, c2.x, end.x, delta);
        let mut by = Cubic::new(start.y, c1.y, c2.y, end.y, delta);
        let (mut xmin, mut ymin) = (start.x, start.y);
        let (mut xmax, mut ymax) = (start.x, start.y);

        self.nested(|c| {
            for _ in 0..n {
                let (xp, yp) = (bx.v as i16, by.v as i16);
                bx.step();
                by.step();
                let (x, y) = (bx.v as i16, by.v as i16);
                if xp == x && yp == y {
                    continue;
                }
                segment(c, xp, yp, x, y);
                xmin = xmin.min(xp).min(x);
                ymin = ymin.min(yp).min(y);
                xmax = xmax.max(xp).max(x);
                ymax = ymax.max(yp).max(y);
            }
        });

        let th = self.ctx.thickness() as i32;
        let (xmin, ymin) = (xmin as i32 - th / 2, ymin as i32 - th / 2);
        let w = xmax as i32 - xmin as i32 + 1 + th;
        let h = ymax as i32 - ymin as i32 + 1 + th;
        drop(_lock);
        self.mark_dirty(Rect::new(xmin, ymin, w, h));
    }
}
