//! Midpoint circles

use super::pixel::{plot_alpha, stamp, stamp_blend};
use super::{plot_opaque, Canvas};
use crate::rect::Rect;
use crate::surface::{Color, ALPHA_OPAQUE};

/// Integer midpoint walk over one octant, from (0, r) down to the diagonal
#[derive(Debug, Clone, Copy)]
pub(crate) struct Midpoint {
    pub cx: i32,
    pub cy: i32,
    df: i32,
    d_e: i32,
    d_se: i32,
}

impl Midpoint {
    pub fn new(r: i32) -> Self {
        Self {
            cx: 0,
            cy: r,
            df: 1 - r,
            d_e: 3,
            d_se: -2 * r + 5,
        }
    }

    /// Whether this step also moves down a row
    #[inline]
    pub fn stepping_down(&self) -> bool {
        self.df >= 0
    }

    /// Step to the next point; `false` once past the diagonal
    pub fn advance(&mut self) -> bool {
        if self.df < 0 {
            self.df += self.d_e;
            self.d_e += 2;
            self.d_se += 2;
        } else {
            self.df += self.d_se;
            self.d_e += 2;
            self.d_se += 4;
            self.cy -= 1;
        }
        self.cx += 1;
        self.cx <= self.cy
    }
}

/// Integer radius plus the even-diameter offset for a fractional radius.
/// Fractions near a half keep the radius and shift the lower right half
/// one pixel out; fractions of two thirds or more round up.
pub(crate) fn effective_radius(r: f32) -> (i32, i32) {
    let effr = r as i32;
    let frac = r - effr as f32;
    if frac > 0.33333 && frac < 0.66667 {
        (effr, 1)
    } else if frac >= 0.66667 {
        (effr + 1, 0)
    } else {
        (effr, 0)
    }
}

/// Dirty rect shared by circles and arcs
pub(crate) fn circle_rect(x: i16, y: i16, r: f32, th: u16) -> Rect {
    let rr = r as i32;
    let (x, y) = (x as i32, y as i32);
    if th == 1 {
        Rect::new(x - rr, y - rr, 2 * rr + 2, 2 * rr + 2)
    } else {
        let t = th as i32;
        Rect::new(x - rr - t / 2, y - rr - t / 2, 2 * rr + 2 + t, 2 * rr + 2 + t)
    }
}

/// Walk the filled circle as horizontal spans `(x1, y, x2)`
fn circle_spans(c: &mut Canvas<'_>, x: i16, y: i16, r: f32, mut span: impl FnMut(&mut Canvas<'_>, i32, i32, i32)) {
    let (effr, off) = effective_radius(r);
    let (x, y) = (x as i32, y as i32);
    let mut m = Midpoint::new(effr);
    loop {
        let (cx, cy) = (m.cx, m.cy);
        if m.stepping_down() {
            span(c, x - cx, y + cy + off, x + cx + off);
            span(c, x - cx, y - cy, x + cx + off);
        }
        if cx != cy {
            span(c, x - cy, y + cx + off, x + cy + off);
            if cx != 0 || off != 0 {
                span(c, x - cy, y - cx, x + cy + off);
            }
        }
        if !m.advance() {
            break;
        }
    }
}

impl Canvas<'_> {
    /// Call `plot` at every outline point of the circle. Nothing for r <= 0.
    pub fn circle_fn<F>(&mut self, x: i16, y: i16, r: f32, color: Color, mut plot: F)
    where
        F: FnMut(&mut Canvas<'_>, i16, i16, Color),
    {
        if r <= 0.0 {
            return;
        }
        let (effr, off) = effective_radius(r);
        let (x, y) = (x as i32, y as i32);
        let mut m = Midpoint::new(effr);
        let mut put = |c: &mut Canvas<'_>, px: i32, py: i32| plot(c, px as i16, py as i16, color);
        loop {
            let (cx, cy) = (m.cx, m.cy);
            if cx != 0 || off != 0 {
                put(self, x + cx + off, y + cy + off);
                put(self, x + cy + off, y - cx);
                put(self, x - cx, y - cy);
                put(self, x - cy, y - cx);
            }
            put(self, x + cx + off, y - cy);
            put(self, x - cx, y + cy + off);
            put(self, x + cy + off, y + cx + off);
            put(self, x - cy, y + cx + off);
            if !m.advance() {
                break;
            }
        }
    }

    pub fn circle(&mut self, x: i16, y: i16, r: f32, color: Color) {
        self.circle_outline(x, y, r, color, None, "circle");
    }

    pub fn circle_blend(&mut self, x: i16, y: i16, r: f32, color: Color, alpha: u8) {
        self.circle_outline(x, y, r, color, Some(alpha), "circle_blend");
    }

    fn circle_outline(&mut self, x: i16, y: i16, r: f32, color: Color, alpha: Option<u8>, op: &'static str) {
        if r < 0.0 {
            return;
        }
        let Some(_lock) = self.acquire(op) else {
            return;
        };
        let th = self.ctx.thickness();
        match (th, alpha) {
            (0, _) => return,
            (1, _) if self.ctx.anti_alias() => {
                self.ellipse_aa_raw(x, y, r, r, color, alpha.unwrap_or(ALPHA_OPAQUE));
            },
            (1, None) => self.circle_fn(x, y, r, color, plot_opaque),
            (1, Some(a)) => self.circle_fn(x, y, r, color, plot_alpha(a)),
            (_, None) => self.circle_fn(x, y, r, color, stamp),
            (_, Some(a)) => self.circle_fn(x, y, r, color, stamp_blend(a)),
        }
        self.mark_dirty(circle_rect(x, y, r, th));
    }

    /// Filled disk. A zero radius still sets the center pixel.
    pub fn circle_filled(&mut self, x: i16, y: i16, r: f32, color: Color) {
        if r < 0.0 {
            return;
        }
        if r == 0.0 {
            self.pixel(x, y, color);
            return;
        }
        let Some(_lock) = self.acquire("circle_filled") else {
            return;
        };
        if self.ctx.anti_alias() {
            self.ellipse_filled_aa_raw(x, y, r, r, color);
        } else {
            circle_spans(self, x, y, r, |c, x1, y, x2| c.span(x1, y, x2, color));
        }
        self.mark_dirty(circle_rect(x, y, r, 1));
    }

    pub fn circle_filled_blend(&mut self, x: i16, y: i16, r: f32, color: Color, alpha: u8) {
        if r < 0.0 {
            return;
        }
        let aa = self.ctx.anti_alias();
        if r == 0.0 && !aa {
            self.pixel_blend(x, y, color, alpha);
            return;
        }
        let Some(_lock) = self.acquire("circle_filled_blend") else {
            return;
        };
        if aa {
            self.ellipse_filled_blend_aa_raw(x, y, r, r, color, alpha);
        } else {
            circle_spans(self, x, y, r, |c, x1, y, x2| c.span_blend(x1, y, x2, color, alpha));
        }
        self.mark_dirty(circle_rect(x, y, r, 1));
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    const C: Color = 0xFFAB_CDEF;

    fn rotate_quarter(pts: &[(i32, i32)], cx: i32, cy: i32) -> Vec<(i32, i32)> {
        let mut out: Vec<_> = pts.iter().map(|&(x, y)| (cx - (y - cy), cy + (x - cx))).collect();
        out.sort_by_key(|&(x, y)| (y, x));
        out
    }

    #[test]
    fn test_effective_radius() {
        assert_eq!(effective_radius(5.0), (5, 0));
        assert_eq!(effective_radius(5.5), (5, 1));
        assert_eq!(effective_radius(5.8), (6, 0));
        assert_eq!(effective_radius(5.2), (5, 0));
    }

    #[test]
    fn test_circle_symmetric_under_quarter_turn() {
        let mut s = surface(40, 40);
        let mut ctx = context();
        ctx.canvas(&mut s).circle(20, 20, 11.0, C);
        let pts = lit(&s, C);
        assert!(!pts.is_empty());
        assert_eq!(rotate_quarter(&pts, 20, 20), pts);
    }

    #[test]
    fn test_circle_hits_axis_extremes() {
        let mut s = surface(30, 30);
        let mut ctx = context();
        ctx.canvas(&mut s).circle(15, 15, 6.0, C);
        let pts = lit(&s, C);
        for p in [(21, 15), (9, 15), (15, 21), (15, 9)] {
            assert!(pts.contains(&p), "{p:?}");
        }
        assert!(!pts.contains(&(15, 15)));
    }

    #[test]
    fn test_zero_radius_outline_draws_nothing_but_fill_draws_center() {
        let mut s = surface(8, 8);
        let mut ctx = context();
        ctx.canvas(&mut s).circle(4, 4, 0.0, C);
        assert!(lit(&s, C).is_empty());
        ctx.canvas(&mut s).circle_filled(4, 4, 0.0, C);
        assert_eq!(lit(&s, C), vec![(4, 4)]);
    }

    #[test]
    fn test_filled_covers_outline() {
        let mut a = surface(30, 30);
        let mut b = surface(30, 30);
        let mut ctx = context();
        ctx.canvas(&mut a).circle(15, 15, 8.0, C);
        ctx.canvas(&mut b).circle_filled(15, 15, 8.0, C);
        let filled = lit(&b, C);
        assert!(lit(&a, C).iter().all(|p| filled.contains(p)));
        assert!(filled.contains(&(15, 15)));
        assert_eq!(rotate_quarter(&filled, 15, 15), filled);
    }

    #[test]
    fn test_filled_blend_touches_each_pixel_once() {
        let mut s = surface(30, 30);
        s.fill(0xFF00_0000);
        let mut ctx = context();
        ctx.canvas(&mut s).circle_filled_blend(15, 15, 7.0, 0xFFFF_FFFF, 128);
        let (r, ..) = s.get_rgba(s.read_raw(15, 15));
        assert_eq!(r, 127);
        let (r, ..) = s.get_rgba(s.read_raw(15, 8));
        assert_eq!(r, 127);
    }

    #[test]
    fn test_circle_fn_matches_circle() {
        let mut s = surface(30, 30);
        let mut ctx = context();
        let mut seen = Vec::new();
        let mut c = ctx.canvas(&mut s);
        c.circle_fn(15, 15, 9.0, C, |_, x, y, _| seen.push((x as i32, y as i32)));
        c.circle(15, 15, 9.0, C);
        seen.sort_by_key(|&(x, y)| (y, x));
        seen.dedup();
        assert_eq!(lit(&s, C), seen);
    }

    #[test]
    fn test_dirty_rect() {
        assert_eq!(circle_rect(10, 10, 3.0, 1), Rect::new(7, 7, 8, 8));
        assert_eq!(circle_rect(10, 10, 3.0, 4), Rect::new(5, 5, 12, 12));
    }
}
