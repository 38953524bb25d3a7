//! Arcs and pies
//!
//! Angles run clockwise on screen from the positive x axis (y grows down).
//! Public entrypoints take angles in the context's unit; the walkers below
//! work in degrees.

use super::circle::{circle_rect, Midpoint};
use super::pixel::{plot_alpha, stamp, stamp_blend};
use super::{plot_opaque, Canvas};
use crate::surface::{Color, ALPHA_OPAQUE};

/// Fold an angle into [0, 360)
fn wrap_degrees(mut a: f32) -> f32 {
    while a >= 360.0 {
        a -= 360.0;
    }
    while a < 0.0 {
        a += 360.0;
    }
    a
}

/// Angle of an octant point (x, y) with 0 <= x <= y, in degrees.
/// The axis and diagonal cases are exact so sweeps meeting there seam cleanly.
fn octant_angle(x: i32, y: i32) -> f32 {
    if x == 0 {
        90.0
    } else if x == y {
        45.0
    } else {
        (y as f32).atan2(x as f32).to_degrees()
    }
}

/// Midpoint arc over [start, end] degrees, calling `plot` for every point
/// inside the sweep
fn arc_walk<F>(c: &mut Canvas<'_>, cx: i16, cy: i16, radius: f32, start: f32, end: f32, color: Color, plot: &mut F)
where
    F: FnMut(&mut Canvas<'_>, i16, i16, Color),
{
    let (mut start, mut end) = if start > end { (end, start) } else { (start, end) };
    if start == end {
        return;
    }
    if end - start >= 360.0 {
        c.circle_fn(cx, cy, radius, color, &mut *plot);
        return;
    }

    // Move both ends together until the sweep overlaps [0, 360]
    while start < 0.0 && end < 0.0 {
        start += 360.0;
        end += 360.0;
    }
    while start > 360.0 && end > 360.0 {
        start -= 360.0;
        end -= 360.0;
    }
    let crosses_zero = (start < 0.0 && end > 0.0) || (start < 360.0 && end > 360.0);
    start = wrap_degrees(start);
    end = wrap_degrees(end);
    if end == 0.0 {
        end = 360.0;
    } else if crosses_zero {
        arc_walk(c, cx, cy, radius, start, 360.0, color, plot);
        start = 0.0;
    }

    let r = radius as i32;
    if r <= 0 {
        return;
    }
    let inside = |a: f32| a >= start && a <= end;
    let (ox, oy) = (cx as i32, cy as i32);
    let mut put = |c: &mut Canvas<'_>, px: i32, py: i32| plot(c, px as i16, py as i16, color);
    let mut m = Midpoint::new(r);
    loop {
        let (x, y) = (m.cx, m.cy);
        let angle = octant_angle(x, y);
        if x != 0 {
            if inside(angle) {
                put(c, ox + x, oy + y);
            }
            if inside(270.0 - angle) {
                put(c, ox - y, oy - x);
            }
            if inside(angle + 180.0) {
                put(c, ox - x, oy - y);
            }
            if inside(angle + 270.0) {
                put(c, ox + y, oy - x);
            }
        }
        if inside(90.0 - angle) {
            put(c, ox + y, oy + x);
        }
        if inside(180.0 - angle) {
            put(c, ox - x, oy + y);
        }
        if inside(angle + 90.0) {
            put(c, ox - y, oy + x);
        }
        if inside(360.0 - angle) {
            put(c, ox + x, oy - y);
        }
        if !m.advance() {
            break;
        }
    }
}

impl Canvas<'_> {
    /// Call `plot` at every point of the arc from `start` to `end`.
    /// A sweep of a full turn or more traces the whole circle.
    pub fn arc_fn<F>(&mut self, x: i16, y: i16, r: f32, start: f32, end: f32, color: Color, mut plot: F)
    where
        F: FnMut(&mut Canvas<'_>, i16, i16, Color),
    {
        let (start, end) = (self.ctx.to_degrees(start), self.ctx.to_degrees(end));
        arc_walk(self, x, y, r, start, end, color, &mut plot);
    }

    pub fn arc(&mut self, x: i16, y: i16, r: f32, start: f32, end: f32, color: Color) {
        let (start, end) = (self.ctx.to_degrees(start), self.ctx.to_degrees(end));
        self.arc_degrees(x, y, r, start, end, color, None);
    }

    pub fn arc_blend(&mut self, x: i16, y: i16, r: f32, start: f32, end: f32, color: Color, alpha: u8) {
        let (start, end) = (self.ctx.to_degrees(start), self.ctx.to_degrees(end));
        self.arc_degrees(x, y, r, start, end, color, Some(alpha));
    }

    /// Arc outline with angles in degrees; `None` draws opaque
    pub(crate) fn arc_degrees(&mut self, x: i16, y: i16, r: f32, start: f32, end: f32, color: Color, alpha: Option<u8>) {
        let op = if alpha.is_some() { "arc_blend" } else { "arc" };
        let Some(_lock) = self.acquire(op) else {
            return;
        };
        let th = self.ctx.thickness();
        match (th, alpha) {
            (0, _) => return,
            (1, None) => arc_walk(self, x, y, r, start, end, color, &mut plot_opaque),
            (1, Some(a)) => arc_walk(self, x, y, r, start, end, color, &mut plot_alpha(a)),
            (_, None) => arc_walk(self, x, y, r, start, end, color, &mut stamp),
            (_, Some(a)) => arc_walk(self, x, y, r, start, end, color, &mut stamp_blend(a)),
        }
        self.mark_dirty(circle_rect(x, y, r, th));
    }

    // ========================================================================
    // Pies
    // ========================================================================

    /// Filled pie between the two angles
    pub fn arc_filled(&mut self, x: i16, y: i16, r: f32, start: f32, end: f32, color: Color) {
        let (start, end) = (self.ctx.to_degrees(start), self.ctx.to_degrees(end));
        self.pie_degrees(x, y, r, start, end, color, ALPHA_OPAQUE);
    }

    pub fn arc_filled_blend(&mut self, x: i16, y: i16, r: f32, start: f32, end: f32, color: Color, alpha: u8) {
        let (start, end) = (self.ctx.to_degrees(start), self.ctx.to_degrees(end));
        self.pie_degrees(x, y, r, start, end, color, alpha);
    }

    /// Span fill of a pie. Each scanline is clipped against the two chords
    /// through the sweep's end points, with separate handling for sweeps
    /// lying in one half, reflex sweeps and end points on the x axis.
    pub(crate) fn pie_degrees(&mut self, x: i16, y: i16, r: f32, start: f32, end: f32, color: Color, alpha: u8) {
        let (mut start, mut end) = if start > end { (end, start) } else { (start, end) };
        if start == end {
            return;
        }
        let sweep = end - start;
        if sweep >= 360.0 {
            self.circle_filled_blend(x, y, r, color, alpha);
            return;
        }
        let reflex = sweep > 180.0;
        let sx = (r * start.to_radians().cos()) as i32;
        let sy = (r * start.to_radians().sin()) as i32;
        let ex = (r * end.to_radians().cos()) as i32;
        let ey = (r * end.to_radians().sin()) as i32;

        // End points collapsing onto one pixel
        if sy == ey && sx >= ex - 1 && ex + 1 <= sx && sweep > 350.0 {
            self.circle_filled_blend(x, y, r, color, alpha);
            return;
        }
        if sy == ey && sx == ex && sweep < 10.0 {
            return;
        }

        let Some(_lock) = self.acquire("arc_filled") else {
            return;
        };
        start = wrap_degrees(start);
        end = wrap_degrees(end);
        let both_top = start > 180.0 && end > 180.0;
        let both_bot = start < 180.0 && end < 180.0;
        let s180 = sy == 0 && sx < 0;
        let s0 = sy == 0 && sx >= 0;
        let e180 = ey == 0 && ex < 0;
        let e0 = ey == 0 && ex >= 0;

        let sm = sy as f32 / sx as f32;
        let em = ey as f32 / ex as f32;
        let xf = x as f32;
        let (x, y) = (x as i32, y as i32);
        // Intercept of a chord of slope `m` with row offset `dy`, bounded by the circle edge
        let at_most = |m: f32, dy: i32, edge: i32| {
            let v = dy as f32 / m + xf;
            (if v < edge as f32 { v } else { edge as f32 }) as i32
        };
        let at_least = |m: f32, dy: i32, edge: i32| {
            let v = dy as f32 / m + xf;
            (if v > edge as f32 { v } else { edge as f32 }) as i32
        };
        let mut span = |c: &mut Canvas<'_>, xl: i32, row: i32, xr: i32| c.span_blend(xl, row, xr, color, alpha);

        let mut m = Midpoint::new(r as i32);
        loop {
            let (cx, cy) = (m.cx, m.cy);
            if m.stepping_down() {
                if !both_top {
                    let xl = if ey > 0 { at_least(em, cy, x - cx) } else { x - cx };
                    let xr = if sy > 0 { at_most(sm, cy, x + cx) } else { x + cx };
                    if xl <= xr && !(s180 && ey <= 0) && !(sy <= 0 && e0) {
                        span(self, xl, y + cy, xr);
                    }
                } else if reflex {
                    span(self, x - cx, y + cy, x + cx);
                    let xr = if ey < 0 { at_most(em, -cy, x + cx) } else { x + cx };
                    if x - cx <= xr {
                        span(self, x - cx, y - cy, xr);
                    }
                    let xl = if sy < 0 { at_least(sm, -cy, x - cx) } else { x - cx };
                    if xl <= x + cx {
                        span(self, xl, y - cy, x + cx);
                    }
                }
                if !both_bot {
                    let xl = if sy < 0 { at_least(sm, -cy, x - cx) } else { x - cx };
                    let xr = if ey < 0 { at_most(em, -cy, x + cx) } else { x + cx };
                    if xl <= xr && !(e180 && sy >= 0) {
                        span(self, xl, y - cy, xr);
                    }
                } else if reflex {
                    span(self, x - cx, y - cy, x + cx);
                    let xr = if sy > 0 { at_most(sm, cy, x + cx) } else { x + cx };
                    if x - cx <= xr && !s0 && !(sy > 0 && e0) {
                        span(self, x - cx, y + cy, xr);
                    }
                    let xl = if ey > 0 { at_least(em, cy, x - cx) } else { x - cx };
                    if xl <= x + cx && !(sy > 0 && e0) {
                        span(self, xl, y + cy, x + cx);
                    }
                }
            }
            if cx != cy {
                if !both_top {
                    let xl = if ey > 0 { at_least(em, cx, x - cy) } else { x - cy };
                    let xr = if sy > 0 { at_most(sm, cx, x + cy) } else { x + cy };
                    if xl <= xr && !(s180 && ey <= 0) && !(sy <= 0 && e0) {
                        span(self, xl, y + cx, xr);
                    }
                } else if reflex {
                    if cx != 0 {
                        span(self, x - cy, y + cx, x + cy);
                    }
                    let xr = if ey < 0 { at_most(em, -cx, x + cy) } else { x + cy };
                    if x - cy <= xr {
                        span(self, x - cy, y - cx, xr);
                    }
                    let xl = if sy < 0 { at_least(sm, -cx, x - cy) } else { x - cy };
                    if xl <= x + cy {
                        span(self, xl, y - cx, x + cy);
                    }
                }
                // The center row was already drawn by the lower half
                if cx != 0 && !both_bot {
                    let xl = if sy < 0 { at_least(sm, -cx, x - cy) } else { x - cy };
                    let xr = if ey < 0 { at_most(em, -cx, x + cy) } else { x + cy };
                    if xl <= xr && !(e180 && sy >= 0) {
                        span(self, xl, y - cx, xr);
                    }
                } else if both_bot && reflex {
                    if cx != 0 {
                        span(self, x - cy, y - cx, x + cy);
                    }
                    let xr = if sy > 0 { at_most(sm, cx, x + cy) } else { x + cy };
                    if x - cy <= xr && !s0 && !(sy > 0 && e0) {
                        span(self, x - cy, y + cx, xr);
                    }
                    let xl = if ey > 0 { at_least(em, cx, x - cy) } else { x - cy };
                    if xl <= x + cy && !(sy > 0 && e0) {
                        span(self, xl, y + cx, x + cy);
                    }
                }
            }
            if !m.advance() {
                break;
            }
        }
        drop(_lock);
        self.mark_dirty(circle_rect(x as i16, y as i16, r, 1));
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    const C: Color = 0xFF55_AA11;

    #[test]
    fn test_two_arcs_make_a_circle() {
        for r in [5.0, 8.0, 13.0] {
            let mut a = surface(40, 40);
            let mut b = surface(40, 40);
            let mut ctx = context();
            let mut c = ctx.canvas(&mut a);
            c.arc(20, 20, r, 0.0, 90.0, C);
            c.arc(20, 20, r, 90.0, 360.0, C);
            ctx.canvas(&mut b).circle(20, 20, r, C);
            assert_eq!(lit(&a, C), lit(&b, C), "r = {r}");
        }
    }

    #[test]
    fn test_quarter_arc_stays_in_quadrant() {
        let mut s = surface(40, 40);
        let mut ctx = context();
        ctx.canvas(&mut s).arc(20, 20, 10.0, 0.0, 90.0, C);
        let pts = lit(&s, C);
        assert!(pts.contains(&(30, 20)));
        assert!(pts.contains(&(20, 30)));
        assert!(pts.iter().all(|&(x, y)| x >= 20 && y >= 20));
    }

    #[test]
    fn test_equal_angles_draw_nothing() {
        let mut s = surface(20, 20);
        let mut ctx = context();
        let mut c = ctx.canvas(&mut s);
        c.arc(10, 10, 5.0, 45.0, 45.0, C);
        c.arc_filled(10, 10, 5.0, 45.0, 45.0, C);
        assert!(lit(&s, C).is_empty());
    }

    #[test]
    fn test_sweep_across_zero() {
        let mut s = surface(40, 40);
        let mut ctx = context();
        ctx.canvas(&mut s).arc(20, 20, 10.0, -30.0, 30.0, C);
        let pts = lit(&s, C);
        assert!(pts.contains(&(30, 20)));
        assert!(pts.iter().all(|&(x, _)| x > 25));
        assert!(pts.iter().any(|&(_, y)| y < 20));
        assert!(pts.iter().any(|&(_, y)| y > 20));
    }

    #[test]
    fn test_radians_mode() {
        let mut a = surface(40, 40);
        let mut b = surface(40, 40);
        let mut ctx = context();
        ctx.canvas(&mut a).arc(20, 20, 9.0, 0.0, 90.0, C);
        ctx.use_radians(true);
        ctx.canvas(&mut b).arc(20, 20, 9.0, 0.0, std::f32::consts::FRAC_PI_2, C);
        assert_eq!(lit(&a, C), lit(&b, C));
    }

    #[test]
    fn test_pie_quarter_fills_one_quadrant() {
        let mut s = surface(40, 40);
        let mut ctx = context();
        ctx.canvas(&mut s).arc_filled(20, 20, 10.0, 0.0, 90.0, C);
        let pts = lit(&s, C);
        assert!(pts.contains(&(24, 24)));
        assert!(!pts.contains(&(16, 24)));
        assert!(!pts.contains(&(24, 16)));
        assert!(!pts.contains(&(16, 16)));
    }

    #[test]
    fn test_pie_reflex_leaves_wedge_empty() {
        let mut s = surface(40, 40);
        let mut ctx = context();
        ctx.canvas(&mut s).arc_filled(20, 20, 10.0, 0.0, 270.0, C);
        let pts = lit(&s, C);
        assert!(pts.contains(&(24, 24)));
        assert!(pts.contains(&(16, 24)));
        assert!(pts.contains(&(16, 16)));
        assert!(!pts.contains(&(25, 15)));
    }

    #[test]
    fn test_full_sweep_pie_is_disk() {
        let mut a = surface(30, 30);
        let mut b = surface(30, 30);
        let mut ctx = context();
        ctx.canvas(&mut a).arc_filled(15, 15, 7.0, 0.0, 360.0, C);
        ctx.canvas(&mut b).circle_filled(15, 15, 7.0, C);
        assert_eq!(lit(&a, C), lit(&b, C));
    }
}
