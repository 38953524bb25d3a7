//! Axis-aligned ellipses

use super::pixel::{plot_alpha, stamp, stamp_blend};
use super::{plot_opaque, Canvas};
use crate::rect::Rect;
use crate::surface::{Color, ALPHA_OPAQUE};

/// Radii below one pixel are raised to one; non-positive radii draw nothing
fn usable_radii(rx: f32, ry: f32) -> Option<(i32, i32)> {
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    Some(((rx.max(1.0)) as i32, (ry.max(1.0)) as i32))
}

fn ellipse_rect(x: i16, y: i16, rx: f32, ry: f32, th: u16) -> Rect {
    let t = if th == 1 { 0 } else { th as i32 };
    let left = (x as f32 - rx) as i32 - t / 2;
    let top = (y as f32 - ry) as i32 - t / 2;
    Rect::new(left, top, 2 * rx as i32 + 1 + t, 2 * ry as i32 + 1 + t)
}

/// Scale the two coverage weights by an overall alpha
#[inline]
fn coverage(is: f32, ip: f32, alpha: u8) -> (u8, u8) {
    let s_alpha = (is.min(1.0) * 255.0) as u8;
    let p_alpha = (ip.min(1.0) * 255.0) as u8;
    if alpha == ALPHA_OPAQUE {
        return (s_alpha, p_alpha);
    }
    let k = alpha as f32 / 255.0;
    ((s_alpha as f32 * k) as u8, (p_alpha as f32 * k) as u8)
}

/// Incremental state of the anti-aliased ellipse walk. `x`, `y` trace the
/// upper left quarter; mirrored points come from `2 * center - p`.
struct AaWalk {
    a2: i32,
    b2: i32,
    ds: i32,
    dt: i32,
    t: i32,
    s: i32,
    d: i32,
    x: i32,
    y: i32,
}

impl AaWalk {
    fn new(xc: i32, yc: i32, rx: i32, ry: i32) -> Self {
        let a2 = rx * rx;
        let b2 = ry * ry;
        Self {
            a2,
            b2,
            ds: 2 * a2,
            dt: 2 * b2,
            t: 0,
            s: -2 * a2 * ry,
            d: 0,
            x: xc,
            y: yc - ry,
        }
    }

    /// Columns walked in the flat part of the arc
    fn flat_steps(&self) -> i32 {
        (self.a2 as f64 / ((self.a2 + self.b2) as f64).sqrt()) as i32
    }

    /// One column to the left. Returns the secondary row and coverage fraction.
    fn step_x(&mut self) -> (i32, f32) {
        self.x -= 1;
        self.d += self.t - self.b2;
        let ys;
        if self.d >= 0 {
            ys = self.y - 1;
        } else if self.d - self.s - self.a2 > 0 {
            if 2 * self.d - self.s - self.a2 >= 0 {
                ys = self.y + 1;
            } else {
                ys = self.y;
                self.y += 1;
                self.d -= self.s + self.a2;
                self.s += self.ds;
            }
        } else {
            self.y += 1;
            ys = self.y + 1;
            self.d -= self.s + self.a2;
            self.s += self.ds;
        }
        self.t -= self.dt;
        (ys, self.d.abs() as f32 / self.s.abs() as f32)
    }

    /// One row down. Returns the secondary column and coverage fraction.
    fn step_y(&mut self) -> (i32, f32) {
        self.y += 1;
        self.d -= self.s + self.a2;
        let xs;
        if self.d <= 0 {
            xs = self.x + 1;
        } else if self.d + self.t - self.b2 < 0 {
            if 2 * self.d + self.t - self.b2 <= 0 {
                xs = self.x - 1;
            } else {
                xs = self.x;
                self.x -= 1;
                self.d += self.t - self.b2;
                self.t -= self.dt;
            }
        } else {
            self.x -= 1;
            xs = self.x - 1;
            self.d += self.t - self.b2;
            self.t -= self.dt;
        }
        self.s += self.ds;
        (xs, self.d.abs() as f32 / self.t.abs() as f32)
    }
}

/// Plot (x, y) and its three mirror images about (xc, yc)
fn mirror4(c: &mut Canvas<'_>, xc: i32, yc: i32, x: i32, y: i32, color: Color, alpha: u8) {
    c.plot_blend(x, y, color, alpha);
    c.plot_blend(2 * xc - x, y, color, alpha);
    c.plot_blend(x, 2 * yc - y, color, alpha);
    c.plot_blend(2 * xc - x, 2 * yc - y, color, alpha);
}

/// Walk the filled ellipse as horizontal spans `(x1, y, x2)` with eight-way
/// symmetry in 64x fixed point, emitting each row once.
fn ellipse_spans(x: i32, y: i32, rx: i32, ry: i32, mut span: impl FnMut(i32, i32, i32)) {
    let mut row_pair = |half: i32, dy: i32| {
        if dy != 0 {
            span(x - half, y - dy, x + half);
            span(x - half, y + dy, x + half);
        } else {
            span(x - half, y, x + half);
        }
    };
    let (major, minor) = if rx > ry { (rx, ry) } else { (ry, rx) };
    let (mut ox, mut oy) = (0xFFFF, 0xFFFF);
    let mut ix = 0;
    let mut iy = major * 64;
    loop {
        let h = (ix + 32) >> 6;
        let i = (iy + 32) >> 6;
        let j = (h * minor) / major;
        let k = (i * minor) / major;
        if rx > ry {
            if k != ox && k != oy {
                row_pair(h, k);
                ox = k;
            }
            if j != oy && j != ox && k != j {
                row_pair(i, j);
                oy = j;
            }
        } else {
            if i != ox && i != oy {
                row_pair(j, i);
                ox = i;
            }
            if h != oy && h != ox && i != h {
                row_pair(k, h);
                oy = h;
            }
        }
        ix += iy / major;
        iy -= ix / major;
        if i <= h {
            break;
        }
    }
}

impl Canvas<'_> {
    /// Call `plot` at every outline point of the ellipse
    pub fn ellipse_fn<F>(&mut self, x: i16, y: i16, rx: f32, ry: f32, color: Color, mut plot: F)
    where
        F: FnMut(&mut Canvas<'_>, i16, i16, Color),
    {
        let Some((rx, ry)) = usable_radii(rx, ry) else {
            return;
        };
        let (x, y) = (x as i32, y as i32);
        let mut quad = |c: &mut Canvas<'_>, px: i32, py: i32| {
            plot(c, (x + px) as i16, (y + py) as i16, color);
            if px != 0 {
                plot(c, (x - px) as i16, (y + py) as i16, color);
            }
            if py != 0 {
                plot(c, (x + px) as i16, (y - py) as i16, color);
                if px != 0 {
                    plot(c, (x - px) as i16, (y - py) as i16, color);
                }
            }
        };

        let wide = rx > ry;
        let (major, minor) = if wide { (rx, ry) } else { (ry, rx) };
        let (mut h, mut i, mut j, mut k) = (0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF);
        let mut ix = 0;
        let mut iy = major * 64;
        loop {
            let (oh, oi, oj, ok) = (h, i, j, k);
            h = (ix + 32) >> 6;
            i = (iy + 32) >> 6;
            j = (h * minor) / major;
            k = (i * minor) / major;
            if wide {
                if (h != oh || k != ok) && h < oi {
                    quad(self, h, k);
                }
                if (i != oi || j != oj) && h < i {
                    quad(self, i, j);
                }
            } else {
                if (j != oj || i != oi) && h < i {
                    quad(self, j, i);
                }
                if (k != ok || h != oh) && h < oi {
                    quad(self, k, h);
                }
            }
            ix += iy / major;
            iy -= ix / major;
            if i <= h {
                break;
            }
        }
    }

    pub fn ellipse(&mut self, x: i16, y: i16, rx: f32, ry: f32, color: Color) {
        self.ellipse_outline(x, y, rx, ry, color, None, "ellipse");
    }

    pub fn ellipse_blend(&mut self, x: i16, y: i16, rx: f32, ry: f32, color: Color, alpha: u8) {
        self.ellipse_outline(x, y, rx, ry, color, Some(alpha), "ellipse_blend");
    }

    fn ellipse_outline(&mut self, x: i16, y: i16, rx: f32, ry: f32, color: Color, alpha: Option<u8>, op: &'static str) {
        if usable_radii(rx, ry).is_none() {
            return;
        }
        let Some(_lock) = self.acquire(op) else {
            return;
        };
        let th = self.ctx.thickness();
        match (th, alpha) {
            (0, _) => return,
            (1, _) if self.ctx.anti_alias() => {
                self.ellipse_aa_raw(x, y, rx, ry, color, alpha.unwrap_or(ALPHA_OPAQUE));
            },
            (1, None) => self.ellipse_fn(x, y, rx, ry, color, plot_opaque),
            (1, Some(a)) => self.ellipse_fn(x, y, rx, ry, color, plot_alpha(a)),
            (_, None) => self.ellipse_fn(x, y, rx, ry, color, stamp),
            (_, Some(a)) => self.ellipse_fn(x, y, rx, ry, color, stamp_blend(a)),
        }
        self.mark_dirty(ellipse_rect(x, y, rx, ry, th));
    }

    pub fn ellipse_filled(&mut self, x: i16, y: i16, rx: f32, ry: f32, color: Color) {
        let Some((irx, iry)) = usable_radii(rx, ry) else {
            return;
        };
        let Some(_lock) = self.acquire("ellipse_filled") else {
            return;
        };
        if self.ctx.anti_alias() {
            self.ellipse_filled_aa_raw(x, y, rx, ry, color);
        } else {
            ellipse_spans(x as i32, y as i32, irx, iry, |x1, row, x2| self.span(x1, row, x2, color));
        }
        self.mark_dirty(ellipse_rect(x, y, rx, ry, 1));
    }

    pub fn ellipse_filled_blend(&mut self, x: i16, y: i16, rx: f32, ry: f32, color: Color, alpha: u8) {
        let Some((irx, iry)) = usable_radii(rx, ry) else {
            return;
        };
        let Some(_lock) = self.acquire("ellipse_filled_blend") else {
            return;
        };
        if self.ctx.anti_alias() {
            self.ellipse_filled_blend_aa_raw(x, y, rx, ry, color, alpha);
        } else {
            ellipse_spans(x as i32, y as i32, irx, iry, |x1, row, x2| {
                self.span_blend(x1, row, x2, color, alpha)
            });
        }
        self.mark_dirty(ellipse_rect(x, y, rx, ry, 1));
    }

    fn column(&mut self, x: i32, y1: i32, y2: i32, color: Color) {
        self.fill_clipped(x, y1.min(y2), x, y1.max(y2), color);
    }

    // ========================================================================
    // Anti-aliased walks (caller holds the lock and records the dirty rect)
    // ========================================================================

    /// Anti-aliased outline with two coverage-weighted pixels per step
    pub(crate) fn ellipse_aa_raw(&mut self, xc: i16, yc: i16, rx: f32, ry: f32, color: Color, alpha: u8) {
        let Some((rx, ry)) = usable_radii(rx, ry) else {
            return;
        };
        let (xc, yc) = (xc as i32, yc as i32);
        let mut w = AaWalk::new(xc, yc, rx, ry);
        mirror4(self, xc, yc, w.x, w.y, color, alpha);

        for _ in 0..w.flat_steps() {
            let (ys, cp) = w.step_x();
            let is = cp + 0.1;
            let (s_alpha, p_alpha) = coverage(is, 1.0 - is + 0.2, alpha);
            mirror4(self, xc, yc, w.x, w.y, color, p_alpha);
            mirror4(self, xc, yc, w.x, ys, color, s_alpha);
        }
        for _ in 0..(w.y - yc).abs() {
            let (xs, cp) = w.step_y();
            let is = cp + 0.1;
            let (s_alpha, p_alpha) = coverage(is, 1.0 - is + 0.2, alpha);
            mirror4(self, xc, yc, w.x, w.y, color, p_alpha);
            mirror4(self, xc, yc, xs, w.y, color, s_alpha);
        }
    }

    /// Opaque interior with an anti-aliased rim
    pub(crate) fn ellipse_filled_aa_raw(&mut self, xc: i16, yc: i16, rx: f32, ry: f32, color: Color) {
        let Some((rx, ry)) = usable_radii(rx, ry) else {
            return;
        };
        let (xc, yc) = (xc as i32, yc as i32);
        let mut w = AaWalk::new(xc, yc, rx, ry);
        let (mx, my) = (|x: i32| 2 * xc - x, |y: i32| 2 * yc - y);
        for (px, py) in [(w.x, w.y), (mx(w.x), w.y), (w.x, my(w.y)), (mx(w.x), my(w.y))] {
            self.plot(px, py, color);
        }
        self.column(w.x, w.y + 1, my(w.y) - 1, color);

        for _ in 0..w.flat_steps() {
            let (ys, is) = w.step_x();
            let (s_alpha, p_alpha) = ((is * 255.0) as u8, ((1.0 - is) * 255.0) as u8);
            mirror4(self, xc, yc, w.x, w.y, color, p_alpha);
            mirror4(self, xc, yc, w.x, ys, color, s_alpha);
            for (col, row) in [(w.x, w.y), (mx(w.x), w.y), (w.x, ys), (mx(w.x), ys)] {
                self.column(col, row + 1, my(row) - 1, color);
            }
        }
        for _ in 0..(w.y - yc).abs() {
            let (xs, is) = w.step_y();
            let (s_alpha, p_alpha) = ((is * 255.0) as u8, ((1.0 - is) * 255.0) as u8);
            mirror4(self, xc, yc, w.x, w.y, color, p_alpha);
            mirror4(self, xc, yc, xs, w.y, color, s_alpha);
            for (col, row) in [(w.x, w.y), (xs, w.y), (w.x, my(w.y)), (xs, my(w.y))] {
                self.span(col + 1, row, mx(col) - 1, color);
            }
        }
    }

    /// Blended interior plus a rim at two thirds of the alpha
    pub(crate) fn ellipse_filled_blend_aa_raw(&mut self, x: i16, y: i16, rx: f32, ry: f32, color: Color, alpha: u8) {
        let Some((irx, iry)) = usable_radii(rx, ry) else {
            return;
        };
        ellipse_spans(x as i32, y as i32, irx, iry, |x1, row, x2| {
            self.span_blend(x1, row, x2, color, alpha)
        });
        self.ellipse_aa_raw(x, y, rx, ry, color, (alpha as f32 / 1.5) as u8);
    }
}
