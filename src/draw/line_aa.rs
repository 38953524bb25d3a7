//! Wu anti-aliased lines and color-fading lines

use super::line::stroke_rect;
use super::pixel::stamp_blend;
use super::Canvas;
use crate::surface::{Color, ALPHA_OPAQUE};

/// Bits of coverage carried by the error accumulator
const AA_BITS: u32 = 8;

/// Walk the interior of a Wu line from (x0, y0) to (x1, y1), with y0 <= y1.
/// For every step `pair(px, py, qx, qy, weight)` receives the main pixel, its
/// neighbour across the minor axis and the neighbour's coverage (0..=255);
/// the main pixel's coverage is `255 - weight`. Endpoints are not visited.
fn wu_walk<F>(x0: i32, y0: i32, x1: i32, y1: i32, mut pair: F)
where
    F: FnMut(i32, i32, i32, i32, u32),
{
    let intshift = 32 - AA_BITS;
    let mut dx = x1 - x0;
    let dy = y1 - y0;
    let xdir = if dx < 0 { -1 } else { 1 };
    dx = dx.abs();

    let (mut xx, mut yy) = (x0, y0);
    let mut erracc: u32 = 0;

    if dy > dx {
        let erradj = (((i64::from(dx) << 16) / i64::from(dy)) as u32) << 16;
        let mut xnext = xx + xdir;
        for _ in 1..dy {
            let before = erracc;
            erracc = erracc.wrapping_add(erradj);
            if erracc <= before {
                xx = xnext;
                xnext += xdir;
            }
            yy += 1;
            pair(xx, yy, xnext, yy, (erracc >> intshift) & 255);
        }
    } else {
        let erradj = (((i64::from(dy) << 16) / i64::from(dx)) as u32) << 16;
        let mut ynext = yy + 1;
        for _ in 1..dx {
            let before = erracc;
            erracc = erracc.wrapping_add(erradj);
            if erracc <= before {
                yy = ynext;
                ynext += 1;
            }
            xx += xdir;
            pair(xx, yy, xx, ynext, (erracc >> intshift) & 255);
        }
    }
}

/// Horizontal, vertical and 45° lines need no smoothing
#[inline]
fn is_trivial(x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
    let (dx, dy) = ((x2 - x1).abs(), (y2 - y1).abs());
    dx == 0 || dy == 0 || dx == dy
}

/// Walk a Bresenham line interpolating RGB and alpha in 16.16 fixed point,
/// calling `visit(canvas, x, y, color, alpha)` at every point.
fn fade_walk<F>(c: &mut Canvas<'_>, from: (i32, i32, Color, u8), to: (i32, i32, Color, u8), mut visit: F)
where
    F: FnMut(&mut Canvas<'_>, i32, i32, Color, u8),
{
    let (x1, y1, color1, alpha1) = from;
    let (x2, y2, color2, alpha2) = to;
    let (dx, dy) = (x2 - x1, y2 - y1);
    let sdx = if dx < 0 { -1 } else { 1 };
    let sdy = if dy < 0 { -1 } else { 1 };
    let dx = sdx * dx + 1;
    let dy = sdy * dy + 1;
    let steps = dx.max(dy);

    let (r1, g1, b1) = c.surface.format().get_rgb(color1);
    let (r2, g2, b2) = c.surface.format().get_rgb(color2);
    let mut acc = Channels::new(r1, g1, b1, alpha1);
    let step = acc.step_to(&Channels::new(r2, g2, b2, alpha2), steps);

    let (mut px, mut py) = (x1, y1);
    let (mut ex, mut ey) = (0, 0);
    for _ in 0..steps {
        let color = acc.color(c);
        visit(c, px, py, color, acc.alpha());
        if dx >= dy {
            ey += dy;
            if ey >= dx {
                ey -= dx;
                py += sdy;
            }
            px += sdx;
        } else {
            ex += dx;
            if ex >= dy {
                ex -= dy;
                px += sdx;
            }
            py += sdy;
        }
        acc.add(&step);
    }
}

/// RGBA accumulator in 16.16 fixed point
#[derive(Debug, Clone, Copy)]
struct Channels {
    r: i32,
    g: i32,
    b: i32,
    a: i32,
}

impl Channels {
    fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: (r as i32) << 16,
            g: (g as i32) << 16,
            b: (b as i32) << 16,
            a: (a as i32) << 16,
        }
    }

    fn step_to(&self, end: &Channels, steps: i32) -> Channels {
        Channels {
            r: (end.r - self.r) / steps,
            g: (end.g - self.g) / steps,
            b: (end.b - self.b) / steps,
            a: (end.a - self.a) / steps,
        }
    }

    #[inline]
    fn add(&mut self, step: &Channels) {
        self.r += step.r;
        self.g += step.g;
        self.b += step.b;
        self.a += step.a;
    }

    #[inline]
    fn color(&self, c: &Canvas<'_>) -> Color {
        c.surface.map_rgb((self.r >> 16) as u8, (self.g >> 16) as u8, (self.b >> 16) as u8)
    }

    #[inline]
    fn alpha(&self) -> u8 {
        (self.a >> 16) as u8
    }
}

impl Canvas<'_> {
    /// Wu line at `alpha`, no locking or dirty tracking
    pub(crate) fn line_aa_raw(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color, alpha: u8) {
        if is_trivial(x1, y1, x2, y2) {
            if alpha == ALPHA_OPAQUE {
                self.bresenham(x1, y1, x2, y2, color);
            } else {
                self.bresenham_blend(x1, y1, x2, y2, color, alpha);
            }
            return;
        }

        let scale = alpha as f32 / 255.0;
        let weigh = |w: u32| {
            let a = w as u8;
            if alpha == ALPHA_OPAQUE {
                a
            } else {
                (a as f32 * scale) as u8
            }
        };
        let endpoint = |c: &mut Self, x: i32, y: i32| {
            if alpha == ALPHA_OPAQUE {
                c.plot(x, y, color);
            } else {
                c.plot_blend(x, y, color, alpha);
            }
        };

        endpoint(self, x1, y1);
        let ((ax, ay), (bx, by)) = if y1 > y2 { ((x2, y2), (x1, y1)) } else { ((x1, y1), (x2, y2)) };
        wu_walk(ax, ay, bx, by, |px, py, qx, qy, wgt| {
            self.plot_blend(px, py, color, weigh(255 - wgt));
            self.plot_blend(qx, qy, color, weigh(wgt));
        });
        endpoint(self, x2, y2);
    }

    /// Wu line fading color and alpha between the endpoints
    pub(crate) fn line_fade_aa_raw(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        from: (Color, u8),
        to: (Color, u8),
    ) {
        if is_trivial(x1, y1, x2, y2) {
            fade_walk(self, (x1, y1, from.0, from.1), (x2, y2, to.0, to.1), |c, x, y, color, _| {
                c.plot_blend(x, y, color, from.1);
            });
            return;
        }

        // Walk top to bottom; endpoint colors follow their points
        let ((ax, ay, ca), (bx, by, cb)) = if y1 > y2 {
            ((x2, y2, to), (x1, y1, from))
        } else {
            ((x1, y1, from), (x2, y2, to))
        };
        let steps = (bx - ax).abs().max(by - ay);
        let fmt = self.surface.format();
        let (r1, g1, b1) = fmt.get_rgb(ca.0);
        let (r2, g2, b2) = fmt.get_rgb(cb.0);
        let mut acc = Channels::new(r1, g1, b1, ca.1);
        let end = Channels::new(r2, g2, b2, cb.1);
        let step = acc.step_to(&end, steps);
        let start_color = self.surface.map_rgb(r1, g1, b1);
        let end_color = self.surface.map_rgb(r2, g2, b2);

        if ca.1 == ALPHA_OPAQUE {
            self.plot(ax, ay, start_color);
        } else {
            self.plot_blend(ax, ay, start_color, ca.1);
        }

        let fading = ca.1 != ALPHA_OPAQUE;
        wu_walk(ax, ay, bx, by, |px, py, qx, qy, wgt| {
            acc.add(&step);
            let color = acc.color(self);
            let weigh = |w: u32| {
                let a = w as u8;
                if fading {
                    (a as f32 * acc.alpha() as f32 / 255.0) as u8
                } else {
                    a
                }
            };
            self.plot_blend(px, py, color, weigh(255 - wgt));
            self.plot_blend(qx, qy, color, weigh(wgt));
        });

        if cb.1 == ALPHA_OPAQUE {
            self.plot(bx, by, end_color);
        } else {
            self.plot_blend(bx, by, end_color, cb.1);
        }
    }

    // ========================================================================
    // Fading lines
    // ========================================================================

    /// Walk the segment fading from `color1` to `color2`, calling `plot` with
    /// the interpolated color at every point. No locking or dirty tracking.
    pub fn line_fade_fn<F>(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color1: Color, color2: Color, mut plot: F)
    where
        F: FnMut(&mut Canvas<'_>, i16, i16, Color),
    {
        fade_walk(
            self,
            (x1 as i32, y1 as i32, color1, ALPHA_OPAQUE),
            (x2 as i32, y2 as i32, color2, ALPHA_OPAQUE),
            |c, x, y, color, _| plot(c, x as i16, y as i16, color),
        );
    }

    pub fn line_fade(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color1: Color, color2: Color) {
        let Some(_lock) = self.acquire("line_fade") else {
            return;
        };
        let th = self.ctx.thickness();
        let (ix1, iy1, ix2, iy2) = (x1 as i32, y1 as i32, x2 as i32, y2 as i32);
        match th {
            0 => return,
            1 => {
                if self.ctx.anti_alias() {
                    self.line_fade_aa_raw(ix1, iy1, ix2, iy2, (color1, ALPHA_OPAQUE), (color2, ALPHA_OPAQUE));
                } else {
                    self.line_fade_fn(x1, y1, x2, y2, color1, color2, super::plot_opaque);
                }
            },
            _ => self.line_fade_fn(x1, y1, x2, y2, color1, color2, super::pixel::stamp),
        }
        self.mark_dirty(stroke_rect(ix1, iy1, ix2, iy2, th));
    }

    /// Fade color and alpha along the line
    pub fn line_fade_blend(
        &mut self,
        x1: i16,
        y1: i16,
        x2: i16,
        y2: i16,
        color1: Color,
        alpha1: u8,
        color2: Color,
        alpha2: u8,
    ) {
        let Some(_lock) = self.acquire("line_fade_blend") else {
            return;
        };
        let th = self.ctx.thickness();
        let (ix1, iy1, ix2, iy2) = (x1 as i32, y1 as i32, x2 as i32, y2 as i32);
        let from = (ix1, iy1, color1, alpha1);
        let to = (ix2, iy2, color2, alpha2);
        match th {
            0 => return,
            1 => {
                if self.ctx.anti_alias() {
                    self.line_fade_aa_raw(ix1, iy1, ix2, iy2, (color1, alpha1), (color2, alpha2));
                } else {
                    fade_walk(self, from, to, |c, x, y, color, a| {
                        c.plot_blend(x, y, color, a);
                    });
                }
            },
            _ => fade_walk(self, from, to, |c, x, y, color, a| {
                stamp_blend(a)(c, x as i16, y as i16, color);
            }),
        }
        self.mark_dirty(stroke_rect(ix1, iy1, ix2, iy2, th));
    }
}
