//! Axis-aligned and Bresenham lines

use super::clip::{clip_line, ClipBox};
use super::pixel::{plot_alpha, stamp, stamp_blend};
use super::Canvas;
use crate::rect::Rect;
use crate::surface::{Color, ALPHA_OPAQUE};

/// Bounding box of a stroked segment. Thick strokes grow by the stamp radius
/// on the low side and the full thickness on the high side.
pub(crate) fn stroke_rect(x1: i32, y1: i32, x2: i32, y2: i32, th: u16) -> Rect {
    let (xmin, xmax) = (x1.min(x2), x1.max(x2));
    let (ymin, ymax) = (y1.min(y2), y1.max(y2));
    if th == 1 {
        return Rect::new(xmin, ymin, xmax - xmin + 1, ymax - ymin + 1);
    }
    let th = th as i32;
    let x = xmin - th / 2;
    let y = ymin - th / 2;
    Rect::new(x, y, xmax - x + 1 + th, ymax - y + 1 + th)
}

impl Canvas<'_> {
    // ========================================================================
    // Horizontal / vertical
    // ========================================================================

    /// Unlocked, untracked opaque span, clipped
    pub(crate) fn span(&mut self, x1: i32, y: i32, x2: i32, color: Color) {
        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        self.fill_clipped(x1, y, x2, y, color);
    }

    /// Blended counterpart of [`Self::span`]
    pub(crate) fn span_blend(&mut self, x1: i32, y: i32, x2: i32, color: Color, alpha: u8) {
        self.nested(|c| c.rect_filled_blend(x1 as i16, y as i16, x2 as i16, y as i16, color, alpha));
    }

    pub fn hline(&mut self, x1: i16, y: i16, x2: i16, color: Color) {
        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        let th = self.ctx.thickness();
        if th == 0 {
            return;
        }
        let Some(_lock) = self.acquire("hline") else {
            return;
        };
        let h = th as i32;
        let top = y as i32 - (h - 1) / 2;
        self.fill_clipped(x1 as i32, top, x2 as i32, top + h - 1, color);
        self.mark_dirty_unclipped(Rect::new(x1 as i32, top, x2 as i32 - x1 as i32 + 1, h));
    }

    pub fn hline_blend(&mut self, x1: i16, y: i16, x2: i16, color: Color, alpha: u8) {
        let th = self.ctx.thickness();
        match th {
            0 => {},
            1 => self.rect_filled_blend(x1, y, x2, y, color, alpha),
            _ => {
                let h = th as i16;
                let y = y - (h - 1) / 2;
                self.rect_filled_blend(x1, y, x2, y + h - 1, color, alpha);
            },
        }
    }

    pub fn vline(&mut self, x: i16, y1: i16, y2: i16, color: Color) {
        let (y1, y2) = if y1 > y2 { (y2, y1) } else { (y1, y2) };
        let th = self.ctx.thickness();
        if th == 0 {
            return;
        }
        let Some(_lock) = self.acquire("vline") else {
            return;
        };
        let w = th as i32;
        let left = x as i32 - (w - 1) / 2;
        self.fill_clipped(left, y1 as i32, left + w - 1, y2 as i32, color);
        self.mark_dirty_unclipped(Rect::new(left, y1 as i32, w, y2 as i32 - y1 as i32 + 1));
    }

    pub fn vline_blend(&mut self, x: i16, y1: i16, y2: i16, color: Color, alpha: u8) {
        let th = self.ctx.thickness();
        match th {
            0 => {},
            1 => self.rect_filled_blend(x, y1, x, y2, color, alpha),
            _ => {
                let w = th as i16;
                let x = x - (w - 1) / 2;
                self.rect_filled_blend(x, y1, x + w - 1, y2, color, alpha);
            },
        }
    }

    // ========================================================================
    // General lines
    // ========================================================================

    /// Walk the segment with integer Bresenham, calling `plot` at every point
    /// including both endpoints. No clipping, locking or dirty tracking.
    pub fn line_fn<F>(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: Color, mut plot: F)
    where
        F: FnMut(&mut Canvas<'_>, i16, i16, Color),
    {
        let (dx, dy) = (x2 as i32 - x1 as i32, y2 as i32 - y1 as i32);
        let sdx = if dx < 0 { -1 } else { 1 };
        let sdy = if dy < 0 { -1 } else { 1 };
        let dx = sdx * dx + 1;
        let dy = sdy * dy + 1;
        let (mut px, mut py) = (x1 as i32, y1 as i32);
        let (mut ex, mut ey) = (0, 0);

        if dx >= dy {
            for _ in 0..dx {
                plot(self, px as i16, py as i16, color);
                ey += dy;
                if ey >= dx {
                    ey -= dx;
                    py += sdy;
                }
                px += sdx;
            }
        } else {
            for _ in 0..dy {
                plot(self, px as i16, py as i16, color);
                ex += dx;
                if ex >= dy {
                    ex -= dy;
                    px += sdx;
                }
                py += sdy;
            }
        }
    }

    /// Clipped opaque Bresenham, writing straight to the surface
    pub(crate) fn bresenham(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let (mut x1, mut y1, mut x2, mut y2) = (x1, y1, x2, y2);
        if !clip_line(ClipBox::of(self.surface), &mut x1, &mut y1, &mut x2, &mut y2) {
            return;
        }
        let (dx, dy) = (x2 - x1, y2 - y1);
        let sdx = if dx < 0 { -1 } else { 1 };
        let sdy = if dy < 0 { -1 } else { 1 };
        let (mut major, mut minor) = (sdx * dx + 1, sdy * dy + 1);
        // Step vectors along the major and minor axis
        let (mut step, mut side) = ((sdx, 0), (0, sdy));
        if major < minor {
            std::mem::swap(&mut major, &mut minor);
            std::mem::swap(&mut step, &mut side);
        }
        let (mut x, mut y) = (x1, y1);
        let mut err = 0;
        for _ in 0..major {
            self.surface.write_raw(x, y, color);
            err += minor;
            if err >= major {
                err -= major;
                x += side.0;
                y += side.1;
            }
            x += step.0;
            y += step.1;
        }
    }

    /// Blended Bresenham through the plot callback (clipped per pixel)
    pub(crate) fn bresenham_blend(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color, alpha: u8) {
        self.line_fn(x1 as i16, y1 as i16, x2 as i16, y2 as i16, color, plot_alpha(alpha));
    }

    /// Line at the current thickness; anti-aliased when the context says so
    pub fn line(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: Color) {
        let Some(_lock) = self.acquire("line") else {
            return;
        };
        let th = self.ctx.thickness();
        let (ix1, iy1, ix2, iy2) = (x1 as i32, y1 as i32, x2 as i32, y2 as i32);
        match th {
            0 => return,
            1 => {
                if self.ctx.anti_alias() {
                    self.line_aa_raw(ix1, iy1, ix2, iy2, color, ALPHA_OPAQUE);
                } else {
                    self.bresenham(ix1, iy1, ix2, iy2, color);
                }
            },
            _ => self.line_fn(x1, y1, x2, y2, color, stamp),
        }
        self.mark_dirty(stroke_rect(ix1, iy1, ix2, iy2, th));
    }

    pub fn line_blend(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: Color, alpha: u8) {
        let Some(_lock) = self.acquire("line_blend") else {
            return;
        };
        let th = self.ctx.thickness();
        let (ix1, iy1, ix2, iy2) = (x1 as i32, y1 as i32, x2 as i32, y2 as i32);
        match th {
            0 => return,
            1 => {
                if self.ctx.anti_alias() {
                    self.line_aa_raw(ix1, iy1, ix2, iy2, color, alpha);
                } else {
                    self.bresenham_blend(ix1, iy1, ix2, iy2, color, alpha);
                }
            },
            _ => self.line_fn(x1, y1, x2, y2, color, stamp_blend(alpha)),
        }
        self.mark_dirty(stroke_rect(ix1, iy1, ix2, iy2, th));
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::Override;

    const RED: Color = 0xFFFF_0000;

    #[test]
    fn test_line_fn_visits_both_endpoints() {
        let mut s = surface(4, 4);
        let mut ctx = context();
        let mut seen = Vec::new();
        ctx.canvas(&mut s).line_fn(0, 0, 5, 2, RED, |_, x, y, _| seen.push((x, y)));
        assert_eq!(seen.first(), Some(&(0, 0)));
        assert_eq!(seen.last(), Some(&(5, 2)));
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_line_matches_callback_walk() {
        let mut s = surface(20, 20);
        let mut ctx = context();
        let mut walked = Vec::new();
        let mut c = ctx.canvas(&mut s);
        c.line_fn(2, 3, 17, 11, RED, |_, x, y, _| walked.push((x as i32, y as i32)));
        c.line(2, 3, 17, 11, RED);
        walked.sort_by_key(|&(x, y)| (y, x));
        assert_eq!(lit(&s, RED), walked);
    }

    #[test]
    fn test_line_reversed_covers_same_count() {
        let mut a = surface(20, 20);
        let mut b = surface(20, 20);
        let mut ctx = context();
        ctx.canvas(&mut a).line(1, 1, 18, 7, RED);
        ctx.canvas(&mut b).line(18, 7, 1, 1, RED);
        assert_eq!(lit(&a, RED).len(), lit(&b, RED).len());
    }

    #[test]
    fn test_line_outside_draws_nothing() {
        let mut s = surface(10, 10);
        let mut ctx = context();
        ctx.dirty_mut().init(4);
        ctx.dirty_mut().enable(true);
        ctx.canvas(&mut s).line(20, 20, 40, 35, RED);
        assert!(lit(&s, RED).is_empty());
        assert!(ctx.dirty().front().unwrap().is_empty());
    }

    #[test]
    fn test_line_clipped_at_edges() {
        let mut s = surface(10, 10);
        let mut ctx = context();
        ctx.canvas(&mut s).line(-5, 4, 30, 4, RED);
        let pts = lit(&s, RED);
        assert_eq!(pts.len(), 10);
        assert!(pts.iter().all(|&(_, y)| y == 4));
    }

    #[test]
    fn test_hline_thickness_centers() {
        let mut s = surface(10, 10);
        let mut ctx = context();
        let mut scoped = ctx.scoped(Override::Thickness(3));
        scoped.canvas(&mut s).hline(7, 5, 2, RED);
        let pts = lit(&s, RED);
        assert_eq!(pts.len(), 18);
        assert_eq!(pts.first(), Some(&(2, 4)));
        assert_eq!(pts.last(), Some(&(7, 6)));
    }

    #[test]
    fn test_vline_clips() {
        let mut s = surface(10, 10);
        s.set_clip(Rect::new(0, 2, 10, 5));
        let mut ctx = context();
        ctx.canvas(&mut s).vline(3, 0, 9, RED);
        let pts = lit(&s, RED);
        assert_eq!(pts, vec![(3, 2), (3, 3), (3, 4), (3, 5), (3, 6)]);
    }

    #[test]
    fn test_thick_line_is_wider() {
        let mut s = surface(30, 30);
        let mut ctx = context();
        ctx.push_thickness(5);
        ctx.canvas(&mut s).line(5, 15, 25, 15, RED);
        let pts = lit(&s, RED);
        assert!(pts.contains(&(15, 13)));
        assert!(pts.contains(&(15, 17)));
        assert!(!pts.contains(&(15, 18)));
    }

    #[test]
    fn test_stroke_rect() {
        assert_eq!(stroke_rect(5, 1, 2, 4, 1), Rect::new(2, 1, 4, 4));
        assert_eq!(stroke_rect(2, 2, 4, 2, 4), Rect::new(0, 0, 9, 7));
    }
}
