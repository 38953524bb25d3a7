//! Rectangles: outlined, filled and rounded

use super::Canvas;
use crate::rect::Rect;
use crate::surface::{Color, ALPHA_OPAQUE};

fn ordered(a: i16, b: i16) -> (i16, i16) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

impl Canvas<'_> {
    /// Outline at the current thickness. Each side records its own dirty rect.
    pub fn rect(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: Color) {
        match self.ctx.thickness() {
            0 => {},
            1 => {
                self.hline(x1, y1, x2, color);
                self.hline(x1, y2, x2, color);
                self.vline(x1, y1, y2, color);
                self.vline(x2, y1, y2, color);
            },
            _ => {
                self.line(x1, y1, x2, y1, color);
                self.line(x1, y2, x2, y2, color);
                self.line(x1, y1, x1, y2, color);
                self.line(x2, y1, x2, y2, color);
            },
        }
    }

    pub fn rect_blend(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: Color, alpha: u8) {
        match self.ctx.thickness() {
            0 => {},
            1 => {
                self.hline_blend(x1, y1, x2, color, alpha);
                self.hline_blend(x1, y2, x2, color, alpha);
                self.vline_blend(x1, y1, y2, color, alpha);
                self.vline_blend(x2, y1, y2, color, alpha);
            },
            _ => {
                self.line_blend(x1, y1, x2, y1, color, alpha);
                self.line_blend(x1, y2, x2, y2, color, alpha);
                self.line_blend(x1, y1, x1, y2, color, alpha);
                self.line_blend(x2, y1, x2, y2, color, alpha);
            },
        }
    }

    /// Opaque fill between inclusive corners in any order
    pub fn rect_filled(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: Color) {
        let (x1, x2) = ordered(x1, x2);
        let (y1, y2) = ordered(y1, y2);
        let Some(_lock) = self.acquire("rect_filled") else {
            return;
        };
        self.fill_clipped(x1 as i32, y1 as i32, x2 as i32, y2 as i32, color);
        self.mark_dirty_unclipped(Rect::from_corners(x1 as i32, y1 as i32, x2 as i32, y2 as i32));
    }

    /// Blended fill. Stops at the first pixel a color-key replacement refuses.
    pub fn rect_filled_blend(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: Color, alpha: u8) {
        if alpha == ALPHA_OPAQUE {
            self.rect_filled(x1, y1, x2, y2, color);
            return;
        }
        let (x1, x2) = ordered(x1, x2);
        let (y1, y2) = ordered(y1, y2);
        let s = &*self.surface;
        let left = (x1 as i32).max(s.clip_xmin());
        let top = (y1 as i32).max(s.clip_ymin());
        let right = (x2 as i32).min(s.clip_xmax());
        let bottom = (y2 as i32).min(s.clip_ymax());
        if left > right || top > bottom {
            return;
        }
        let Some(_lock) = self.acquire("rect_filled_blend") else {
            return;
        };
        let mode = self.ctx.blend();
        for y in top..=bottom {
            for x in left..=right {
                if !self.surface.blend_raw(x, y, color, alpha, mode) {
                    return;
                }
            }
        }
        drop(_lock);
        self.mark_dirty(Rect::from_corners(left, top, right, bottom));
    }

    // ========================================================================
    // Rounded corners
    // ========================================================================

    /// Rounded outline; straight sides and corner arcs each record a dirty rect
    pub fn rect_round(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, r: f32, color: Color) {
        let ri = r as i16;
        let min_x = x1.min(x2) + ri;
        let max_x = x1.max(x2) - ri;
        let min_y = y1.min(y2) + ri;
        let max_y = y1.max(y2) - ri;
        self.hline(min_x, y1, max_x, color);
        self.hline(min_x, y2, max_x, color);
        self.vline(x1, min_y, max_y, color);
        self.vline(x2, min_y, max_y, color);
        for (cx, cy, from, to) in corner_arcs(min_x, min_y, max_x, max_y) {
            self.arc_degrees(cx, cy, r, from, to, color, None);
        }
    }

    pub fn rect_round_blend(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, r: f32, color: Color, alpha: u8) {
        let Some(_lock) = self.acquire("rect_round_blend") else {
            return;
        };
        let ri = r as i16;
        let min_x = x1.min(x2) + ri + 1;
        let max_x = x1.max(x2) - ri - 1;
        let min_y = y1.min(y2) + ri + 1;
        let max_y = y1.max(y2) - ri - 1;
        self.unlocked(|c| {
            c.hline_blend(min_x, y1, max_x, color, alpha);
            c.hline_blend(min_x, y2, max_x, color, alpha);
            c.vline_blend(x1, min_y, max_y, color, alpha);
            c.vline_blend(x2, min_y, max_y, color, alpha);
            for (cx, cy, from, to) in corner_arcs(min_x, min_y, max_x, max_y) {
                c.arc_degrees(cx, cy, r, from, to, color, Some(alpha));
            }
        });
    }

    pub fn rect_round_filled(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, r: f32, color: Color) {
        let (x1, x2) = ordered(x1, x2);
        let (y1, y2) = ordered(y1, y2);
        let Some(_lock) = self.acquire("rect_round_filled") else {
            return;
        };
        let (x1, y1, x2, y2) = (x1 as i32, y1 as i32, x2 as i32, y2 as i32);
        let ri = r as i32;
        let min_x = x1 + ri + 1;
        let max_x = x2 - ri;
        let min_y = y1 + ri;
        let max_y = y2 - ri - 1;

        // Center, top and bottom bands, then the two side bands
        self.fill_clipped(min_x, min_y, max_x, max_y, color);
        self.fill_clipped(min_x, y1, max_x, y1 + ri, color);
        self.fill_clipped(min_x, y2 - ri, max_x, y2, color);
        self.fill_clipped(x1, min_y, x1 + ri, max_y - 1, color);
        self.fill_clipped(x2 - ri, min_y, x2, max_y - 1, color);

        let corners = [
            (min_x, min_y + 1),
            (max_x - 1, min_y + 1),
            (max_x - 1, max_y),
            (min_x, max_y),
        ];
        self.nested(|c| {
            for (cx, cy) in corners {
                c.circle_filled(cx as i16, cy as i16, r + 1.0, color);
            }
        });
        self.mark_dirty(Rect::from_corners(x1, y1, x2, y2));
    }

    pub fn rect_round_filled_blend(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, r: f32, color: Color, alpha: u8) {
        let (x1, x2) = ordered(x1, x2);
        let (y1, y2) = ordered(y1, y2);
        let Some(_lock) = self.acquire("rect_round_filled_blend") else {
            return;
        };
        let ri = r as i16;
        let min_x = x1 + ri + 1;
        let max_x = x2 - ri - 1;
        let min_y = y1 + ri + 1;
        let max_y = y2 - ri - 1;

        self.nested(|c| {
            c.rect_filled_blend(min_x, min_y, max_x, max_y, color, alpha);
            c.rect_filled_blend(min_x, y1, max_x, y1 + ri, color, alpha);
            c.rect_filled_blend(min_x, y2 - ri, max_x, y2, color, alpha);
            c.rect_filled_blend(x1, min_y - 1, x1 + ri, max_y, color, alpha);
            c.rect_filled_blend(x2 - ri, min_y - 1, x2, max_y, color, alpha);
            for (cx, cy, from, to) in corner_arcs(min_x - 1, min_y - 1, max_x + 1, max_y + 1) {
                c.pie_degrees(cx, cy, r, from, to, color, alpha);
            }
        });
        self.mark_dirty(Rect::from_corners(x1 as i32, y1 as i32, x2 as i32, y2 as i32));
    }
}

/// Corner centers with their quarter sweeps in degrees: UL, UR, LR, LL
fn corner_arcs(min_x: i16, min_y: i16, max_x: i16, max_y: i16) -> [(i16, i16, f32, f32); 4] {
    [
        (min_x, min_y, 180.0, 270.0),
        (max_x, min_y, 270.0, 360.0),
        (max_x, max_y, 0.0, 90.0),
        (min_x, max_y, 90.0, 180.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::surface::BlendMode;

    const C: Color = 0xFF12_3456;
    const BG: Color = 0xFF00_0000;

    #[test]
    fn test_filled_10x10_reads_back() {
        let mut s = surface(20, 20);
        s.fill(BG);
        let mut ctx = context();
        ctx.canvas(&mut s).rect_filled(14, 14, 5, 5, C);
        for y in 0..20 {
            for x in 0..20 {
                let inside = (5..=14).contains(&x) && (5..=14).contains(&y);
                let expect = if inside { C } else { BG };
                assert_eq!(s.read_raw(x, y), expect, "({x},{y})");
            }
        }
    }

    #[test]
    fn test_filled_blend_half() {
        let mut s = surface(4, 4);
        s.fill(0xFF20_4060);
        let mut ctx = context();
        ctx.push_blend(BlendMode::DestAlpha);
        ctx.canvas(&mut s).rect_filled_blend(0, 0, 1, 1, 0xFFA0_C0E0, 128);
        // 0x20 + (0xA0 - 0x20) * 128 / 256 = 0x60
        assert_eq!(s.read_raw(1, 1), 0xFF60_80A0);
        assert_eq!(s.read_raw(2, 2), 0xFF20_4060);
    }

    #[test]
    fn test_filled_blend_colorkey_stops_at_foreign_pixel() {
        let mut s = surface(4, 1);
        let key = 0xFF00_FF00;
        s.fill(key);
        s.set_colorkey(Some(key));
        s.write_raw(1, 0, BG);
        let mut ctx = context();
        ctx.push_blend(BlendMode::ReplaceColorkey);
        ctx.canvas(&mut s).rect_filled_blend(0, 0, 3, 0, C, 100);
        assert_ne!(s.read_raw(0, 0), key);
        assert_eq!(s.read_raw(1, 0), BG);
        assert_eq!(s.read_raw(2, 0), key);
    }

    #[test]
    fn test_filled_blend_outside_records_nothing() {
        let mut s = surface(8, 8);
        let mut ctx = context();
        ctx.dirty_mut().init(4);
        ctx.dirty_mut().enable(true);
        ctx.canvas(&mut s).rect_filled_blend(20, 20, 30, 30, C, 10);
        assert!(ctx.dirty().front().unwrap().is_empty());
    }

    #[test]
    fn test_outline_leaves_interior() {
        let mut s = surface(10, 10);
        let mut ctx = context();
        ctx.canvas(&mut s).rect(2, 2, 7, 6, C);
        let pts = lit(&s, C);
        assert_eq!(pts.len(), 2 * 6 + 2 * 3);
        assert!(!pts.contains(&(4, 4)));
    }

    #[test]
    fn test_round_filled_stays_in_bounds() {
        let mut s = surface(40, 40);
        let mut ctx = context();
        ctx.canvas(&mut s).rect_round_filled(5, 5, 30, 25, 4.0, C);
        let pts = lit(&s, C);
        assert!(pts.contains(&(17, 15)));
        assert!(pts.contains(&(5, 15)));
        assert!(pts.contains(&(17, 5)));
        assert!(!pts.contains(&(5, 5)));
        assert!(pts.iter().all(|&(x, y)| (5..=30).contains(&x) && (5..=25).contains(&y)));
    }

    #[test]
    fn test_round_outline_draws_corner_arcs() {
        let mut s = surface(40, 40);
        let mut ctx = context();
        ctx.canvas(&mut s).rect_round(5, 5, 30, 25, 5.0, C);
        let pts = lit(&s, C);
        assert!(pts.contains(&(17, 5)));
        assert!(pts.contains(&(5, 15)));
        assert!(!pts.contains(&(5, 5)));
        assert!(pts.iter().any(|&(x, y)| x < 10 && y < 10));
    }
}
