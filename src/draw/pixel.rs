//! Single pixels, pixel patterns and the thickness stamp

use super::Canvas;
use crate::rect::Rect;
use crate::surface::{Color, ALPHA_OPAQUE};

/// Stamp a filled disk of the current thickness at (x, y)
pub(crate) fn stamp(c: &mut Canvas<'_>, x: i16, y: i16, color: Color) {
    let th = c.ctx.thickness();
    if th > 0 {
        let r = (th - 1) as f32 / 2.0;
        c.nested(|c| c.circle_filled(x, y, r, color));
    }
}

/// Blended counterpart of [`stamp`]
pub(crate) fn stamp_blend(alpha: u8) -> impl FnMut(&mut Canvas<'_>, i16, i16, Color) {
    move |c: &mut Canvas<'_>, x: i16, y: i16, color: Color| {
        let th = c.ctx.thickness();
        if th > 0 {
            let r = (th - 1) as f32 / 2.0;
            c.nested(|c| c.circle_filled_blend(x, y, r, color, alpha));
        }
    }
}

/// Plot callback blending every point at a fixed alpha
pub(crate) fn plot_alpha(alpha: u8) -> impl FnMut(&mut Canvas<'_>, i16, i16, Color) {
    move |c: &mut Canvas<'_>, x: i16, y: i16, color: Color| {
        c.plot_blend(x as i32, y as i32, color, alpha);
    }
}

/// Dirty rect of a single point at thickness `th`
fn point_rect(x: i16, y: i16, th: u16) -> Rect {
    if th == 1 {
        Rect::new(x as i32, y as i32, 1, 1)
    } else {
        let w = th as i32;
        Rect::new(x as i32 - w / 2, y as i32 - w / 2, w, w)
    }
}

impl Canvas<'_> {
    /// Set one pixel, or stamp a disk when thickness > 1
    pub fn pixel(&mut self, x: i16, y: i16, color: Color) {
        let Some(_lock) = self.acquire("pixel") else {
            return;
        };
        let th = self.ctx.thickness();
        match th {
            0 => return,
            1 => self.plot(x as i32, y as i32, color),
            _ => stamp(self, x, y, color),
        }
        self.mark_dirty(point_rect(x, y, th));
    }

    /// Blend one pixel under the current blend mode
    pub fn pixel_blend(&mut self, x: i16, y: i16, color: Color, alpha: u8) {
        let Some(_lock) = self.acquire("pixel_blend") else {
            return;
        };
        let th = self.ctx.thickness();
        match th {
            0 => return,
            1 => {
                self.plot_blend(x as i32, y as i32, color, alpha);
            },
            _ => stamp_blend(alpha)(self, x, y, color),
        }
        self.mark_dirty(point_rect(x, y, th));
    }

    /// Write `colors[i]` wherever `pattern[i]` is set, row-major over `target`.
    /// Stops at the end of the shortest slice.
    pub fn pixel_pattern(&mut self, target: Rect, pattern: &[bool], colors: &[Color]) {
        let Some(_lock) = self.acquire("pixel_pattern") else {
            return;
        };
        for (x, y, (&on, &color)) in pattern_cells(target, pattern.iter().zip(colors)) {
            if on {
                self.plot(x, y, color);
            }
        }
        drop(_lock);
        self.mark_dirty(target);
    }

    /// Blended pattern with one alpha per cell. Opaque cells are copied as is.
    pub fn pixel_pattern_blend(&mut self, target: Rect, pattern: &[bool], colors: &[Color], alphas: &[u8]) {
        let Some(_lock) = self.acquire("pixel_pattern_blend") else {
            return;
        };
        let cells = pattern.iter().zip(colors.iter().zip(alphas));
        for (x, y, (&on, (&color, &alpha))) in pattern_cells(target, cells) {
            if !on {
                continue;
            }
            if alpha == ALPHA_OPAQUE {
                self.plot(x, y, color);
            } else if !self.plot_blend(x, y, color, alpha) {
                // Colorkey replacement hit a foreign pixel
                return;
            }
        }
        drop(_lock);
        self.mark_dirty(target);
    }
}

/// Pair each item with its cell coordinate inside `target`
fn pattern_cells<I: Iterator>(target: Rect, items: I) -> impl Iterator<Item = (i32, i32, I::Item)> {
    let w = (target.w as usize).max(1);
    let cells = target.w as usize * target.h as usize;
    items.take(cells).enumerate().map(move |(i, item)| {
        let x = target.x as i32 + (i % w) as i32;
        let y = target.y as i32 + (i / w) as i32;
        (x, y, item)
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::Override;
    use crate::surface::BlendMode;

    const WHITE: Color = 0xFFFF_FFFF;

    #[test]
    fn test_pixel_respects_clip() {
        let mut s = surface(8, 8);
        s.set_clip(Rect::new(0, 0, 4, 4));
        let mut ctx = context();
        let mut c = ctx.canvas(&mut s);
        c.pixel(2, 2, WHITE);
        c.pixel(6, 6, WHITE);
        c.pixel(-1, 0, WHITE);
        assert_eq!(lit(&s, WHITE), vec![(2, 2)]);
    }

    #[test]
    fn test_pixel_twice_is_idempotent() {
        let mut s = surface(4, 4);
        let mut ctx = context();
        ctx.canvas(&mut s).pixel(1, 1, WHITE);
        let once = s.pixels().to_vec();
        ctx.canvas(&mut s).pixel(1, 1, WHITE);
        assert_eq!(s.pixels(), &once[..]);
    }

    #[test]
    fn test_thick_pixel_stamps_disk() {
        let mut s = surface(16, 16);
        let mut ctx = context();
        {
            let mut scoped = ctx.scoped(Override::Thickness(5));
            scoped.canvas(&mut s).pixel(8, 8, WHITE);
        }
        let pts = lit(&s, WHITE);
        assert!(pts.contains(&(8, 8)));
        assert!(pts.contains(&(10, 8)));
        assert!(pts.contains(&(8, 6)));
        assert!(!pts.contains(&(11, 8)));
        assert!(!pts.contains(&(10, 10)));
    }

    #[test]
    fn test_zero_thickness_draws_nothing() {
        let mut s = surface(4, 4);
        let mut ctx = context();
        ctx.push_thickness(0);
        ctx.canvas(&mut s).pixel(1, 1, WHITE);
        assert!(lit(&s, WHITE).is_empty());
    }

    #[test]
    fn test_pixel_blend_half() {
        let mut s = surface(2, 2);
        s.write_raw(0, 0, 0xFF00_0000);
        let mut ctx = context();
        ctx.push_blend(BlendMode::DestAlpha);
        ctx.canvas(&mut s).pixel_blend(0, 0, 0xFFC8_6432, 128);
        // channel = d + (s - d) * 128 >> 8
        assert_eq!(s.read_raw(0, 0), 0xFF64_3219);
    }

    #[test]
    fn test_pattern_rows() {
        let mut s = surface(6, 6);
        let mut ctx = context();
        let pattern = [true, false, true, false, true, false];
        let colors = [WHITE; 6];
        ctx.canvas(&mut s).pixel_pattern(Rect::new(1, 1, 3, 2), &pattern, &colors);
        assert_eq!(lit(&s, WHITE), vec![(1, 1), (3, 1), (2, 2)]);
    }

    #[test]
    fn test_pattern_blend_copies_opaque_cells() {
        let mut s = surface(4, 1);
        let mut ctx = context();
        let colors = [0x8011_2233, 0x8011_2233];
        ctx.canvas(&mut s).pixel_pattern_blend(Rect::new(0, 0, 2, 1), &[true, true], &colors, &[255, 0]);
        assert_eq!(s.read_raw(0, 0), 0x8011_2233);
        assert_eq!(s.read_raw(1, 0) & 0x00FF_FFFF, 0);
    }

    #[test]
    fn test_dirty_rect_for_pixel() {
        let mut s = surface(8, 8);
        let mut ctx = context();
        ctx.dirty_mut().init(4);
        ctx.dirty_mut().enable(true);
        ctx.canvas(&mut s).pixel(3, 4, WHITE);
        let front = ctx.dirty().front().unwrap();
        assert_eq!(front.rects(), &[Rect::new(3, 4, 1, 1)]);
    }
}
