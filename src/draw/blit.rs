//! Blend-blit of one surface onto another

use super::Canvas;
use crate::rect::Rect;
use crate::surface::Surface;

/// Clip a blit of `srect` from `src` onto `drect` in `dst`.
///
/// A missing `srect` means the whole source; a missing `drect` places the
/// copy at the origin. Only the destination's x and y are read. The source
/// rect is cut to the source bounds (a negative origin shifts the
/// destination along with it), then both are cut to the destination clip
/// rectangle. Returns the matching `(source, destination)` pair, or `None`
/// when nothing is left.
pub fn blit_clip(src: &Surface, srect: Option<Rect>, dst: &Surface, drect: Option<Rect>) -> Option<(Rect, Rect)> {
    let s = srect.unwrap_or_else(|| src.bounds());
    let (mut sx, mut sy) = (s.x as i32, s.y as i32);
    let (mut w, mut h) = (s.w as i32, s.h as i32);
    let (mut dx, mut dy) = drect.map_or((0, 0), |d| (d.x as i32, d.y as i32));

    if sx < 0 {
        w += sx;
        dx -= sx;
        sx = 0;
    }
    w = w.min(src.width() as i32 - sx);
    if sy < 0 {
        h += sy;
        dy -= sy;
        sy = 0;
    }
    h = h.min(src.height() as i32 - sy);

    let (cx, cy) = (dst.clip_xmin(), dst.clip_ymin());
    let (cx2, cy2) = (dst.clip_xmax() + 1, dst.clip_ymax() + 1);
    let d = cx - dx;
    if d > 0 {
        w -= d;
        sx += d;
        dx = cx;
    }
    w = w.min(cx2 - dx);
    let d = cy - dy;
    if d > 0 {
        h -= d;
        sy += d;
        dy = cy;
    }
    h = h.min(cy2 - dy);

    if w <= 0 || h <= 0 {
        return None;
    }
    Some((Rect::new(sx, sy, w, h), Rect::new(dx, dy, w, h)))
}

impl Canvas<'_> {
    /// Blend `srect` of `source` onto this surface at `drect` under the
    /// current blend mode. Each source pixel's own alpha is used, scaled by
    /// the source's surface alpha when surface alpha is on. Pixels matching
    /// the source's color key are skipped. Returns the destination rect
    /// actually touched, empty when clipping removed everything.
    pub fn blend_blit(&mut self, source: &Surface, srect: Option<Rect>, drect: Option<Rect>) -> Rect {
        let Some((s, d)) = blit_clip(source, srect, self.surface, drect) else {
            return Rect::default();
        };
        let Some(_lock) = self.acquire("blend_blit") else {
            return Rect::default();
        };
        let Some(_src_lock) = self.acquire_source(source, "blend_blit") else {
            return Rect::default();
        };

        let scale = self.ctx.surface_alpha().then(|| source.alpha() as f32 / 255.0);
        let key = source.colorkey();

        'rows: for row in 0..d.h as i32 {
            for col in 0..d.w as i32 {
                let raw = source.read_raw(s.x as i32 + col, s.y as i32 + row);
                if key == Some(raw) {
                    continue;
                }
                let (r, g, b, a) = source.get_rgba(raw);
                let a = match scale {
                    Some(k) => (a as f32 * k) as u8,
                    None => a,
                };
                let color = self.surface.map_rgb(r, g, b);
                if !self.plot_blend(d.x as i32 + col, d.y as i32 + row, color, a) {
                    break 'rows;
                }
            }
        }

        drop(_src_lock);
        drop(_lock);
        self.mark_dirty(d);
        d
    }
}
