//! Affine surface transform
//!
//! Rotation and scaling by inverse mapping: every destination pixel inside
//! the transformed bounding box is stepped back into source space in 18.13
//! fixed point, anchored on its top-left corner, and the source is sampled
//! there (nearest or bilinear). Equal formats copy or mix raw packed values;
//! anything else goes through RGBA. A texture-mapped quad path trades
//! resampling quality for speed.

use bitflags::bitflags;
use log::debug;

use crate::config::Context;
use crate::draw::Canvas;
use crate::error::RasterError;
use crate::rect::{Point, Rect};
use crate::surface::{Color, Surface};

bitflags! {
    /// Sampling and path selection for [`Canvas::transform`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TransformFlags: u8 {
        /// Bilinear interpolation of the four nearest source pixels
        const AA = 0x1;
        /// Always convert through RGBA, even between equal formats
        const SAFE = 0x2;
        /// Draw as a texture-mapped quad instead of sampling per pixel
        const TMAP = 0x4;
        /// Leave destination pixels alone where the source holds its color key
        const COLORKEY = 0x8;
    }
}

const FIXED_SHIFT: u32 = 13;
const FIXED_ONE: f64 = 8192.0;
/// Cosine terms of the bounding box use a slightly larger unit
const BOX_COS_ONE: f64 = 8192.2;
const FRACTION: i64 = 0x1FFF;
const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Largest inverse scale that keeps 18.13 products inside 31 bits
const MAX_INVERSE: f32 = 262_144.0;

/// Keep `8192 / scale` within `±MAX_INVERSE`
fn clamp_scale(scale: f32) -> f32 {
    let inverse = FIXED_ONE as f32 / scale;
    if inverse > MAX_INVERSE {
        FIXED_ONE as f32 / MAX_INVERSE
    } else if inverse < -MAX_INVERSE {
        -(FIXED_ONE as f32) / MAX_INVERSE
    } else {
        scale
    }
}

/// User angle in radians, rounded through `f32`
fn radians(ctx: &Context, angle: f32) -> f32 {
    if ctx.radians() {
        angle
    } else {
        (f64::from(angle) * DEG_TO_RAD) as f32
    }
}

/// Sine and cosine, exact at whole quarter turns
fn sin_cos(theta: f32) -> (f64, f64) {
    let quarters = f64::from(theta) / std::f64::consts::FRAC_PI_2;
    let q = quarters.round();
    if (quarters - q).abs() < 1e-6 {
        return match (q as i64).rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        };
    }
    f64::from(theta).sin_cos()
}

/// Inclusive destination box of the source clip corners mapped forward
/// about `pivot` onto `anchor`, widened by one pixel on every side
fn bounds(source: &Surface, theta: f32, xscale: f32, yscale: f32, pivot: Point, anchor: (i32, i32)) -> (i32, i32, i32, i32) {
    let (sin, cos) = sin_cos(theta);
    let (xs, ys) = (f64::from(xscale), f64::from(yscale));
    let istx = (sin * xs * FIXED_ONE) as i64;
    let ictx = (cos * xs * BOX_COS_ONE) as i64;
    let isty = (sin * ys * FIXED_ONE) as i64;
    let icty = (cos * ys * BOX_COS_ONE) as i64;

    let (x0, x1) = (source.clip_xmin(), source.clip_xmax());
    let (y0, y1) = (source.clip_ymin(), source.clip_ymax());
    let (mut lo, mut hi) = ((i32::MAX, i32::MAX), (i32::MIN, i32::MIN));
    for (cx, cy) in [(x0, y0), (x1, y1), (x0, y1), (x1, y0)] {
        let rx = i64::from(cx - i32::from(pivot.x));
        let ry = i64::from(cy - i32::from(pivot.y));
        let x = (((ictx * rx - isty * ry) >> FIXED_SHIFT) + i64::from(anchor.0)) as i16 as i32;
        let y = (((icty * ry + istx * rx) >> FIXED_SHIFT) + i64::from(anchor.1)) as i16 as i32;
        lo = (lo.0.min(x), lo.1.min(y));
        hi = (hi.0.max(x), hi.1.max(y));
    }
    (lo.0 - 1, lo.1 - 1, hi.0 + 1, hi.1 + 1)
}

/// Inverse map in 18.13 fixed point
#[derive(Debug, Clone, Copy)]
struct Inverse {
    stx: i64,
    ctx: i64,
    sty: i64,
    cty: i64,
    mx: i64,
    my: i64,
}

impl Inverse {
    fn new(theta: f32, xscale: f32, yscale: f32, pivot: Point) -> Self {
        let (sin, cos) = sin_cos(theta);
        let (xs, ys) = (f64::from(xscale), f64::from(yscale));
        Self {
            stx: (sin / xs * FIXED_ONE) as i64,
            ctx: (cos / xs * FIXED_ONE) as i64,
            sty: (sin / ys * FIXED_ONE) as i64,
            cty: (cos / ys * FIXED_ONE) as i64,
            mx: i64::from(pivot.x) << FIXED_SHIFT,
            my: i64::from(pivot.y) << FIXED_SHIFT,
        }
    }

    /// Source position of the corner of destination pixel (dx, dy), as
    /// offsets from the anchor
    fn at(&self, dx: i32, dy: i32) -> (i64, i64) {
        let (dx, dy) = (i64::from(dx), i64::from(dy));
        (self.ctx * dx + self.stx * dy + self.mx, self.cty * dy - self.sty * dx + self.my)
    }
}

/// Integer part of an 18.13 coordinate, wrapped to 16 bits
#[inline]
fn whole(v: i64) -> i32 {
    (v >> FIXED_SHIFT) as i16 as i32
}

/// One sampling pass over a destination box
struct Pass<'s> {
    source: &'s Surface,
    inverse: Inverse,
    anchor: (i32, i32),
    area: (i32, i32, i32, i32),
    raw: bool,
    key: Option<Color>,
}

impl Pass<'_> {
    /// Step the inverse map over rows `y0..y_end` and columns `x0..x_end`
    fn walk(&self, dst: &mut Surface, x_end: i32, y_end: i32, mut visit: impl FnMut(&mut Surface, i32, i32, i64, i64)) {
        let (x0, y0, ..) = self.area;
        for y in y0..y_end {
            let (mut sx, mut sy) = self.inverse.at(x0 - self.anchor.0, y - self.anchor.1);
            for x in x0..x_end {
                visit(dst, x, y, sx, sy);
                sx += self.inverse.ctx;
                sy -= self.inverse.sty;
            }
        }
    }

    /// Nearest sampling. The source row is taken one below the mapped
    /// position, and one column past the clip's right edge is accepted and
    /// repeats that edge.
    fn nearest(&self, dst: &mut Surface) {
        let s = self.source;
        let (sxmin, sxmax, symin, symax) = (s.clip_xmin(), s.clip_xmax(), s.clip_ymin(), s.clip_ymax());
        let (.., x1, y1) = self.area;
        self.walk(dst, x1 + 1, y1 + 1, |dst, x, y, sx, sy| {
            let (rx, ry) = (whole(sx), whole(sy) + 1);
            if rx < sxmin || rx > sxmax + 1 || ry < symin || ry > symax {
                return;
            }
            let c = s.read_raw(rx.min(sxmax), ry);
            if self.raw {
                if self.key != Some(c) {
                    dst.write_raw(x, y, c);
                }
                return;
            }
            let (r, g, b, a) = s.get_rgba(c);
            if self.key != Some(s.map_rgb(r, g, b)) {
                dst.write_raw(x, y, dst.map_rgba(r, g, b, a));
            }
        });
    }

    /// Bilinear sampling of the 2x2 block at the mapped position. The last
    /// row and column of the box are left alone.
    fn bilinear(&self, dst: &mut Surface) {
        let s = self.source;
        let (sxmin, sxmax, symin, symax) = (s.clip_xmin(), s.clip_xmax(), s.clip_ymin(), s.clip_ymax());
        let raw = self.raw && !s.format().is_indexed();
        let (.., x1, y1) = self.area;
        self.walk(dst, x1, y1, |dst, x, y, sx, sy| {
            let (rx, ry) = (whole(sx), whole(sy));
            if rx < sxmin || rx + 1 > sxmax || ry < symin || ry + 1 > symax {
                return;
            }
            let texels = [s.read_raw(rx, ry), s.read_raw(rx + 1, ry), s.read_raw(rx, ry + 1), s.read_raw(rx + 1, ry + 1)];
            if raw {
                if self.key == Some(texels[0]) {
                    return;
                }
                let w = weights((sx & FRACTION) >> 8, (sy & FRACTION) >> 8, 32);
                dst.write_raw(x, y, mix_raw(s, texels, w));
            } else {
                let w = weights((sx & FRACTION) >> 2, (sy & FRACTION) >> 2, 2048);
                let (r, g, b, a) = mix_rgba(s, texels, w);
                if self.key != Some(s.map_rgb(r, g, b)) {
                    dst.write_raw(x, y, dst.map_rgba(r, g, b, a));
                }
            }
        });
    }
}

/// Distance-approximated weights for the 2x2 block, summing to `4 * one`
fn weights(wx: i64, wy: i64, one: i64) -> [u64; 4] {
    [2 * one - wx - wy, wx + one - wy, one - wx + wy, wx + wy].map(|w| w as u64)
}

/// Weighted average of packed pixels, one masked field at a time; the
/// weights sum to 128
fn mix_raw(s: &Surface, texels: [Color; 4], weights: [u64; 4]) -> Color {
    let fmt = s.format();
    let mut out = 0;
    for mask in [fmt.r.mask, fmt.g.mask, fmt.b.mask, fmt.a.mask] {
        if mask == 0 {
            continue;
        }
        let sum: u64 = texels.iter().zip(weights).map(|(&c, w)| u64::from(c & mask) * w).sum();
        out |= ((sum >> 7) as u32) & mask;
    }
    out
}

/// Weighted average of unpacked channels; the weights sum to 8192
fn mix_rgba(s: &Surface, texels: [Color; 4], weights: [u64; 4]) -> (u8, u8, u8, u8) {
    let mut acc = [0u64; 4];
    for (&c, w) in texels.iter().zip(weights) {
        let (r, g, b, a) = s.get_rgba(c);
        for (slot, v) in acc.iter_mut().zip([r, g, b, a]) {
            *slot += u64::from(v) * w;
        }
    }
    let ch = |i: usize| (acc[i] >> FIXED_SHIFT) as u8;
    (ch(0), ch(1), ch(2), ch(3))
}

impl Canvas<'_> {
    /// Draw `source` rotated by `angle` (context units) and scaled, with
    /// source point `pivot` landing one row below `dest`. Returns the
    /// destination box that was visited, clipped; empty when either scale
    /// is zero. With [`TransformFlags::TMAP`] the source clip rectangle is
    /// centered there instead and `pivot` is unused.
    pub fn transform(
        &mut self,
        source: &Surface,
        angle: f32,
        xscale: f32,
        yscale: f32,
        pivot: Point,
        dest: Point,
        flags: TransformFlags,
    ) -> Rect {
        if xscale == 0.0 || yscale == 0.0 || source.clip_rect().is_empty() {
            return Rect::default();
        }
        let Some(_lock) = self.acquire("transform") else {
            return Rect::default();
        };
        let Some(_src_lock) = self.acquire_source(source, "transform") else {
            return Rect::default();
        };
        let anchor = (i32::from(dest.x), i32::from(dest.y) + 1);

        let rect = if flags.contains(TransformFlags::TMAP) {
            self.transform_tmap(source, angle, xscale, yscale, anchor)
        } else {
            let theta = radians(self.context(), angle);
            let (xscale, yscale) = (clamp_scale(xscale), clamp_scale(yscale));
            let dst = self.surface();
            let (x0, y0, x1, y1) = bounds(source, theta, xscale, yscale, pivot, anchor);
            let area = (
                x0.max(dst.clip_xmin()),
                y0.max(dst.clip_ymin()),
                x1.min(dst.clip_xmax()),
                y1.min(dst.clip_ymax()),
            );
            let bpp = source.bytes_per_pixel();
            let pass = Pass {
                source,
                inverse: Inverse::new(theta, xscale, yscale, pivot),
                anchor,
                area,
                raw: !flags.contains(TransformFlags::SAFE) && bpp != 3 && source.format() == dst.format(),
                key: source.colorkey().filter(|_| flags.contains(TransformFlags::COLORKEY)),
            };
            if flags.contains(TransformFlags::AA) {
                pass.bilinear(self.surface_mut());
            } else {
                pass.nearest(self.surface_mut());
            }
            Rect::new(area.0, area.1, area.2 - area.0 + 1, area.3 - area.1 + 1)
        };

        drop(_src_lock);
        drop(_lock);
        self.mark_dirty(rect);
        rect
    }

    /// Map the source clip rectangle, centered on `anchor`, onto its
    /// transformed corners with a textured quad
    fn transform_tmap(&mut self, source: &Surface, angle: f32, xscale: f32, yscale: f32, anchor: (i32, i32)) -> Rect {
        let (x0, y0, x1, y1) = (source.clip_xmin(), source.clip_ymin(), source.clip_xmax(), source.clip_ymax());
        let (a, b) = ((x1 - x0) as f32 / 2.0, (y1 - y0) as f32 / 2.0);
        let (sin, cos) = tmap_sin_cos(self.context(), angle);
        let (acos, bcos) = (a * cos * xscale, b * cos * yscale);
        let (asin, bsin) = (a * sin * xscale, b * sin * yscale);
        let (qx, qy) = (anchor.0 as f32, anchor.1 as f32);

        // Perimeter order: top-left, top-right, bottom-right, bottom-left
        let quad = [
            (-acos + bsin, -asin - bcos),
            (acos + bsin, asin - bcos),
            (acos - bsin, asin + bcos),
            (-acos - bsin, -asin + bcos),
        ]
        .map(|(x, y)| Point::new((x + qx) as i16, (y + qy) as i16));
        let tex = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)].map(|(x, y)| Point::new(x as i16, y as i16));
        self.nested(|c| c.quad_tex(quad, source, tex));

        let xs = quad.map(|p| i32::from(p.x));
        let ys = quad.map(|p| i32::from(p.y));
        let min = |v: [i32; 4]| v.into_iter().min().unwrap_or(0);
        let max = |v: [i32; 4]| v.into_iter().max().unwrap_or(0);
        Rect::from_corners(min(xs), min(ys), max(xs), max(ys))
    }
}

/// Sine and cosine for the quad path, exact at whole quarter turns in degrees
fn tmap_sin_cos(ctx: &Context, angle: f32) -> (f32, f32) {
    if !ctx.radians() {
        let exact = [(0.0, (0.0, 1.0)), (90.0, (1.0, 0.0)), (180.0, (0.0, -1.0)), (270.0, (-1.0, 0.0)), (360.0, (0.0, 1.0))];
        if let Some(&(_, sc)) = exact.iter().find(|(deg, _)| *deg == angle) {
            return sc;
        }
    } else if angle == 0.0 {
        return (0.0, 1.0);
    }
    let theta = f64::from(radians(ctx, angle));
    (theta.sin() as f32, theta.cos() as f32)
}

/// Run `f` with dirty tracking off, for drawing into fresh surfaces
fn without_dirty<R>(ctx: &mut Context, f: impl FnOnce(&mut Context) -> R) -> R {
    let enabled = ctx.dirty().enabled();
    ctx.dirty_mut().enable(false);
    let out = f(ctx);
    ctx.dirty_mut().enable(enabled);
    out
}

/// Transform `source` into a new surface sized to the padded bounding box
/// of the result, filled with `bg` first. The new surface has the source's
/// format, color key and surface alpha.
pub fn transform_surface(
    ctx: &mut Context,
    source: &Surface,
    bg: Color,
    angle: f32,
    xscale: f32,
    yscale: f32,
    flags: TransformFlags,
) -> Result<Surface, RasterError> {
    if xscale == 0.0 || yscale == 0.0 {
        return Err(RasterError::InvalidScale { x: xscale, y: yscale });
    }
    let theta = radians(ctx, angle);
    let (x0, y0, x1, y1) = bounds(source, theta, xscale, yscale, Point::default(), (0, 0));
    let (w, h) = ((x1 - x0 + 1).max(0) as u32, (y1 - y0 + 1).max(0) as u32);
    let mut out = Surface::new_like(source, w, h)?;
    out.fill(bg);
    debug!("transform_surface: {}x{} -> {}x{}", source.width(), source.height(), w, h);

    let anchor = Point::new(-x0 as i16, -y0 as i16);
    without_dirty(ctx, |ctx| {
        ctx.canvas(&mut out)
            .transform(source, angle, xscale, yscale, Point::default(), anchor, flags);
    });
    Ok(out)
}

/// Rotate `source` about its center into a new square surface of side
/// `ceil(sqrt(w²/2 + h²/2)) + 1`, filled with `bg` first
pub fn rotate_surface(ctx: &mut Context, source: &Surface, angle: f32, bg: Color, aa: bool) -> Result<Surface, RasterError> {
    let (w, h) = (f64::from(source.width()), f64::from(source.height()));
    let side = ((w * w + h * h) / 2.0).sqrt().ceil() as u32 + 1;
    let mut out = Surface::new_like(source, side, side)?;
    out.fill(bg);

    let flags = if aa { TransformFlags::AA } else { TransformFlags::empty() };
    let pivot = Point::new((source.width() / 2) as i16, (source.height() / 2) as i16);
    let center = Point::new((side / 2) as i16, (side / 2) as i16);
    without_dirty(ctx, |ctx| {
        ctx.canvas(&mut out).transform(source, angle, 1.0, 1.0, pivot, center, flags);
    });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{LockHook, PixelFormat};

    fn surface(w: u32, h: u32) -> Surface {
        Surface::new(w, h, PixelFormat::argb8888()).unwrap()
    }

    /// Every pixel a distinct opaque color
    fn numbered(w: u32, h: u32) -> Surface {
        let mut s = surface(w, h);
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                s.write_raw(x, y, 0xFF00_0000 | (x as u32) << 8 | y as u32 | 0x0080_0000);
            }
        }
        s
    }

    fn count(s: &Surface, color: Color) -> usize {
        let mut n = 0;
        for y in 0..s.height() as i32 {
            for x in 0..s.width() as i32 {
                if s.read_raw(x, y) == color {
                    n += 1;
                }
            }
        }
        n
    }

    const RED: Color = 0xFFFF_0000;

    #[test]
    fn test_scale_clamped_to_fixed_range() {
        assert_eq!(clamp_scale(1.0), 1.0);
        assert_eq!(clamp_scale(1e-9), 1.0 / 32.0);
        assert_eq!(clamp_scale(-1e-9), -1.0 / 32.0);
    }

    #[test]
    fn test_quarter_turns_are_exact() {
        assert_eq!(sin_cos(std::f32::consts::FRAC_PI_2), (1.0, 0.0));
        assert_eq!(sin_cos(std::f32::consts::PI), (0.0, -1.0));
        assert_eq!(sin_cos(-std::f32::consts::FRAC_PI_2), (-1.0, 0.0));
        let (s, c) = sin_cos(0.5);
        assert_eq!((s, c), 0.5f64.sin_cos());
    }

    #[test]
    fn test_quarter_turn_moves_every_pixel() {
        let src = numbered(8, 8);
        let mut dst = surface(16, 16);
        let mut ctx = Context::new();
        let c = Point::new(4, 4);
        ctx.canvas(&mut dst).transform(&src, 90.0, 1.0, 1.0, c, Point::new(8, 8), TransformFlags::empty());
        for j in 0..8 {
            for i in 0..8 {
                assert_eq!(dst.read_raw(6 + i, 5 + j), src.read_raw(j, 7 - i), "at ({i}, {j})");
            }
        }
        // Only the repeated edge row sits outside the 8x8 block
        assert_eq!(16 * 16 - count(&dst, 0), 72);
        assert_eq!(dst.read_raw(6, 4), 0);
        assert_eq!(dst.read_raw(5, 5), 0);
    }

    #[test]
    fn test_bounds_pad_the_mapped_corners() {
        let src = surface(6, 4);
        assert_eq!(bounds(&src, 0.0, 1.0, 1.0, Point::default(), (0, 0)), (-1, -1, 6, 4));
        assert_eq!(bounds(&src, 0.0, 2.0, 1.0, Point::new(1, 1), (10, 10)), (7, 8, 19, 13));
    }

    #[test]
    fn test_identity_copies_one_row_down_with_edge_column() {
        let src = numbered(4, 3);
        let mut dst = surface(16, 16);
        let mut ctx = Context::new();
        let r = ctx
            .canvas(&mut dst)
            .transform(&src, 0.0, 1.0, 1.0, Point::new(0, 0), Point::new(5, 3), TransformFlags::empty());
        assert_eq!(r, Rect::new(4, 3, 6, 5));
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(dst.read_raw(x + 5, y + 3), src.read_raw(x, y));
            }
            // The column past the right edge repeats it
            assert_eq!(dst.read_raw(9, y + 3), src.read_raw(3, y));
        }
        assert_eq!(dst.read_raw(4, 3), 0);
        assert_eq!(dst.read_raw(10, 3), 0);
        assert_eq!(dst.read_raw(5, 2), 0);
        assert_eq!(dst.read_raw(5, 6), 0);
    }

    #[test]
    fn test_rotated_and_scaled_matches_fixed_point_stepping() {
        let src = numbered(5, 4);
        let mut dst = surface(24, 24);
        let mut ctx = Context::new();
        let r = ctx
            .canvas(&mut dst)
            .transform(&src, 30.0, 1.5, 1.5, Point::new(2, 2), Point::new(10, 10), TransformFlags::empty());
        assert_eq!(r, Rect::new(5, 5, 11, 10));
        assert_eq!(24 * 24 - count(&dst, 0), 50);

        let at = |x: i32, y: i32| src.read_raw(x, y);
        let row7 = [(9, at(0, 1)), (10, at(0, 0)), (11, at(1, 0)), (12, at(1, 0))];
        for (x, c) in row7 {
            assert_eq!(dst.read_raw(x, 7), c, "at ({x}, 7)");
        }
        assert_eq!(dst.read_raw(8, 7), 0);
        assert_eq!(dst.read_raw(13, 7), 0);

        let row11 = [
            (7, at(0, 3)),
            (8, at(0, 3)),
            (9, at(1, 3)),
            (10, at(2, 3)),
            (11, at(2, 2)),
            (12, at(3, 2)),
            (13, at(3, 2)),
            (14, at(4, 1)),
            (15, at(4, 1)),
        ];
        for (x, c) in row11 {
            assert_eq!(dst.read_raw(x, 11), c, "at ({x}, 11)");
        }
        assert_eq!(dst.read_raw(6, 11), 0);
        assert_eq!(dst.read_raw(16, 11), 0);
    }

    #[test]
    fn test_doubling_scale_repeats_pixels() {
        let src = numbered(2, 2);
        let mut dst = surface(8, 8);
        let mut ctx = Context::new();
        let r = ctx
            .canvas(&mut dst)
            .transform(&src, 0.0, 2.0, 2.0, Point::default(), Point::default(), TransformFlags::empty());
        assert_eq!(r, Rect::new(0, 0, 4, 5));
        for x in 0..4 {
            assert_eq!(dst.read_raw(x, 0), src.read_raw(x / 2, 0));
            assert_eq!(dst.read_raw(x, 1), src.read_raw(x / 2, 1));
            assert_eq!(dst.read_raw(x, 2), src.read_raw(x / 2, 1));
            assert_eq!(dst.read_raw(x, 3), 0);
        }
    }

    #[test]
    fn test_zero_scale_draws_nothing() {
        let src = numbered(4, 4);
        let mut dst = surface(8, 8);
        let mut ctx = Context::new();
        let r = ctx
            .canvas(&mut dst)
            .transform(&src, 0.0, 0.0, 1.0, Point::default(), Point::default(), TransformFlags::empty());
        assert!(r.is_empty());
        assert_eq!(count(&dst, 0), 64);
        assert_eq!(ctx.error_count(), 0);
    }

    #[test]
    fn test_colorkey_flag_skips_keyed_pixels() {
        let mut src = surface(3, 1);
        src.fill(RED);
        src.write_raw(1, 0, 0xFF00_FF00);
        src.set_colorkey(Some(0xFF00_FF00));
        let mut ctx = Context::new();

        let mut dst = surface(4, 4);
        let o = Point::default();
        ctx.canvas(&mut dst).transform(&src, 0.0, 1.0, 1.0, o, o, TransformFlags::COLORKEY);
        assert_eq!(dst.read_raw(1, 0), 0);
        assert_eq!(count(&dst, RED), 3);

        let mut dst = surface(4, 4);
        ctx.canvas(&mut dst).transform(&src, 0.0, 1.0, 1.0, o, o, TransformFlags::empty());
        assert_eq!(dst.read_raw(1, 0), 0xFF00_FF00);
    }

    #[test]
    fn test_converts_between_formats() {
        let mut src = surface(2, 2);
        src.fill(RED);
        let mut dst = Surface::new(4, 4, PixelFormat::rgb565()).unwrap();
        let mut ctx = Context::new();
        let o = Point::default();
        ctx.canvas(&mut dst).transform(&src, 0.0, 1.0, 1.0, o, o, TransformFlags::empty());
        assert_eq!(dst.read_raw(1, 1), 0xF800);
        assert_eq!(count(&dst, 0xF800), 6);
        ctx.canvas(&mut dst).transform(&src, 0.0, 2.0, 2.0, o, o, TransformFlags::AA);
        assert_eq!(count(&dst, 0xF800), 8);
        assert_eq!(dst.read_raw(1, 2), 0xF800);
    }

    #[test]
    fn test_bilinear_keeps_flat_color_and_ramps_edges() {
        let mut flat = surface(3, 3);
        flat.fill(RED);
        let mut dst = surface(12, 12);
        let mut ctx = Context::new();
        let o = Point::default();
        let r = ctx.canvas(&mut dst).transform(&flat, 0.0, 4.0, 4.0, o, o, TransformFlags::AA);
        assert_eq!(r, Rect::new(0, 0, 10, 11));
        assert_eq!(count(&dst, RED), 64);
        assert_eq!(count(&dst, 0), 80);

        let mut ramp = surface(2, 2);
        for y in 0..2 {
            ramp.write_raw(0, y, 0xFF00_0000);
            ramp.write_raw(1, y, 0xFFFF_FFFF);
        }
        let mut dst = surface(8, 4);
        ctx.canvas(&mut dst).transform(&ramp, 0.0, 4.0, 4.0, o, o, TransformFlags::AA);
        let row: Vec<u32> = (0..4).map(|x| dst.read_raw(x, 1)).collect();
        assert_eq!(row, vec![0xFF3F_3F3F, 0xFF5F_5F5F, 0xFF7F_7F7F, 0xFF9F_9F9F]);
        assert_eq!(dst.read_raw(0, 0), 0);
        assert_eq!(dst.read_raw(4, 1), 0);
    }

    #[test]
    fn test_bilinear_rotation_stays_inside_square() {
        let mut src = surface(10, 10);
        src.fill(RED);
        let mut ctx = Context::new();
        let out = rotate_surface(&mut ctx, &src, 45.0, 0xFF00_0000, true).unwrap();
        assert_eq!((out.width(), out.height()), (11, 11));
        assert_eq!(count(&out, RED), 75);
        assert_eq!(out.read_raw(0, 0), 0xFF00_0000);
    }

    #[test]
    fn test_tmap_centers_the_source_quad() {
        let mut src = surface(4, 4);
        src.fill(RED);
        let mut dst = surface(10, 10);
        let mut ctx = Context::new();
        let r = ctx.canvas(&mut dst).transform(
            &src,
            0.0,
            1.0,
            1.0,
            Point::new(3, 3),
            Point::new(2, 2),
            TransformFlags::TMAP,
        );
        assert_eq!(r, Rect::new(0, 1, 4, 4));
        assert_eq!(dst.read_raw(0, 1), RED);
        assert_eq!(dst.read_raw(3, 4), RED);
        assert_eq!(dst.read_raw(0, 0), 0);
        assert_eq!(dst.read_raw(4, 4), 0);
    }

    #[test]
    fn test_tmap_quarter_turns_are_exact() {
        let ctx = Context::new();
        assert_eq!(tmap_sin_cos(&ctx, 90.0), (1.0, 0.0));
        assert_eq!(tmap_sin_cos(&ctx, 180.0), (0.0, -1.0));
        assert_eq!(tmap_sin_cos(&ctx, 360.0), (0.0, 1.0));
        let (s, c) = tmap_sin_cos(&ctx, 30.0);
        assert!((s - 0.5).abs() < 1e-6 && (c - 0.866_025_4).abs() < 1e-6);
    }

    #[test]
    fn test_transform_marks_dirty() {
        let src = numbered(4, 4);
        let mut dst = surface(16, 16);
        let mut ctx = Context::new();
        ctx.dirty_mut().init(4);
        ctx.dirty_mut().enable(true);
        let r = ctx.canvas(&mut dst).transform(
            &src,
            0.0,
            1.0,
            1.0,
            Point::default(),
            Point::new(14, 2),
            TransformFlags::empty(),
        );
        assert_eq!(r, Rect::new(13, 2, 3, 6));
        assert_eq!(ctx.dirty().front().unwrap().rects(), &[r]);
    }

    struct Refuse;

    impl LockHook for Refuse {
        fn lock(&mut self) -> Result<(), String> {
            Err("busy".into())
        }
        fn unlock(&mut self) {}
    }

    #[test]
    fn test_source_lock_failure_aborts() {
        let mut src = numbered(4, 4);
        src.set_lock_hook(Some(Box::new(Refuse)));
        let mut dst = surface(8, 8);
        let mut ctx = Context::new();
        let o = Point::default();
        let r = ctx.canvas(&mut dst).transform(&src, 0.0, 1.0, 1.0, o, o, TransformFlags::empty());
        assert!(r.is_empty());
        assert_eq!(count(&dst, 0), 64);
        assert!(ctx.pop_error().unwrap().contains("source: busy"));
    }

    #[test]
    fn test_transform_surface_sizes_to_padded_box() {
        let src = numbered(6, 4);
        let mut ctx = Context::new();
        let same = transform_surface(&mut ctx, &src, 0, 0.0, 1.0, 1.0, TransformFlags::empty()).unwrap();
        assert_eq!((same.width(), same.height()), (8, 6));
        assert_eq!(same.read_raw(1, 1), src.read_raw(0, 0));
        assert_eq!(same.read_raw(6, 4), src.read_raw(5, 3));
        assert_eq!(same.read_raw(7, 4), src.read_raw(5, 3));
        assert_eq!(same.read_raw(0, 0), 0);

        let turned = transform_surface(&mut ctx, &src, 0, 90.0, 1.0, 1.0, TransformFlags::empty()).unwrap();
        assert_eq!((turned.width(), turned.height()), (6, 8));
        for y in 0..6 {
            for x in 0..4 {
                assert_eq!(turned.read_raw(x + 2, y + 2), src.read_raw(y, 3 - x));
            }
        }
        assert_eq!(turned.read_raw(1, 2), 0);

        let err = transform_surface(&mut ctx, &src, 0, 0.0, 1.0, 0.0, TransformFlags::empty()).unwrap_err();
        assert!(matches!(err, RasterError::InvalidScale { .. }));
    }

    #[test]
    fn test_rotate_surface_sizes_square_from_half_diagonal() {
        let mut src = surface(6, 6);
        src.fill(RED);
        src.set_colorkey(Some(0xFF00_FF00));
        let mut ctx = Context::new();
        let out = rotate_surface(&mut ctx, &src, 90.0, 0xFF00_0000, false).unwrap();
        assert_eq!((out.width(), out.height()), (7, 7));
        // The square clips one source row
        assert_eq!(count(&out, RED), 30);
        assert_eq!(out.read_raw(0, 0), 0xFF00_0000);
        assert_eq!(out.read_raw(1, 1), 0xFF00_0000);
        assert_eq!(out.read_raw(2, 1), RED);
        assert_eq!(out.colorkey(), Some(0xFF00_FF00));

        let mut big = surface(10, 10);
        big.fill(RED);
        let out = rotate_surface(&mut ctx, &big, 45.0, 0xFF00_0000, false).unwrap();
        assert_eq!((out.width(), out.height()), (11, 11));
        assert_eq!(count(&out, RED), 94);
    }
}
