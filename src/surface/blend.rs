//! Per-pixel alpha compositing

use serde::{Deserialize, Serialize};

use super::buffer::Surface;
use super::format::{Color, ALPHA_OPAQUE};

// ============================================================================
// Blend Mode
// ============================================================================

/// How a 32-bit blend combines color and alpha. Lower depths always blend
/// every stored channel and ignore the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Blend RGB; alpha = (dest + src) / 2
    #[default]
    CombineAlpha,
    /// Blend RGB; keep destination alpha
    DestAlpha,
    /// Blend RGB; alpha = source alpha
    SrcAlpha,
    /// Copy RGB; alpha forced opaque
    CopyNoAlpha,
    /// Copy RGB; alpha = source alpha
    CopySrcAlpha,
    /// Copy RGB; keep destination alpha
    CopyDestAlpha,
    /// Copy RGB; alpha = (dest + src) / 2
    CopyCombineAlpha,
    /// Keep destination RGB; alpha = source alpha
    CopyAlphaOnly,
    /// Keep destination RGB; alpha = (dest + src) / 2
    CombineAlphaOnly,
    /// Copy RGB and source alpha, but only over the color key.
    /// Any other destination pixel stops the write.
    ReplaceColorkey,
}

/// `d + (s - d) * alpha >> 8` on a masked field, floor-rounded
#[inline]
fn lerp_masked(dc: u32, sc: u32, mask: u32, alpha: u8) -> u32 {
    let d = (dc & mask) as i64;
    let s = (sc & mask) as i64;
    ((d + (((s - d) * alpha as i64) >> 8)) as u32) & mask
}

/// Same formula on plain 8-bit channel values
#[inline]
pub(crate) fn lerp_channel(d: u8, s: u8, alpha: u8) -> u8 {
    let d = d as i32;
    (d + (((s as i32 - d) * alpha as i32) >> 8)) as u8
}

impl Surface {
    /// Blend `color` into (x, y) at `alpha` under `mode`. Bounds are the
    /// caller's job. Returns `false` when a color-key replacement refused the
    /// pixel, so bulk fills can stop.
    pub(crate) fn blend_raw(&mut self, x: i32, y: i32, color: Color, alpha: u8, mode: BlendMode) -> bool {
        let fmt = self.format();
        match fmt.bytes_per_pixel() {
            1 => {
                let (dr, dg, db) = fmt.get_rgb(self.read_raw(x, y));
                let (sr, sg, sb) = fmt.get_rgb(color);
                let c = fmt.map_rgb(
                    lerp_channel(dr, sr, alpha),
                    lerp_channel(dg, sg, alpha),
                    lerp_channel(db, sb, alpha),
                );
                self.write_raw(x, y, c);
            },
            2 => {
                let dc = self.read_raw(x, y);
                let (r, g, b, a) = (fmt.r.mask, fmt.g.mask, fmt.b.mask, fmt.a.mask);
                let mut c = lerp_masked(dc, color, r, alpha)
                    | lerp_masked(dc, color, g, alpha)
                    | lerp_masked(dc, color, b, alpha);
                if a != 0 {
                    c |= lerp_masked(dc, color, a, alpha);
                }
                self.write_raw(x, y, c);
            },
            3 => {
                let dc = self.read_raw(x, y);
                let mut c = 0;
                for ch in [fmt.r, fmt.g, fmt.b, fmt.a] {
                    if ch.mask == 0 {
                        continue;
                    }
                    let d = ((dc >> ch.shift) & 0xFF) as u8;
                    let s = ((color >> ch.shift) & 0xFF) as u8;
                    c |= (lerp_channel(d, s, alpha) as u32) << ch.shift;
                }
                self.write_raw(x, y, c);
            },
            _ => {
                let dc = self.read_raw(x, y);
                match blend32(self, dc, color, alpha, mode) {
                    Some(c) => self.write_raw(x, y, c),
                    None => return false,
                }
            },
        }
        true
    }
}

/// 32-bit policy table. `None` means the pixel must be left alone.
fn blend32(surface: &Surface, dc: Color, color: Color, alpha: u8, mode: BlendMode) -> Option<Color> {
    let fmt = surface.format();
    let (rm, gm, bm, am) = (fmt.r.mask, fmt.g.mask, fmt.b.mask, fmt.a.mask);
    let ashift = fmt.a.shift;

    let src_rgb = color & (rm | gm | bm);
    let dst_rgb = dc & (rm | gm | bm);
    let blended_rgb = || {
        if alpha == ALPHA_OPAQUE {
            src_rgb
        } else {
            lerp_masked(dc, color, rm, alpha) | lerp_masked(dc, color, gm, alpha) | lerp_masked(dc, color, bm, alpha)
        }
    };
    let combined_a = || (((((dc & am) >> ashift) + alpha as u32) >> 1) << ashift) & am;
    let src_a = ((alpha as u32) << ashift) & am;
    let dst_a = dc & am;

    // Alpha stays 0 on surfaces without an alpha channel
    let with_alpha = |rgb: u32, a: u32| if am != 0 { rgb | a } else { rgb };

    let c = match mode {
        BlendMode::CombineAlpha => with_alpha(blended_rgb(), combined_a()),
        BlendMode::DestAlpha => with_alpha(blended_rgb(), dst_a),
        BlendMode::SrcAlpha => with_alpha(blended_rgb(), src_a),
        BlendMode::CopySrcAlpha => with_alpha(src_rgb, src_a),
        BlendMode::CopyDestAlpha => with_alpha(src_rgb, dst_a),
        BlendMode::CopyCombineAlpha => with_alpha(src_rgb, combined_a()),
        BlendMode::CopyNoAlpha => with_alpha(src_rgb, ((ALPHA_OPAQUE as u32) << ashift) & am),
        BlendMode::CopyAlphaOnly => with_alpha(dst_rgb, src_a),
        BlendMode::CombineAlphaOnly => with_alpha(dst_rgb, combined_a()),
        BlendMode::ReplaceColorkey => {
            if surface.colorkey() != Some(dc) {
                return None;
            }
            with_alpha(src_rgb, src_a)
        },
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Palette, PixelFormat};

    fn surface(f: PixelFormat) -> Surface {
        Surface::new(2, 2, f).unwrap()
    }

    #[test]
    fn test_half_alpha_formula_32bit() {
        let mut s = surface(PixelFormat::argb8888());
        s.write_raw(0, 0, s.map_rgba(100, 200, 0, 255));
        let c = s.map_rgb(200, 100, 255);
        s.blend_raw(0, 0, c, 128, BlendMode::DestAlpha);
        let (r, g, b, a) = s.get_rgba(s.read_raw(0, 0));
        assert_eq!(r, (100 + (100 * 128 >> 8)) as u8);
        assert_eq!(g, (200 - ((100 * 128) >> 8)) as u8);
        assert_eq!(b, (255 * 128 >> 8) as u8);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_combine_alpha_averages() {
        let mut s = surface(PixelFormat::argb8888());
        s.write_raw(0, 0, s.map_rgba(0, 0, 0, 100));
        s.blend_raw(0, 0, s.map_rgb(10, 10, 10), 200, BlendMode::CombineAlpha);
        assert_eq!(s.get_rgba(s.read_raw(0, 0)).3, 150);
    }

    #[test]
    fn test_copy_modes() {
        let mut s = surface(PixelFormat::argb8888());
        let dst = s.map_rgba(1, 2, 3, 40);
        let src = s.map_rgb(9, 8, 7);

        s.write_raw(0, 0, dst);
        s.blend_raw(0, 0, src, 10, BlendMode::CopySrcAlpha);
        assert_eq!(s.get_rgba(s.read_raw(0, 0)), (9, 8, 7, 10));

        s.write_raw(0, 0, dst);
        s.blend_raw(0, 0, src, 10, BlendMode::CopyNoAlpha);
        assert_eq!(s.get_rgba(s.read_raw(0, 0)), (9, 8, 7, 255));

        s.write_raw(0, 0, dst);
        s.blend_raw(0, 0, src, 10, BlendMode::CopyAlphaOnly);
        assert_eq!(s.get_rgba(s.read_raw(0, 0)), (1, 2, 3, 10));

        s.write_raw(0, 0, dst);
        s.blend_raw(0, 0, src, 10, BlendMode::CopyDestAlpha);
        assert_eq!(s.get_rgba(s.read_raw(0, 0)), (9, 8, 7, 40));

        s.write_raw(0, 0, dst);
        s.blend_raw(0, 0, src, 60, BlendMode::CombineAlphaOnly);
        assert_eq!(s.get_rgba(s.read_raw(0, 0)), (1, 2, 3, 50));
    }

    #[test]
    fn test_replace_colorkey_refuses_other_pixels() {
        let mut s = surface(PixelFormat::argb8888());
        let key = s.map_rgba(255, 0, 255, 255);
        s.set_colorkey(Some(key));
        s.write_raw(0, 0, key);
        s.write_raw(1, 0, 0);
        let c = s.map_rgb(1, 1, 1);
        assert!(s.blend_raw(0, 0, c, 77, BlendMode::ReplaceColorkey));
        assert_eq!(s.get_rgba(s.read_raw(0, 0)), (1, 1, 1, 77));
        assert!(!s.blend_raw(1, 0, c, 77, BlendMode::ReplaceColorkey));
        assert_eq!(s.read_raw(1, 0), 0);
    }

    #[test]
    fn test_no_alpha_channel_stays_zero() {
        let mut s = surface(PixelFormat::xrgb8888());
        s.blend_raw(0, 0, s.map_rgb(255, 255, 255), 255, BlendMode::CopyNoAlpha);
        assert_eq!(s.read_raw(0, 0), 0x00FFFFFF);
    }

    #[test]
    fn test_565_blend() {
        let mut s = surface(PixelFormat::rgb565());
        s.write_raw(0, 0, 0);
        s.blend_raw(0, 0, 0xFFFF, 128, BlendMode::CombineAlpha);
        let c = s.read_raw(0, 0);
        // Each field lands halfway, floor-rounded in place
        assert_eq!(c & 0x001F, 15);
        assert_eq!((c & 0x07E0) >> 5, 31);
        assert_eq!((c & 0xF800) >> 11, 15);
    }

    #[test]
    fn test_24bit_blend() {
        let mut s = surface(PixelFormat::rgb888());
        s.write_raw(1, 1, s.map_rgb(0, 100, 200));
        s.blend_raw(1, 1, s.map_rgb(255, 100, 0), 64, BlendMode::CombineAlpha);
        assert_eq!(s.get_rgba(s.read_raw(1, 1)), (63, 100, 150, 255));
    }

    #[test]
    fn test_indexed_blend_requantizes() {
        let mut s = surface(PixelFormat::indexed8(Palette::grayscale()));
        s.write_raw(0, 0, 0);
        s.blend_raw(0, 0, 200, 128, BlendMode::CombineAlpha);
        assert_eq!(s.read_raw(0, 0), 100);
    }
}
