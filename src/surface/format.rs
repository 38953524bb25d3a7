//! Pixel formats: packed channel layouts and 8-bit palettes

use crate::error::RasterError;

/// Packed pixel value, interpreted through a [`PixelFormat`]
pub type Color = u32;

/// Fully opaque alpha
pub const ALPHA_OPAQUE: u8 = 255;
/// Fully transparent alpha
pub const ALPHA_TRANSPARENT: u8 = 0;

// ============================================================================
// Palette
// ============================================================================

/// Color table for 8-bit indexed surfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<(u8, u8, u8)>,
}

impl Palette {
    pub fn new(colors: Vec<(u8, u8, u8)>) -> Self {
        Self { colors }
    }

    /// 256 grey levels, index == intensity
    pub fn grayscale() -> Self {
        Self::new((0..=255u8).map(|v| (v, v, v)).collect())
    }

    /// 3-3-2 RGB cube, handy for tests and previews
    pub fn rgb332() -> Self {
        let colors = (0..=255u8)
            .map(|i| {
                let r = u16::from((i >> 5) & 7);
                let g = u16::from((i >> 2) & 7);
                let b = u16::from(i & 3);
                ((r * 255 / 7) as u8, (g * 255 / 7) as u8, (b * 255 / 3) as u8)
            })
            .collect();
        Self::new(colors)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Entry at `index`; black past the end of the table
    #[inline]
    pub fn get(&self, index: u32) -> (u8, u8, u8) {
        self.colors.get(index as usize).copied().unwrap_or((0, 0, 0))
    }

    /// Index of the entry nearest to (r, g, b) by squared distance.
    /// Ties go to the lowest index.
    pub fn nearest(&self, r: u8, g: u8, b: u8) -> u32 {
        let mut best = 0;
        let mut best_dist = u32::MAX;
        for (i, &(pr, pg, pb)) in self.colors.iter().enumerate() {
            let dr = pr as i32 - r as i32;
            let dg = pg as i32 - g as i32;
            let db = pb as i32 - b as i32;
            let dist = (dr * dr + dg * dg + db * db) as u32;
            if dist < best_dist {
                best = i as u32;
                if dist == 0 {
                    break;
                }
                best_dist = dist;
            }
        }
        best
    }
}

// ============================================================================
// Channel
// ============================================================================

/// One channel's bit-field: mask, shift to the low bit, bits lost vs 8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub mask: u32,
    pub shift: u8,
    pub loss: u8,
}

impl Channel {
    fn from_mask(mask: u32) -> Self {
        if mask == 0 {
            return Self {
                mask,
                shift: 0,
                loss: 8,
            };
        }
        let bits = mask.count_ones().min(8);
        Self {
            mask,
            shift: mask.trailing_zeros() as u8,
            loss: (8 - bits) as u8,
        }
    }

    /// Pack an 8-bit value into this channel's bits
    #[inline]
    pub fn pack(&self, v: u8) -> u32 {
        if self.mask == 0 {
            return 0;
        }
        (((v >> self.loss) as u32) << self.shift) & self.mask
    }

    /// Unpack to 8 bits, replicating high bits into the lost low bits
    #[inline]
    pub fn unpack(&self, pixel: u32) -> u8 {
        let v = (pixel & self.mask) >> self.shift;
        let spread = 8 - 2 * self.loss as i32;
        let expanded = if spread >= 0 {
            (v << self.loss) + (v >> spread)
        } else {
            v << self.loss
        };
        expanded.min(255) as u8
    }
}

// ============================================================================
// PixelFormat
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormat {
    bits_per_pixel: u8,
    bytes_per_pixel: u8,
    pub r: Channel,
    pub g: Channel,
    pub b: Channel,
    pub a: Channel,
    palette: Option<Palette>,
}

impl PixelFormat {
    /// Packed format from channel masks
    pub fn from_masks(
        bits_per_pixel: u8,
        rmask: u32,
        gmask: u32,
        bmask: u32,
        amask: u32,
    ) -> Result<Self, RasterError> {
        let bytes_per_pixel = match bits_per_pixel {
            8 => 1,
            15 | 16 => 2,
            24 => 3,
            32 => 4,
            other => return Err(RasterError::UnsupportedFormat(other)),
        };
        Ok(Self {
            bits_per_pixel,
            bytes_per_pixel,
            r: Channel::from_mask(rmask),
            g: Channel::from_mask(gmask),
            b: Channel::from_mask(bmask),
            a: Channel::from_mask(amask),
            palette: None,
        })
    }

    /// 8-bit palettized format
    pub fn indexed8(palette: Palette) -> Self {
        Self {
            bits_per_pixel: 8,
            bytes_per_pixel: 1,
            r: Channel::from_mask(0),
            g: Channel::from_mask(0),
            b: Channel::from_mask(0),
            a: Channel::from_mask(0),
            palette: Some(palette),
        }
    }

    pub fn rgb565() -> Self {
        Self::packed(16, 2, 0xF800, 0x07E0, 0x001F, 0)
    }

    pub fn argb4444() -> Self {
        Self::packed(16, 2, 0x0F00, 0x00F0, 0x000F, 0xF000)
    }

    /// 24-bit, blue in the low byte
    pub fn rgb888() -> Self {
        Self::packed(24, 3, 0xFF0000, 0x00FF00, 0x0000FF, 0)
    }

    pub fn argb8888() -> Self {
        Self::packed(32, 4, 0x00FF0000, 0x0000FF00, 0x000000FF, 0xFF000000)
    }

    pub fn rgba8888() -> Self {
        Self::packed(32, 4, 0xFF000000, 0x00FF0000, 0x0000FF00, 0x000000FF)
    }

    /// 32-bit without an alpha channel
    pub fn xrgb8888() -> Self {
        Self::packed(32, 4, 0x00FF0000, 0x0000FF00, 0x000000FF, 0)
    }

    fn packed(bits: u8, bytes: u8, r: u32, g: u32, b: u32, a: u32) -> Self {
        Self {
            bits_per_pixel: bits,
            bytes_per_pixel: bytes,
            r: Channel::from_mask(r),
            g: Channel::from_mask(g),
            b: Channel::from_mask(b),
            a: Channel::from_mask(a),
            palette: None,
        }
    }

    #[inline]
    pub fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> u8 {
        self.bytes_per_pixel
    }

    #[inline]
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = Some(palette);
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.a.mask != 0
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.bytes_per_pixel == 1
    }

    /// Opaque color from 8-bit channels
    pub fn map_rgb(&self, r: u8, g: u8, b: u8) -> Color {
        if self.is_indexed() {
            return self.palette.as_ref().map_or(0, |p| p.nearest(r, g, b));
        }
        self.r.pack(r) | self.g.pack(g) | self.b.pack(b) | self.a.mask
    }

    pub fn map_rgba(&self, r: u8, g: u8, b: u8, a: u8) -> Color {
        if self.is_indexed() {
            return self.map_rgb(r, g, b);
        }
        self.r.pack(r) | self.g.pack(g) | self.b.pack(b) | self.a.pack(a)
    }

    pub fn get_rgb(&self, color: Color) -> (u8, u8, u8) {
        let (r, g, b, _) = self.get_rgba(color);
        (r, g, b)
    }

    /// Split a color into 8-bit channels; alpha is opaque without an alpha mask
    pub fn get_rgba(&self, color: Color) -> (u8, u8, u8, u8) {
        if self.is_indexed() {
            let (r, g, b) = self.palette.as_ref().map_or((0, 0, 0), |p| p.get(color));
            return (r, g, b, ALPHA_OPAQUE);
        }
        let a = if self.has_alpha() {
            self.a.unpack(color)
        } else {
            ALPHA_OPAQUE
        };
        (self.r.unpack(color), self.g.unpack(color), self.b.unpack(color), a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_and_loss() {
        let f = PixelFormat::rgb565();
        assert_eq!((f.r.shift, f.r.loss), (11, 3));
        assert_eq!((f.g.shift, f.g.loss), (5, 2));
        assert_eq!((f.b.shift, f.b.loss), (0, 3));
        assert!(!f.has_alpha());
    }

    #[test]
    fn test_round_trip_packed_formats() {
        for f in [
            PixelFormat::rgb565(),
            PixelFormat::argb4444(),
            PixelFormat::rgb888(),
            PixelFormat::argb8888(),
            PixelFormat::rgba8888(),
        ] {
            for &(r, g, b, a) in &[(0, 0, 0, 0), (255, 255, 255, 255), (12, 200, 99, 128), (1, 2, 3, 4)] {
                let c = f.map_rgba(r, g, b, a);
                let (r2, g2, b2, a2) = f.get_rgba(c);
                assert_eq!(f.map_rgba(r2, g2, b2, a2), c, "format {:?}", f.bits_per_pixel());
            }
        }
    }

    #[test]
    fn test_round_trip_indexed() {
        let f = PixelFormat::indexed8(Palette::rgb332());
        for i in [0u32, 7, 100, 255] {
            let (r, g, b) = f.get_rgb(i);
            assert_eq!(f.map_rgb(r, g, b), i);
        }
    }

    #[test]
    fn test_rgb332_palette_spans_full_range() {
        let p = Palette::rgb332();
        assert_eq!(p.len(), 256);
        assert_eq!(p.get(0), (0, 0, 0));
        assert_eq!(p.get(255), (255, 255, 255));
        // r = 7, g = 0, b = 0
        assert_eq!(p.get(0b1110_0000), (255, 0, 0));
        // r = 3, g = 5, b = 1
        assert_eq!(p.get(0b0111_0101), (109, 182, 85));
    }

    #[test]
    fn test_full_intensity_expands_to_255() {
        let f = PixelFormat::rgb565();
        assert_eq!(f.get_rgb(f.map_rgb(255, 255, 255)), (255, 255, 255));
    }

    #[test]
    fn test_map_rgb_is_opaque() {
        let f = PixelFormat::argb8888();
        assert_eq!(f.map_rgb(1, 2, 3), 0xFF010203);
    }

    #[test]
    fn test_unsupported_depth() {
        assert!(matches!(
            PixelFormat::from_masks(12, 0, 0, 0, 0),
            Err(RasterError::UnsupportedFormat(12))
        ));
    }
}
