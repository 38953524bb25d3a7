use std::rc::Rc;

use log::warn;

use super::format::{Color, PixelFormat};
use super::lock::{LockHook, LockState, SurfaceLock};
use crate::error::RasterError;
use crate::rect::Rect;

/// Largest edge a surface may have; coordinates are 16-bit
pub const MAX_DIMENSION: u32 = i16::MAX as u32;

// ============================================================================
// Surface
// ============================================================================

/// Pixel memory with a format, a clip rectangle and an optional color key.
/// Rows are `pitch` bytes apart; 16/32-bit pixels are stored native-endian.
#[derive(Debug)]
pub struct Surface {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    clip: Rect,
    colorkey: Option<Color>,
    alpha: u8,
    lock: Rc<LockState>,
}

impl Surface {
    /// Zeroed surface; rows padded to a multiple of 4 bytes
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, RasterError> {
        check_dimensions(width, height)?;
        let row = width as usize * format.bytes_per_pixel() as usize;
        let pitch = (row + 3) & !3;
        Ok(Self::assemble(vec![0; pitch * height as usize], width, height, pitch, format))
    }

    /// Wrap existing pixel data
    pub fn from_pixels(
        width: u32,
        height: u32,
        pitch: usize,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> Result<Self, RasterError> {
        check_dimensions(width, height)?;
        let row = width as usize * format.bytes_per_pixel() as usize;
        let expected = pitch.max(row) * height as usize;
        if pitch < row || pixels.len() < expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self::assemble(pixels, width, height, pitch, format))
    }

    /// Same format at a new size, zeroed, colorkey and alpha carried over
    pub fn new_like(other: &Surface, width: u32, height: u32) -> Result<Self, RasterError> {
        let mut s = Self::new(width, height, other.format.clone())?;
        s.colorkey = other.colorkey;
        s.alpha = other.alpha;
        Ok(s)
    }

    fn assemble(pixels: Vec<u8>, width: u32, height: u32, pitch: usize, format: PixelFormat) -> Self {
        Self {
            pixels,
            width,
            height,
            pitch,
            format,
            clip: Rect::new(0, 0, width as i32, height as i32),
            colorkey: None,
            alpha: 255,
            lock: Rc::default(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn format_mut(&mut self) -> &mut PixelFormat {
        &mut self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> u8 {
        self.format.bytes_per_pixel()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    // ========================================================================
    // Clip rectangle, color key, surface alpha
    // ========================================================================

    pub fn clip_rect(&self) -> Rect {
        self.clip
    }

    /// Clip to `rect` intersected with the surface
    pub fn set_clip(&mut self, rect: Rect) {
        self.clip = rect.intersection(&self.bounds());
    }

    pub fn reset_clip(&mut self) {
        self.clip = self.bounds();
    }

    #[inline]
    pub fn clip_xmin(&self) -> i32 {
        self.clip.left()
    }

    #[inline]
    pub fn clip_xmax(&self) -> i32 {
        self.clip.right() - 1
    }

    #[inline]
    pub fn clip_ymin(&self) -> i32 {
        self.clip.top()
    }

    #[inline]
    pub fn clip_ymax(&self) -> i32 {
        self.clip.bottom() - 1
    }

    #[inline]
    pub fn in_clip(&self, x: i32, y: i32) -> bool {
        x >= self.clip_xmin() && x <= self.clip_xmax() && y >= self.clip_ymin() && y <= self.clip_ymax()
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    pub fn colorkey(&self) -> Option<Color> {
        self.colorkey
    }

    pub fn set_colorkey(&mut self, key: Option<Color>) {
        self.colorkey = key;
    }

    /// Per-surface alpha, applied by blend blits when surface alpha is on
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    // ========================================================================
    // Locking
    // ========================================================================

    pub fn set_lock_hook(&mut self, hook: Option<Box<dyn LockHook>>) {
        self.lock.set_hook(hook);
    }

    pub fn must_lock(&self) -> bool {
        self.lock.must_lock()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.depth() > 0
    }

    /// Acquire pixel access; the guard releases it when dropped
    pub fn lock(&self) -> Result<SurfaceLock, String> {
        SurfaceLock::acquire(&self.lock).map_err(|reason| {
            warn!("surface lock failed: {}", reason);
            reason
        })
    }

    // ========================================================================
    // Raw access (callers guarantee bounds)
    // ========================================================================

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.pitch + x as usize * self.format.bytes_per_pixel() as usize
    }

    /// Read the packed value at (x, y)
    #[inline]
    pub fn read_raw(&self, x: i32, y: i32) -> Color {
        let o = self.offset(x, y);
        let p = &self.pixels;
        match self.format.bytes_per_pixel() {
            1 => p[o] as Color,
            2 => u16::from_ne_bytes([p[o], p[o + 1]]) as Color,
            3 => {
                let f = &self.format;
                let mut c = 0;
                for ch in [&f.r, &f.g, &f.b, &f.a] {
                    if ch.mask != 0 {
                        c |= (p[o + ch.shift as usize / 8] as Color) << ch.shift;
                    }
                }
                c
            },
            _ => u32::from_ne_bytes([p[o], p[o + 1], p[o + 2], p[o + 3]]),
        }
    }

    /// Store a packed value at (x, y)
    #[inline]
    pub fn write_raw(&mut self, x: i32, y: i32, color: Color) {
        let o = self.offset(x, y);
        match self.format.bytes_per_pixel() {
            1 => self.pixels[o] = color as u8,
            2 => self.pixels[o..o + 2].copy_from_slice(&(color as u16).to_ne_bytes()),
            3 => {
                let f = &self.format;
                let fields = [f.r, f.g, f.b, f.a];
                for ch in fields {
                    if ch.mask != 0 {
                        self.pixels[o + ch.shift as usize / 8] = (color >> ch.shift) as u8;
                    }
                }
            },
            _ => self.pixels[o..o + 4].copy_from_slice(&color.to_ne_bytes()),
        }
    }

    /// Write if (x, y) is inside the clip rectangle
    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if self.in_clip(x, y) {
            self.write_raw(x, y, color);
        }
    }

    /// Bounds-checked read against the whole surface
    pub fn get_pixel(&self, x: i32, y: i32) -> Result<Color, RasterError> {
        if !self.in_bounds(x, y) {
            return Err(RasterError::OutOfBounds { x, y });
        }
        Ok(self.read_raw(x, y))
    }

    /// Fill inclusive span x1..=x2 on row y; callers clip first
    pub(crate) fn fill_span_raw(&mut self, x1: i32, x2: i32, y: i32, color: Color) {
        let bpp = self.format.bytes_per_pixel() as usize;
        if bpp == 3 {
            for x in x1..=x2 {
                self.write_raw(x, y, color);
            }
            return;
        }
        let start = self.offset(x1, y);
        let end = self.offset(x2, y) + bpp;
        let row = &mut self.pixels[start..end];
        match bpp {
            1 => row.fill(color as u8),
            2 => {
                let bytes = (color as u16).to_ne_bytes();
                for px in row.chunks_exact_mut(2) {
                    px.copy_from_slice(&bytes);
                }
            },
            _ => {
                let bytes = color.to_ne_bytes();
                for px in row.chunks_exact_mut(4) {
                    px.copy_from_slice(&bytes);
                }
            },
        }
    }

    /// Fill a rect already clipped to the surface
    pub(crate) fn fill_rect_raw(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        for y in y1..=y2 {
            self.fill_span_raw(x1, x2, y, color);
        }
    }

    /// Fill the clip rectangle with `color`
    pub fn fill(&mut self, color: Color) {
        if self.clip.is_empty() {
            return;
        }
        let (x1, y1, x2, y2) = (self.clip_xmin(), self.clip_ymin(), self.clip_xmax(), self.clip_ymax());
        self.fill_rect_raw(x1, y1, x2, y2, color);
    }

    // ========================================================================
    // Color helpers
    // ========================================================================

    #[inline]
    pub fn map_rgb(&self, r: u8, g: u8, b: u8) -> Color {
        self.format.map_rgb(r, g, b)
    }

    #[inline]
    pub fn map_rgba(&self, r: u8, g: u8, b: u8, a: u8) -> Color {
        self.format.map_rgba(r, g, b, a)
    }

    #[inline]
    pub fn get_rgba(&self, color: Color) -> (u8, u8, u8, u8) {
        self.format.get_rgba(color)
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), RasterError> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RasterError::Dimensions {
            width: width as i64,
            height: height as i64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Palette;

    #[test]
    fn test_pitch_is_padded() {
        let s = Surface::new(3, 2, PixelFormat::rgb888()).unwrap();
        assert_eq!(s.pitch(), 12);
        assert_eq!(s.pixels().len(), 24);
    }

    #[test]
    fn test_raw_round_trip_every_depth() {
        let formats = [
            PixelFormat::indexed8(Palette::grayscale()),
            PixelFormat::rgb565(),
            PixelFormat::rgb888(),
            PixelFormat::argb8888(),
        ];
        for f in formats {
            let mut s = Surface::new(4, 4, f).unwrap();
            let c = s.map_rgb(200, 100, 50);
            s.write_raw(2, 3, c);
            assert_eq!(s.read_raw(2, 3), c);
            assert_eq!(s.read_raw(1, 3), 0);
        }
    }

    #[test]
    fn test_put_pixel_respects_clip() {
        let mut s = Surface::new(10, 10, PixelFormat::argb8888()).unwrap();
        s.set_clip(Rect::new(2, 2, 4, 4));
        s.put_pixel(1, 1, 0xFFFFFFFF);
        s.put_pixel(5, 5, 0xFFFFFFFF);
        s.put_pixel(6, 6, 0xFFFFFFFF);
        assert_eq!(s.read_raw(1, 1), 0);
        assert_eq!(s.read_raw(5, 5), 0xFFFFFFFF);
        assert_eq!(s.read_raw(6, 6), 0);
    }

    #[test]
    fn test_set_clip_intersects_surface() {
        let mut s = Surface::new(10, 10, PixelFormat::argb8888()).unwrap();
        s.set_clip(Rect::new(-5, 8, 100, 100));
        assert_eq!(s.clip_rect(), Rect::new(0, 8, 10, 2));
    }

    #[test]
    fn test_get_pixel_out_of_bounds() {
        let s = Surface::new(4, 4, PixelFormat::argb8888()).unwrap();
        assert!(matches!(s.get_pixel(4, 0), Err(RasterError::OutOfBounds { x: 4, y: 0 })));
        assert_eq!(s.get_pixel(3, 3).unwrap(), 0);
    }

    #[test]
    fn test_from_pixels_size_check() {
        let r = Surface::from_pixels(4, 4, 16, PixelFormat::argb8888(), vec![0; 10]);
        assert!(matches!(r, Err(RasterError::BufferSize { .. })));
    }

    struct Failing;
    impl LockHook for Failing {
        fn lock(&mut self) -> Result<(), String> {
            Err("busy".into())
        }
        fn unlock(&mut self) {}
    }

    #[test]
    fn test_lock_failure_reported() {
        let mut s = Surface::new(2, 2, PixelFormat::argb8888()).unwrap();
        s.set_lock_hook(Some(Box::new(Failing)));
        assert!(s.must_lock());
        assert_eq!(s.lock().unwrap_err(), "busy");
        assert!(!s.is_locked());
    }

    struct Counting(Rc<std::cell::Cell<(u32, u32)>>);
    impl LockHook for Counting {
        fn lock(&mut self) -> Result<(), String> {
            let (l, u) = self.0.get();
            self.0.set((l + 1, u));
            Ok(())
        }
        fn unlock(&mut self) {
            let (l, u) = self.0.get();
            self.0.set((l, u + 1));
        }
    }

    #[test]
    fn test_nested_locks_hit_hook_once() {
        let calls = Rc::new(std::cell::Cell::new((0, 0)));
        let mut s = Surface::new(2, 2, PixelFormat::argb8888()).unwrap();
        s.set_lock_hook(Some(Box::new(Counting(Rc::clone(&calls)))));
        {
            let _outer = s.lock().unwrap();
            {
                let _inner = s.lock().unwrap();
                assert!(s.is_locked());
            }
            assert!(s.is_locked());
        }
        assert!(!s.is_locked());
        assert_eq!(calls.get(), (1, 1));
    }
}
