//! Drawing entrypoints
//!
//! Every primitive is a method on [`Canvas`], which pairs a surface with the
//! [`Context`] whose stacks and flags steer the call. Each entrypoint locks
//! the surface (unless autolock is off), draws, records its dirty rect and
//! reports failures to the context's error queue instead of returning them.
//!
//! Rasterizers that trace a shape take a plot callback
//! `FnMut(&mut Canvas, x, y, color)` so tracing stays separate from how a
//! point gets written (opaque, blended, or stamped at the current thickness).

mod arc;
mod bezier;
mod blit;
mod circle;
mod clip;
mod ellipse;
mod line;
mod line_aa;
mod pixel;
mod points;
mod polygon;
mod rect;
mod trigon;

pub use blit::blit_clip;
pub use points::{copy_points, rotate_points, scale_points, skew_points, translate_points};

use crate::config::Context;
use crate::dirty::clip_to_screen;
use crate::error::RasterError;
use crate::rect::Rect;
use crate::surface::{Color, Surface, SurfaceLock};

/// A surface bound to a context for drawing
#[derive(Debug)]
pub struct Canvas<'a> {
    surface: &'a mut Surface,
    ctx: &'a mut Context,
}

impl Context {
    /// Bind `surface` for drawing under this context
    pub fn canvas<'a>(&'a mut self, surface: &'a mut Surface) -> Canvas<'a> {
        Canvas::new(surface, self)
    }
}

impl<'a> Canvas<'a> {
    pub fn new(surface: &'a mut Surface, ctx: &'a mut Context) -> Self {
        Self { surface, ctx }
    }

    #[inline]
    pub fn surface(&self) -> &Surface {
        self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut Surface {
        self.surface
    }

    #[inline]
    pub fn context(&self) -> &Context {
        self.ctx
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut Context {
        self.ctx
    }

    /// Safe pixel read. Out-of-range coordinates are reported and read as 0.
    pub fn get_pixel(&mut self, x: i16, y: i16) -> Color {
        match self.surface.get_pixel(x as i32, y as i32) {
            Ok(c) => c,
            Err(e) => {
                self.ctx.report(e);
                0
            },
        }
    }

    // ========================================================================
    // Shared plumbing
    // ========================================================================

    /// Lock for the duration of one entrypoint. `None` means the lock failed
    /// and has been reported; the caller must draw nothing.
    pub(crate) fn acquire(&mut self, op: &'static str) -> Option<SurfaceLock> {
        if !self.ctx.autolock() {
            return Some(SurfaceLock::unlocked());
        }
        match self.surface.lock() {
            Ok(guard) => Some(guard),
            Err(reason) => {
                self.ctx.report(RasterError::LockFailed { op, reason });
                None
            },
        }
    }

    /// Lock a second surface read by the primitive, such as a texture
    pub(crate) fn acquire_source(&mut self, source: &Surface, op: &'static str) -> Option<SurfaceLock> {
        if !self.ctx.autolock() {
            return Some(SurfaceLock::unlocked());
        }
        match source.lock() {
            Ok(guard) => Some(guard),
            Err(reason) => {
                self.ctx.report(RasterError::LockFailed {
                    op,
                    reason: format!("source: {reason}"),
                });
                None
            },
        }
    }

    /// Record `rect` in the front dirty table, clipped to the surface
    pub(crate) fn mark_dirty(&mut self, rect: Rect) {
        if self.ctx.dirty.enabled() {
            let r = clip_to_screen(self.surface.width(), self.surface.height(), rect);
            self.ctx.dirty.add(r);
        }
    }

    /// Record `rect` as given
    pub(crate) fn mark_dirty_unclipped(&mut self, rect: Rect) {
        if self.ctx.dirty.enabled() {
            self.ctx.dirty.add(rect);
        }
    }

    #[inline]
    pub(crate) fn dirty_enabled(&self) -> bool {
        self.ctx.dirty.enabled()
    }

    /// Run a sub-primitive with autolock and dirty tracking suspended; the
    /// caller already holds the lock and records one rect for the whole shape.
    pub(crate) fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let autolock = self.ctx.autolock();
        let dirty = self.ctx.dirty.enabled();
        self.ctx.set_autolock(false);
        self.ctx.dirty.enable(false);
        let out = f(self);
        self.ctx.set_autolock(autolock);
        self.ctx.dirty.enable(dirty);
        out
    }

    /// Run a sub-primitive with autolock suspended only
    pub(crate) fn unlocked<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let autolock = self.ctx.autolock();
        self.ctx.set_autolock(false);
        let out = f(self);
        self.ctx.set_autolock(autolock);
        out
    }

    /// Opaque write inside the clip rectangle
    #[inline]
    pub(crate) fn plot(&mut self, x: i32, y: i32, color: Color) {
        self.surface.put_pixel(x, y, color);
    }

    /// Blend under the current policy inside the clip rectangle. Returns
    /// `false` only when a color-key replacement refused the pixel.
    #[inline]
    pub(crate) fn plot_blend(&mut self, x: i32, y: i32, color: Color, alpha: u8) -> bool {
        if !self.surface.in_clip(x, y) {
            return true;
        }
        let mode = self.ctx.blend();
        self.surface.blend_raw(x, y, color, alpha, mode)
    }

    /// Opaque fill of inclusive corners, clipped
    pub(crate) fn fill_clipped(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let s = &*self.surface;
        let x1 = x1.max(s.clip_xmin());
        let y1 = y1.max(s.clip_ymin());
        let x2 = x2.min(s.clip_xmax());
        let y2 = y2.min(s.clip_ymax());
        if x1 > x2 || y1 > y2 {
            return;
        }
        self.surface.fill_rect_raw(x1, y1, x2, y2, color);
    }
}

/// Plot callbacks passed to the tracing rasterizers
pub(crate) fn plot_opaque(c: &mut Canvas<'_>, x: i16, y: i16, color: Color) {
    c.plot(x as i32, y as i32, color);
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Context;
    use crate::surface::{Color, PixelFormat, Surface};

    pub fn surface(w: u32, h: u32) -> Surface {
        Surface::new(w, h, PixelFormat::argb8888()).unwrap()
    }

    /// Coordinates of every pixel equal to `color`
    pub fn lit(s: &Surface, color: Color) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..s.height() as i32 {
            for x in 0..s.width() as i32 {
                if s.read_raw(x, y) == color {
                    out.push((x, y));
                }
            }
        }
        out
    }

    pub fn context() -> Context {
        Context::new()
    }
}
