//! Software 2D rasterizer
//!
//! Draws pixels, lines, shapes, polygons and transformed surfaces straight
//! into in-memory pixel buffers of 8, 16, 24 or 32 bits per pixel, with
//! alpha blending policies, optional anti-aliasing and dirty-rectangle
//! tracking for partial redraw.
//!
//! ```no_run
//! use rasterkit::{Context, PixelFormat, Surface};
//!
//! let mut surface = Surface::new(320, 240, PixelFormat::argb8888()).unwrap();
//! let mut ctx = Context::new();
//! let white = surface.map_rgb(255, 255, 255);
//! let mut canvas = ctx.canvas(&mut surface);
//! canvas.circle(160, 120, 50.0, white);
//! ```

pub mod config;
pub mod dirty;
pub mod draw;
pub mod error;
pub mod rect;
pub mod surface;
pub mod transform;

#[cfg(feature = "sdl")]
pub mod display;

pub use config::{Context, Override, Scoped, Settings};
pub use dirty::{DirtyTable, DirtyTracker};
pub use draw::{blit_clip, copy_points, rotate_points, scale_points, skew_points, translate_points, Canvas};
pub use error::{ErrorEntry, ErrorQueue, RasterError};
pub use rect::{rect_intersect, rect_union, Point, Rect};
pub use surface::{BlendMode, Color, LockHook, Palette, PixelFormat, Surface, SurfaceLock};
pub use transform::{rotate_surface, transform_surface, TransformFlags};
