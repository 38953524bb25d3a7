//! Pixel buffers: formats, raw access, blending and locking

mod blend;
mod buffer;
mod format;
mod lock;

pub use blend::BlendMode;
pub(crate) use blend::lerp_channel;
pub use buffer::{Surface, MAX_DIMENSION};
pub use format::{Channel, Color, Palette, PixelFormat, ALPHA_OPAQUE, ALPHA_TRANSPARENT};
pub use lock::{LockHook, SurfaceLock};
