//! Window presentation for 32-bit surfaces
//!
//! Copies a [`Surface`] into a streaming texture, either whole or only the
//! rectangles a dirty-tracking pass reports, and flips it to the window.

use log::{debug, info};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect as SdlRect;
use sdl2::render::{Texture, TextureCreator, WindowCanvas};
use sdl2::video::WindowContext;
use sdl2::EventPump;

use crate::rect::Rect;
use crate::surface::Surface;

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Window, renderer and event queue
pub struct Presenter {
    renderer: WindowCanvas,
    events: EventPump,
}

/// Streaming texture matching one surface size
pub struct Frame<'a> {
    texture: Texture<'a>,
    size: (u32, u32),
}

/// What the demo loop cares about from the event queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Quit,
    Key(Keycode),
}

impl Presenter {
    /// Open a centered window. The texture creator outlives every [`Frame`].
    pub fn open(title: &str, width: u32, height: u32, vsync: bool) -> Result<(Self, TextureCreator<WindowContext>), String> {
        let sdl = sdl2::init()?;
        let window = sdl
            .video()?
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let builder = window.into_canvas().accelerated();
        let builder = if vsync { builder.present_vsync() } else { builder };
        let renderer = builder.build().map_err(|e| e.to_string())?;
        info!("window {}x{} open (vsync {})", width, height, vsync);

        let creator = renderer.texture_creator();
        let events = sdl.event_pump()?;
        Ok((Self { renderer, events }, creator))
    }

    /// Upload the whole surface and show it
    pub fn present(&mut self, frame: &mut Frame, surface: &Surface) -> Result<(), String> {
        frame.accepts(surface)?;
        frame
            .texture
            .update(None, surface.pixels(), surface.pitch())
            .map_err(|e| e.to_string())?;
        self.flip(frame)
    }

    /// Upload only `rects` of the surface, then show the texture
    pub fn present_rects(&mut self, frame: &mut Frame, surface: &Surface, rects: &[Rect]) -> Result<(), String> {
        frame.accepts(surface)?;
        let pitch = surface.pitch();
        let bpp = surface.bytes_per_pixel() as usize;
        for r in rects.iter().map(|r| r.intersection(&surface.bounds())) {
            if r.is_empty() {
                continue;
            }
            let start = r.top() as usize * pitch + r.left() as usize * bpp;
            let area = SdlRect::new(r.left(), r.top(), r.w as u32, r.h as u32);
            frame
                .texture
                .update(Some(area), &surface.pixels()[start..], pitch)
                .map_err(|e| e.to_string())?;
        }
        debug!("uploaded {} rects", rects.len());
        self.flip(frame)
    }

    fn flip(&mut self, frame: &Frame) -> Result<(), String> {
        self.renderer.copy(&frame.texture, None, None)?;
        self.renderer.present();
        Ok(())
    }

    /// Drain pending window events
    pub fn poll(&mut self) -> Vec<Input> {
        self.events
            .poll_iter()
            .filter_map(|event| match event {
                Event::Quit { .. } => Some(Input::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => Some(Input::Key(k)),
                _ => None,
            })
            .collect()
    }
}

impl<'a> Frame<'a> {
    /// Texture for `argb8888` surfaces of the given size
    pub fn new(creator: &'a TextureCreator<WindowContext>, width: u32, height: u32) -> Result<Self, String> {
        let texture = creator
            .create_texture_streaming(PixelFormatEnum::ARGB8888, width, height)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            texture,
            size: (width, height),
        })
    }

    fn accepts(&self, surface: &Surface) -> Result<(), String> {
        if surface.bytes_per_pixel() != 4 {
            return Err(format!("cannot present a {}-bit surface", surface.format().bits_per_pixel()));
        }
        let size = (surface.width(), surface.height());
        if size != self.size {
            return Err(format!("surface is {}x{}, frame is {}x{}", size.0, size.1, self.size.0, self.size.1));
        }
        Ok(())
    }
}
