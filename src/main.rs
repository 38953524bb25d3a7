//! Interactive demo: a static scene drawn once, animated shapes redrawn
//! through dirty rectangles each frame.

use std::time::Instant;

use log::{error, info, warn};
use rasterkit::display::{Frame, Input, Presenter, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use rasterkit::{rotate_points, Context, Override, PixelFormat, Point, Rect, Settings, Surface, TransformFlags};
use sdl2::keyboard::Keycode;

struct Args {
    width: u32,
    height: u32,
    vsync: bool,
    settings: Option<String>,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut out = Args {
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        vsync: true,
        settings: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => out.vsync = false,
            "--resolution" | "-r" => {
                if let Some((w, h)) = args.get(i + 1).and_then(|v| v.split_once('x')) {
                    if let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) {
                        out.width = w;
                        out.height = h;
                    }
                    i += 1;
                }
            },
            "--settings" | "-s" => {
                out.settings = args.get(i + 1).cloned();
                i += 1;
            },
            "--help" => {
                println!("Usage: rasterkit-demo [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --resolution WxH, -r WxH  Window size (default {}x{})", DEFAULT_WIDTH, DEFAULT_HEIGHT);
                println!("  --settings FILE, -s FILE  Load context settings from JSON");
                println!("  --no-vsync                Uncapped framerate");
                println!("  --help                    Show this help message");
                println!();
                println!("Keys: A toggles anti-aliasing, Escape quits.");
                std::process::exit(0);
            },
            other => warn!("ignoring argument {}", other),
        }
        i += 1;
    }
    out
}

fn load_settings(path: Option<&str>) -> Settings {
    let mut settings = match path.map(Settings::load) {
        Some(Ok(s)) => s,
        Some(Err(e)) => {
            error!("could not load settings: {}", e);
            Settings::default()
        },
        None => Settings::default(),
    };
    if settings.dirty_capacity == 0 {
        settings.dirty_capacity = 32;
    }
    settings.dirty_enabled = true;
    settings
}

/// Sky gradient, ground and a few fixed shapes
fn draw_scene(ctx: &mut Context, scene: &mut Surface) {
    let (w, h) = (scene.width() as i16, scene.height() as i16);
    let sky = [scene.map_rgb(20, 30, 90), scene.map_rgb(20, 30, 90), scene.map_rgb(200, 120, 60), scene.map_rgb(200, 120, 60)];
    let ground = scene.map_rgb(30, 60, 30);
    let sun = scene.map_rgb(255, 220, 120);
    let hill = scene.map_rgb(40, 90, 40);
    let wire = scene.map_rgb(90, 90, 90);

    let mut c = ctx.canvas(scene);
    let horizon = h * 2 / 3;
    let corners = [Point::new(0, 0), Point::new(w - 1, 0), Point::new(w - 1, horizon), Point::new(0, horizon)];
    c.polygon_fade(&corners, &sky);
    c.rect_filled(0, horizon, w - 1, h - 1, ground);
    c.circle_filled(w * 3 / 4, horizon - 40, 30.0, sun);
    c.trigon_filled([Point::new(20, horizon), Point::new(160, horizon - 90), Point::new(300, horizon)], hill);
    c.bezier(
        Point::new(0, horizon - 20),
        Point::new(w / 3, horizon - 140),
        Point::new(w * 2 / 3, horizon + 60),
        Point::new(w - 1, horizon - 30),
        6,
        wire,
    );
}

/// Small checkered tile to spin
fn make_sprite() -> Result<Surface, rasterkit::RasterError> {
    let mut sprite = Surface::new(48, 48, PixelFormat::argb8888())?;
    let (a, b) = (sprite.map_rgb(230, 60, 60), sprite.map_rgb(250, 250, 250));
    for y in 0..48 {
        for x in 0..48 {
            let c = if (x / 8 + y / 8) % 2 == 0 { a } else { b };
            sprite.write_raw(x, y, c);
        }
    }
    Ok(sprite)
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args = parse_args();

    let (mut display, creator) = Presenter::open("rasterkit", args.width, args.height, args.vsync)?;
    let mut frame = Frame::new(&creator, args.width, args.height)?;

    let mut ctx = Context::with_settings(load_settings(args.settings.as_deref()));
    let mut scene = Surface::new(args.width, args.height, PixelFormat::argb8888()).map_err(|e| e.to_string())?;
    let mut screen = Surface::new(args.width, args.height, PixelFormat::argb8888()).map_err(|e| e.to_string())?;
    let sprite = make_sprite().map_err(|e| e.to_string())?;

    screen.fill(0xFF00_0000);
    ctx.dirty_mut().enable(false);
    draw_scene(&mut ctx, &mut scene);
    ctx.canvas(&mut screen).blend_blit(&scene, None, None);
    ctx.dirty_mut().enable(true);
    display.present(&mut frame, &screen)?;
    info!("scene ready, {}x{}", args.width, args.height);

    let ball = screen.map_rgb(80, 160, 255);
    let star = screen.map_rgb(255, 255, 0);
    let (cx, cy) = (args.width as f32 / 2.0, args.height as f32 / 3.0);
    let start = Instant::now();
    let mut drawn: Vec<Rect> = Vec::new();
    let mut aa = ctx.anti_alias();

    'main: loop {
        for input in display.poll() {
            match input {
                Input::Quit | Input::Key(Keycode::Escape) => break 'main,
                Input::Key(Keycode::A) => {
                    aa = !aa;
                    info!("anti-aliasing {}", if aa { "on" } else { "off" });
                },
                Input::Key(_) => {},
            }
        }
        let t = start.elapsed().as_secs_f32();

        // Restore the background under last frame's shapes; the back table
        // still covers those areas, so they need no new dirty rects
        ctx.dirty_mut().enable(false);
        for r in &drawn {
            ctx.canvas(&mut screen).blend_blit(&scene, Some(*r), Some(*r));
        }
        ctx.dirty_mut().enable(true);

        let flags = if aa { TransformFlags::AA } else { TransformFlags::empty() };
        {
            let mut scoped = ctx.scoped(Override::AntiAlias(aa));
            let mut c = scoped.canvas(&mut screen);
            let pivot = Point::new(24, 24);
            let at = Point::new((cx + 120.0 * t.cos()) as i16, (cy + 40.0 * (t * 2.0).sin()) as i16);
            c.transform(&sprite, t * 60.0, 1.0 + 0.3 * t.sin(), 1.0 + 0.3 * t.sin(), pivot, at, flags);

            let bx = (cx - 150.0 + 100.0 * (t * 1.3).sin()) as i16;
            let by = (cy + 120.0 - 60.0 * (t * 2.6).sin().abs()) as i16;
            c.circle_filled_blend(bx, by, 18.0, ball, 170);

            let mut points: Vec<Point> = (0..10)
                .map(|i| {
                    let r = if i % 2 == 0 { 36.0 } else { 15.0 };
                    let a = i as f32 * std::f32::consts::PI / 5.0;
                    Point::new((cx + 180.0 + r * a.cos()) as i16, (cy + 140.0 + r * a.sin()) as i16)
                })
                .collect();
            rotate_points(&mut points, cx + 180.0, cy + 140.0, t);
            c.polygon_filled(&points, star);
        }

        drawn = ctx.dirty().front().map(|f| f.rects().to_vec()).unwrap_or_default();
        let mut refresh = Vec::new();
        ctx.dirty_mut().update(|r| refresh.push(*r));
        display.present_rects(&mut frame, &screen, &refresh)?;
        ctx.dirty_mut().swap();

        while let Some(msg) = ctx.pop_error() {
            warn!("{}", msg);
        }
    }

    Ok(())
}
