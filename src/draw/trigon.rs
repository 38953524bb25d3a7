//! Triangles and textured quads
//!
//! Filled shapes are scanned top to bottom in 16.16 fixed point. Each edge
//! carries its x plus any per-vertex attributes (RGB for Gouraud shading,
//! texture coordinates for mapping) and every row becomes one span between
//! the two active edges.

use super::pixel::{stamp, stamp_blend};
use super::Canvas;
use crate::rect::{Point, Rect};
use crate::surface::{Color, Surface, ALPHA_OPAQUE};

/// Slope of an edge with no height; never stepped in practice
const FLAT_SLOPE: i32 = 400_000;

/// A corner with `N` interpolated attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Vertex<const N: usize> {
    pub x: i32,
    pub y: i32,
    pub at: [i32; N],
}

impl<const N: usize> Vertex<N> {
    pub fn new(p: Point, at: [i32; N]) -> Self {
        Self {
            x: p.x as i32,
            y: p.y as i32,
            at,
        }
    }
}

/// 16.16 walk down one edge
#[derive(Debug, Clone, Copy)]
struct EdgeWalk<const N: usize> {
    row: i32,
    x: i32,
    dx: i32,
    at: [i32; N],
    dat: [i32; N],
}

pub(crate) fn slope(a: i32, b: i32, dy: i32) -> i32 {
    if dy == 0 {
        return FLAT_SLOPE;
    }
    let s = ((b as i64 - a as i64) << 16) / dy as i64;
    s.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl<const N: usize> EdgeWalk<N> {
    fn new(from: &Vertex<N>, to: &Vertex<N>) -> Self {
        let dy = to.y - from.y;
        Self {
            row: from.y,
            x: from.x << 16,
            dx: slope(from.x, to.x, dy),
            at: from.at.map(|v| v << 16),
            dat: std::array::from_fn(|i| slope(from.at[i], to.at[i], dy)),
        }
    }

    /// Position on row `y`; rows only move forward
    fn at_row(&mut self, y: i32) -> Vertex<N> {
        while self.row < y {
            self.x = self.x.wrapping_add(self.dx);
            for (v, d) in self.at.iter_mut().zip(self.dat) {
                *v = v.wrapping_add(d);
            }
            self.row += 1;
        }
        Vertex {
            x: self.x >> 16,
            y,
            at: self.at.map(|v| v >> 16),
        }
    }
}

/// One side of a convex outline, followed from the top corner to the bottom
struct Chain<'a, const N: usize> {
    v: &'a [Vertex<N>],
    at: usize,
    bottom: usize,
    stride: usize,
    edge: EdgeWalk<N>,
}

impl<'a, const N: usize> Chain<'a, N> {
    fn new(v: &'a [Vertex<N>], top: usize, bottom: usize, stride: usize) -> Self {
        let next = (top + stride) % v.len();
        Self {
            v,
            at: top,
            bottom,
            stride,
            edge: EdgeWalk::new(&v[top], &v[next]),
        }
    }

    fn at_row(&mut self, y: i32) -> Vertex<N> {
        let n = self.v.len();
        loop {
            let next = (self.at + self.stride) % n;
            if next == self.bottom || self.v[next].y > y {
                break;
            }
            self.at = next;
            self.edge = EdgeWalk::new(&self.v[next], &self.v[(next + self.stride) % n]);
        }
        self.edge.at_row(y)
    }
}

/// Scan a convex outline, corners in perimeter order, into rows. `span`
/// gets both ends of each row; they are not ordered in x.
pub(crate) fn scan_convex<const N: usize>(v: &[Vertex<N>], mut span: impl FnMut(Vertex<N>, Vertex<N>)) {
    let Some(top) = (0..v.len()).min_by_key(|&i| v[i].y) else {
        return;
    };
    let Some(bottom) = (0..v.len()).max_by_key(|&i| v[i].y) else {
        return;
    };
    if v[top].y == v[bottom].y {
        let left = (0..v.len()).min_by_key(|&i| v[i].x).unwrap_or(top);
        let right = (0..v.len()).max_by_key(|&i| v[i].x).unwrap_or(top);
        span(v[left], v[right]);
        return;
    }
    let mut fwd = Chain::new(v, top, bottom, 1);
    let mut back = Chain::new(v, top, bottom, v.len() - 1);
    for y in v[top].y..=v[bottom].y {
        span(fwd.at_row(y), back.at_row(y));
    }
}

/// Bounding box of a vertex list, grown by the stamp size for thick strokes
pub(crate) fn outline_rect(points: &[Point], th: u16) -> Rect {
    let Some(first) = points.first() else {
        return Rect::default();
    };
    let (mut xmin, mut ymin) = (first.x as i32, first.y as i32);
    let (mut xmax, mut ymax) = (xmin, ymin);
    for p in &points[1..] {
        xmin = xmin.min(p.x as i32);
        ymin = ymin.min(p.y as i32);
        xmax = xmax.max(p.x as i32);
        ymax = ymax.max(p.y as i32);
    }
    let (w, h) = (xmax - xmin + 1, ymax - ymin + 1);
    if th <= 1 {
        Rect::new(xmin, ymin, w, h)
    } else {
        let t = th as i32;
        Rect::new(xmin - t / 2, ymin - t / 2, w + t, h + t)
    }
}

/// Nearest texel, clamped to the source
#[inline]
fn texel(source: &Surface, sx: i32, sy: i32) -> Color {
    let sx = sx.clamp(0, source.width() as i32 - 1);
    let sy = sy.clamp(0, source.height() as i32 - 1);
    source.read_raw(sx, sy)
}

impl Canvas<'_> {
    // ========================================================================
    // Interpolated spans
    // ========================================================================

    /// Gouraud span between two RGB ends. Unlocked and untracked.
    pub(crate) fn span_fade(&mut self, l: Vertex<3>, r: Vertex<3>) {
        let (l, r) = if l.x > r.x { (r, l) } else { (l, r) };
        let y = l.y;
        let s = &*self.surface;
        if r.x < s.clip_xmin() || l.x > s.clip_xmax() || y < s.clip_ymin() || y > s.clip_ymax() {
            return;
        }
        let n = r.x - l.x + 1;
        let start = l.at.map(|v| v as u8 as i32);
        let end = r.at.map(|v| v as u8 as i32);
        let step: [i32; 3] = std::array::from_fn(|i| slope(start[i], end[i], n));
        let mut acc = start.map(|v| v << 16);

        let mut x1 = l.x;
        if x1 < s.clip_xmin() {
            let skip = s.clip_xmin() - x1;
            for (a, d) in acc.iter_mut().zip(step) {
                *a += skip * d;
            }
            x1 = s.clip_xmin();
        }
        let x2 = r.x.min(s.clip_xmax());

        for x in x1..=x2 {
            let color = self.surface.map_rgb((acc[0] >> 16) as u8, (acc[1] >> 16) as u8, (acc[2] >> 16) as u8);
            self.surface.write_raw(x, y, color);
            for (a, d) in acc.iter_mut().zip(step) {
                *a += d;
            }
        }
    }

    /// Texture-mapped span; texture coordinates ride in `at`. Pixels are
    /// copied as-is when both surfaces share a format and remapped through
    /// RGB otherwise.
    pub(crate) fn span_tex(&mut self, source: &Surface, l: Vertex<2>, r: Vertex<2>) {
        let (l, r) = if l.x > r.x { (r, l) } else { (l, r) };
        let y = l.y;
        let s = &*self.surface;
        if r.x < s.clip_xmin() || l.x > s.clip_xmax() || y < s.clip_ymin() || y > s.clip_ymax() {
            return;
        }
        let n = r.x - l.x + 1;
        let xstep = slope(l.at[0], r.at[0], n);
        let ystep = slope(l.at[1], r.at[1], n);
        let (mut sx, mut sy) = (l.at[0] << 16, l.at[1] << 16);

        let mut x1 = l.x;
        if x1 < s.clip_xmin() {
            let skip = s.clip_xmin() - x1;
            sx += skip * xstep;
            sy += skip * ystep;
            x1 = s.clip_xmin();
        }
        let x2 = r.x.min(s.clip_xmax());
        let same_format = s.format() == source.format();

        for x in x1..=x2 {
            let raw = texel(source, sx >> 16, sy >> 16);
            let color = if same_format {
                raw
            } else {
                let (r, g, b) = source.format().get_rgb(raw);
                self.surface.map_rgb(r, g, b)
            };
            self.surface.write_raw(x, y, color);
            sx += xstep;
            sy += ystep;
        }
    }

    /// Horizontal line shading from `color1` to `color2`. Thick lines go
    /// through [`Self::line_fade`].
    pub fn line_h_fade(&mut self, x1: i16, y: i16, x2: i16, color1: Color, color2: Color) {
        match self.ctx.thickness() {
            0 => {},
            1 => {
                let Some(_lock) = self.acquire("line_h_fade") else {
                    return;
                };
                let rgb = |c: Color| {
                    let (r, g, b) = self.surface.format().get_rgb(c);
                    [r as i32, g as i32, b as i32]
                };
                let (a, b) = (rgb(color1), rgb(color2));
                self.span_fade(Vertex::new(Point::new(x1, y), a), Vertex::new(Point::new(x2, y), b));
                let (lo, hi) = (x1.min(x2) as i32, x1.max(x2) as i32);
                self.mark_dirty(Rect::new(lo, y as i32, hi - lo + 1, 1));
            },
            _ => self.line_fade(x1, y, x2, y, color1, color2),
        }
    }

    /// Horizontal line sampling `source` from `s1` to `s2`
    pub fn line_h_tex(&mut self, x1: i16, y: i16, x2: i16, source: &Surface, s1: Point, s2: Point) {
        if source.width() == 0 || source.height() == 0 {
            return;
        }
        let Some(_lock) = self.acquire("line_h_tex") else {
            return;
        };
        let Some(_src_lock) = self.acquire_source(source, "line_h_tex") else {
            return;
        };
        let l = Vertex::new(Point::new(x1, y), [s1.x as i32, s1.y as i32]);
        let r = Vertex::new(Point::new(x2, y), [s2.x as i32, s2.y as i32]);
        self.span_tex(source, l, r);
        let (lo, hi) = (x1.min(x2) as i32, x1.max(x2) as i32);
        self.mark_dirty(Rect::new(lo, y as i32, hi - lo + 1, 1));
    }

    // ========================================================================
    // Outlines and flat fills
    // ========================================================================

    pub fn trigon(&mut self, v: [Point; 3], color: Color) {
        self.trigon_outline(v, color, None, "trigon");
    }

    pub fn trigon_blend(&mut self, v: [Point; 3], color: Color, alpha: u8) {
        self.trigon_outline(v, color, Some(alpha), "trigon_blend");
    }

    fn trigon_outline(&mut self, v: [Point; 3], color: Color, alpha: Option<u8>, op: &'static str) {
        let Some(_lock) = self.acquire(op) else {
            return;
        };
        let th = self.ctx.thickness();
        let edges = [(v[0], v[1]), (v[0], v[2]), (v[2], v[1])];
        match th {
            0 => return,
            1 => {
                let aa = self.ctx.anti_alias();
                for (p, q) in edges {
                    let (x1, y1, x2, y2) = (p.x as i32, p.y as i32, q.x as i32, q.y as i32);
                    match alpha {
                        _ if aa => self.line_aa_raw(x1, y1, x2, y2, color, alpha.unwrap_or(ALPHA_OPAQUE)),
                        None => self.bresenham(x1, y1, x2, y2, color),
                        Some(a) => self.bresenham_blend(x1, y1, x2, y2, color, a),
                    }
                }
            },
            _ => {
                for (p, q) in edges {
                    match alpha {
                        None => self.line_fn(p.x, p.y, q.x, q.y, color, stamp),
                        Some(a) => self.line_fn(p.x, p.y, q.x, q.y, color, stamp_blend(a)),
                    }
                }
            },
        }
        self.mark_dirty(outline_rect(&v, th));
    }

    pub fn trigon_filled(&mut self, v: [Point; 3], color: Color) {
        self.trigon_fill(v, color, None, "trigon_filled");
    }

    pub fn trigon_filled_blend(&mut self, v: [Point; 3], color: Color, alpha: u8) {
        self.trigon_fill(v, color, Some(alpha), "trigon_filled_blend");
    }

    fn trigon_fill(&mut self, v: [Point; 3], color: Color, alpha: Option<u8>, op: &'static str) {
        let Some(_lock) = self.acquire(op) else {
            return;
        };
        let mut corners = v.map(|p| Vertex::new(p, []));

        if self.ctx.anti_alias() {
            let a = alpha.unwrap_or(ALPHA_OPAQUE);
            for (p, q) in [(0, 1), (1, 2), (2, 0)] {
                let (p, q) = (corners[p], corners[q]);
                self.line_aa_raw(p.x, p.y, q.x, q.y, color, a);
            }
            // Pull every corner one pixel toward the centroid so the fill
            // stays inside the soft edges
            let cx = corners.iter().map(|p| p.x as f32).sum::<f32>() / 3.0;
            let cy = corners.iter().map(|p| p.y as f32).sum::<f32>() / 3.0;
            for p in &mut corners {
                p.x += if cx > p.x as f32 { 1 } else { -1 };
                p.y += if cy > p.y as f32 { 1 } else { -1 };
            }
        }

        scan_convex(&corners, |l, r| match alpha {
            None => self.span(l.x, l.y, r.x, color),
            Some(a) => self.span_blend(l.x, l.y, r.x, color, a),
        });
        self.mark_dirty(outline_rect(&v, 1));
    }

    // ========================================================================
    // Shaded and textured fills
    // ========================================================================

    /// Gouraud-shaded triangle, one color per corner
    pub fn trigon_fade(&mut self, v: [Point; 3], colors: [Color; 3]) {
        let Some(_lock) = self.acquire("trigon_fade") else {
            return;
        };
        let fmt = self.surface.format();
        let corners: [Vertex<3>; 3] = std::array::from_fn(|i| {
            let (r, g, b) = fmt.get_rgb(colors[i]);
            Vertex::new(v[i], [r as i32, g as i32, b as i32])
        });
        scan_convex(&corners, |l, r| self.span_fade(l, r));
        self.mark_dirty(outline_rect(&v, 1));
    }

    /// Triangle mapped from the matching triangle `tex` of `source`
    pub fn trigon_tex(&mut self, v: [Point; 3], source: &Surface, tex: [Point; 3]) {
        if source.width() == 0 || source.height() == 0 {
            return;
        }
        let Some(_lock) = self.acquire("trigon_tex") else {
            return;
        };
        let Some(_src_lock) = self.acquire_source(source, "trigon_tex") else {
            return;
        };
        let corners: [_; 3] = std::array::from_fn(|i| Vertex::new(v[i], [tex[i].x as i32, tex[i].y as i32]));
        scan_convex(&corners, |l, r| self.span_tex(source, l, r));
        self.mark_dirty(outline_rect(&v, 1));
    }

    /// Quadrilateral mapped from `tex` of `source`. Corners pair up by
    /// index; the scan treats the shape as convex.
    pub fn quad_tex(&mut self, v: [Point; 4], source: &Surface, tex: [Point; 4]) {
        if source.width() == 0 || source.height() == 0 {
            return;
        }
        let Some(_lock) = self.acquire("quad_tex") else {
            return;
        };
        let Some(_src_lock) = self.acquire_source(source, "quad_tex") else {
            return;
        };
        let corners: [_; 4] = std::array::from_fn(|i| Vertex::new(v[i], [tex[i].x as i32, tex[i].y as i32]));
        scan_convex(&corners, |l, r| self.span_tex(source, l, r));
        self.mark_dirty(outline_rect(&v, 1));
    }
}
