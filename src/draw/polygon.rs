//! Arbitrary polygons: outlines, even-odd fills and Gouraud fills

use super::pixel::{plot_alpha, stamp, stamp_blend};
use super::trigon::{outline_rect, slope, Vertex};
use super::{plot_opaque, Canvas};
use crate::error::RasterError;
use crate::rect::Point;
use crate::surface::{Color, ALPHA_OPAQUE};

/// Offset making any 16-bit x non-negative before bucketing
const RADIX_BIAS: i32 = 0x7fff;

/// Stable LSD radix sort on a 16-bit key: four passes of 16 buckets
pub(crate) fn radix_sort<T>(items: &mut Vec<T>, key: impl Fn(&T) -> u16) {
    if items.len() < 2 {
        return;
    }
    let mut buckets: [Vec<T>; 16] = Default::default();
    for pass in 0..4 {
        for item in items.drain(..) {
            let digit = (key(&item) >> (4 * pass)) & 0xF;
            buckets[digit as usize].push(item);
        }
        for bucket in &mut buckets {
            items.append(bucket);
        }
    }
}

/// One polygon side, stored top to bottom
#[derive(Debug, Clone, Copy)]
struct Edge<const N: usize> {
    top: Vertex<N>,
    bottom: Vertex<N>,
    dx: i32,
    dat: [i32; N],
}

/// Where an edge meets a scanline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Crossing<const N: usize> {
    pub x: i32,
    pub at: [i32; N],
    /// `Some(true)` on the edge's top vertex, `Some(false)` on its bottom one
    vertex: Option<bool>,
}

impl<const N: usize> Edge<N> {
    fn new(a: Vertex<N>, b: Vertex<N>) -> Self {
        let (top, bottom) = if a.y > b.y { (b, a) } else { (a, b) };
        let dy = bottom.y - top.y;
        let step = |p: i32, q: i32| if dy != 0 { slope(p, q, dy) } else { 0 };
        Self {
            top,
            bottom,
            dx: step(top.x, bottom.x),
            dat: std::array::from_fn(|i| step(top.at[i], bottom.at[i])),
        }
    }

    fn crossing(&self, y: i32) -> Option<Crossing<N>> {
        if self.top.y == self.bottom.y || y < self.top.y || y > self.bottom.y {
            return None;
        }
        let k = (y - self.top.y) as i64;
        let eval = |start: i32, step: i32| ((((start as i64) << 16) + k * step as i64) >> 16) as i32;
        let vertex = if y == self.top.y {
            Some(true)
        } else if y == self.bottom.y {
            Some(false)
        } else {
            None
        };
        Some(Crossing {
            x: eval(self.top.x, self.dx),
            at: std::array::from_fn(|i| eval(self.top.at[i], self.dat[i])),
            vertex,
        })
    }
}

/// Per-call edge arena
#[derive(Debug)]
struct EdgeTable<const N: usize> {
    edges: Vec<Edge<N>>,
    ymin: i32,
    ymax: i32,
}

impl<const N: usize> EdgeTable<N> {
    /// Close the outline through `points`; `attr` gives each corner's attributes
    fn new(points: &[Point], attr: impl Fn(usize) -> [i32; N]) -> Self {
        let n = points.len();
        let corner = |i: usize| Vertex::new(points[i], attr(i));
        let edges: Vec<Edge<N>> = (0..n).map(|i| Edge::new(corner(i), corner((i + 1) % n))).collect();
        let ymin = points.iter().map(|p| p.y as i32).min().unwrap_or(0);
        let ymax = points.iter().map(|p| p.y as i32).max().unwrap_or(-1);
        Self { edges, ymin, ymax }
    }

    /// Walk every scanline, calling `span(y, left, right)` for each filled
    /// pair of crossings in left-to-right order
    fn scan(&self, mut span: impl FnMut(i32, &Crossing<N>, &Crossing<N>)) {
        let mut active = Vec::with_capacity(self.edges.len());
        for y in self.ymin..=self.ymax {
            active.clear();
            active.extend(self.edges.iter().filter_map(|e| e.crossing(y)));
            radix_sort(&mut active, |c| (c.x + RADIX_BIAS) as u16);

            let mut left: Option<Crossing<N>> = None;
            let mut i = 0;
            while i < active.len() {
                if i + 1 < active.len() && shares_vertex(&active[i], &active[i + 1]) {
                    active.remove(i + 1);
                }
                let c = active[i];
                match left.take() {
                    None => left = Some(c),
                    Some(l) => span(y, &l, &c),
                }
                i += 1;
            }
        }
    }
}

/// Adjacent crossings through one vertex where one edge ends and the other
/// begins count once
fn shares_vertex<const N: usize>(a: &Crossing<N>, b: &Crossing<N>) -> bool {
    matches!((a.vertex, b.vertex), (Some(p), Some(q)) if p != q)
}

/// Outline segments from the last point around to itself
fn sides(points: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[(i + n - 1) % n], points[i]))
}

impl Canvas<'_> {
    fn check_points(&mut self, points: &[Point], op: &'static str) -> bool {
        if points.len() < 3 {
            self.ctx.report(RasterError::TooFewPoints { op, n: points.len() });
            return false;
        }
        true
    }

    pub fn polygon(&mut self, points: &[Point], color: Color) {
        self.polygon_outline(points, color, None, "polygon");
    }

    pub fn polygon_blend(&mut self, points: &[Point], color: Color, alpha: u8) {
        self.polygon_outline(points, color, Some(alpha), "polygon_blend");
    }

    fn polygon_outline(&mut self, points: &[Point], color: Color, alpha: Option<u8>, op: &'static str) {
        if !self.check_points(points, op) {
            return;
        }
        let Some(_lock) = self.acquire(op) else {
            return;
        };
        let th = self.ctx.thickness();
        let aa = self.ctx.anti_alias();
        for (p, q) in sides(points) {
            let (x1, y1, x2, y2) = (p.x as i32, p.y as i32, q.x as i32, q.y as i32);
            match (th, alpha) {
                (0, _) => return,
                (1, _) if aa => self.line_aa_raw(x1, y1, x2, y2, color, alpha.unwrap_or(ALPHA_OPAQUE)),
                (1, None) => self.bresenham(x1, y1, x2, y2, color),
                (1, Some(a)) => self.bresenham_blend(x1, y1, x2, y2, color, a),
                (_, None) => self.line_fn(p.x, p.y, q.x, q.y, color, stamp),
                (_, Some(a)) => self.line_fn(p.x, p.y, q.x, q.y, color, stamp_blend(a)),
            }
        }
        self.mark_dirty(outline_rect(points, th));
    }

    /// Even-odd fill. Anti-aliased edges when the context says so.
    pub fn polygon_filled(&mut self, points: &[Point], color: Color) {
        let aa = self.ctx.anti_alias();
        self.polygon_fill(points, color, ALPHA_OPAQUE, aa, "polygon_filled");
    }

    pub fn polygon_filled_blend(&mut self, points: &[Point], color: Color, alpha: u8) {
        self.polygon_fill(points, color, alpha, false, "polygon_filled_blend");
    }

    /// Opaque fills trace the outline first and fill strictly inside it;
    /// blended fills cover each row once from crossing to crossing.
    fn polygon_fill(&mut self, points: &[Point], color: Color, alpha: u8, aa: bool, op: &'static str) {
        if !self.check_points(points, op) {
            return;
        }
        let Some(_lock) = self.acquire(op) else {
            return;
        };
        let table = EdgeTable::<0>::new(points, |_| []);
        let opaque = alpha == ALPHA_OPAQUE;
        if opaque {
            for e in &table.edges {
                let (a, b) = (e.top, e.bottom);
                if aa {
                    self.line_aa_raw(a.x, a.y, b.x, b.y, color, ALPHA_OPAQUE);
                } else {
                    self.bresenham(a.x, a.y, b.x, b.y, color);
                }
            }
        }
        table.scan(|y, l, r| {
            if opaque {
                if r.x > l.x {
                    self.span(l.x + 1, y, r.x, color);
                }
            } else {
                self.span_blend(l.x, y, r.x, color, alpha);
            }
        });
        self.mark_dirty(outline_rect(points, 1));
    }

    /// Gouraud-shaded polygon, one color per point
    pub fn polygon_fade(&mut self, points: &[Point], colors: &[Color]) {
        let aa = self.ctx.anti_alias();
        self.polygon_shade(points, colors, ALPHA_OPAQUE, aa, "polygon_fade");
    }

    pub fn polygon_fade_blend(&mut self, points: &[Point], colors: &[Color], alpha: u8) {
        self.polygon_shade(points, colors, alpha, false, "polygon_fade_blend");
    }

    fn polygon_shade(&mut self, points: &[Point], colors: &[Color], alpha: u8, aa: bool, op: &'static str) {
        if !self.check_points(points, op) {
            return;
        }
        if colors.len() < points.len() {
            self.ctx.report(RasterError::TooFewColors {
                op,
                n: points.len(),
                colors: colors.len(),
            });
            return;
        }
        let Some(_lock) = self.acquire(op) else {
            return;
        };
        let fmt = self.surface.format();
        let table = EdgeTable::<3>::new(points, |i| {
            let (r, g, b) = fmt.get_rgb(colors[i]);
            [r as i32, g as i32, b as i32]
        });
        let rgb = |c: &Canvas<'_>, at: [i32; 3]| c.surface.map_rgb(at[0] as u8, at[1] as u8, at[2] as u8);
        let opaque = alpha == ALPHA_OPAQUE;

        if opaque {
            for e in &table.edges {
                let (a, b) = (e.top, e.bottom);
                let (ca, cb) = (rgb(self, a.at), rgb(self, b.at));
                if aa {
                    self.line_fade_aa_raw(a.x, a.y, b.x, b.y, (ca, ALPHA_OPAQUE), (cb, ALPHA_OPAQUE));
                } else {
                    let (x1, y1, x2, y2) = (a.x as i16, a.y as i16, b.x as i16, b.y as i16);
                    self.line_fade_fn(x1, y1, x2, y2, ca, cb, plot_opaque);
                }
            }
        }
        table.scan(|y, l, r| {
            if opaque {
                if r.x > l.x {
                    let from = Vertex { x: l.x + 1, y, at: l.at };
                    let to = Vertex { x: r.x, y, at: r.at };
                    self.span_fade(from, to);
                }
            } else {
                let (cl, cr) = (rgb(self, l.at), rgb(self, r.at));
                let (x1, x2, y) = (l.x as i16, r.x as i16, y as i16);
                self.line_fade_fn(x1, y, x2, y, cl, cr, plot_alpha(alpha));
            }
        });
        self.mark_dirty(outline_rect(points, 1));
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::rect::Rect;
    use crate::surface::Surface;

    const C: Color = 0xFF40_8020;

    fn poly(v: &[(i16, i16)]) -> Vec<Point> {
        v.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn row(s: &Surface, y: i32, color: Color) -> Vec<i32> {
        (0..s.width() as i32).filter(|&x| s.read_raw(x, y) == color).collect()
    }

    #[test]
    fn test_radix_sort_orders_signed_keys_stably() {
        let mut v = vec![(5, 'a'), (-3, 'b'), (300, 'c'), (5, 'd'), (-32000, 'e'), (0, 'f')];
        radix_sort(&mut v, |&(x, _)| (x + RADIX_BIAS) as u16);
        let tags: String = v.iter().map(|&(_, t)| t).collect();
        assert_eq!(tags, "ebfadc");
    }

    #[test]
    fn test_too_few_points_reports_and_draws_nothing() {
        let mut s = surface(16, 16);
        let mut ctx = context();
        ctx.canvas(&mut s).polygon_filled(&poly(&[(1, 1), (9, 9)]), C);
        assert!(lit(&s, C).is_empty());
        let msg = ctx.pop_error().unwrap();
        assert!(msg.contains("polygon_filled given n < 3 (n = 2)"), "{msg}");
    }

    #[test]
    fn test_filled_rectangle() {
        let mut s = surface(16, 16);
        let mut ctx = context();
        ctx.canvas(&mut s).polygon_filled(&poly(&[(2, 2), (10, 2), (10, 8), (2, 8)]), C);
        assert_eq!(lit(&s, C).len(), 9 * 7);
        assert_eq!(row(&s, 5, C), (2..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_concave_notch_left_open() {
        let mut s = surface(24, 16);
        let mut ctx = context();
        // A U shape opening upward
        let u = poly(&[(2, 2), (8, 2), (8, 8), (14, 8), (14, 2), (20, 2), (20, 12), (2, 12)]);
        ctx.canvas(&mut s).polygon_filled(&u, C);
        let r = row(&s, 5, C);
        assert!(r.contains(&4) && r.contains(&17));
        assert!(!r.contains(&11));
        assert_eq!(row(&s, 10, C), (2..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_shared_vertex_counted_once() {
        let mut s = surface(20, 20);
        let mut ctx = context();
        // Diamond: the side corners are where one edge ends and the next begins
        ctx.canvas(&mut s).polygon_filled(&poly(&[(10, 2), (16, 8), (10, 14), (4, 8)]), C);
        assert_eq!(row(&s, 8, C), (4..=16).collect::<Vec<_>>());
    }

    #[test]
    fn test_filled_blend_touches_each_pixel_once() {
        let mut s = surface(16, 16);
        s.fill(0xFF00_0000);
        let mut ctx = context();
        let sq = poly(&[(2, 2), (12, 2), (12, 12), (2, 12)]);
        ctx.canvas(&mut s).polygon_filled_blend(&sq, 0xFFFF_FFFF, 128);
        for (x, y) in [(2, 2), (7, 7), (12, 11)] {
            let (r, ..) = s.get_rgba(s.read_raw(x, y));
            assert_eq!(r, 127, "({x}, {y})");
        }
    }

    #[test]
    fn test_outline_hits_every_corner() {
        let mut s = surface(20, 20);
        let mut ctx = context();
        let pts = poly(&[(1, 1), (18, 3), (12, 17), (3, 10)]);
        ctx.canvas(&mut s).polygon(&pts, C);
        let lit = lit(&s, C);
        for p in &pts {
            assert!(lit.contains(&(p.x as i32, p.y as i32)), "{p:?}");
        }
    }

    #[test]
    fn test_fade_corner_colors() {
        let mut s = surface(20, 20);
        let mut ctx = context();
        let pts = poly(&[(1, 1), (18, 1), (18, 18), (1, 18)]);
        let colors = [0xFFFF_0000, 0xFF00_FF00, 0xFF00_00FF, 0xFFFF_FFFF];
        ctx.canvas(&mut s).polygon_fade(&pts, &colors);
        assert_eq!(s.read_raw(1, 1), 0xFFFF_0000);
        let (r, _, b, _) = s.get_rgba(s.read_raw(18, 18));
        assert!(b == 255 && r < 40, "{r} {b}");
        let (r, g, b, _) = s.get_rgba(s.read_raw(9, 9));
        assert!(r > 40 && g > 40 && b > 40, "{r} {g} {b}");
    }

    #[test]
    fn test_fade_needs_a_color_per_point() {
        let mut s = surface(8, 8);
        let mut ctx = context();
        ctx.canvas(&mut s).polygon_fade(&poly(&[(0, 0), (5, 0), (0, 5)]), &[C, C]);
        assert!(lit(&s, C).is_empty());
        assert_eq!(ctx.error_count(), 1);
    }

    #[test]
    fn test_dirty_rect_is_bounding_box() {
        let mut s = surface(32, 32);
        let mut ctx = context();
        ctx.dirty_mut().init(8);
        ctx.dirty_mut().enable(true);
        ctx.canvas(&mut s).polygon_filled(&poly(&[(4, 6), (20, 3), (11, 25)]), C);
        assert_eq!(ctx.dirty().front().unwrap().rects(), &[Rect::new(4, 3, 17, 23)]);
    }
}
