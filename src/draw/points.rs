//! In-place transforms of point lists, for building polygons

use crate::rect::Point;

/// Copy as many points as fit from `src` into `dst`; returns the count
pub fn copy_points(src: &[Point], dst: &mut [Point]) -> usize {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

/// Rotate about (cx, cy) by `angle` radians. Use [`Context::to_radians`]
/// to honor the context's angle unit.
///
/// [`Context::to_radians`]: crate::Context::to_radians
pub fn rotate_points(points: &mut [Point], cx: f32, cy: f32, angle: f32) {
    let (st, ct) = angle.sin_cos();
    for p in points {
        let dx = p.x as f32 - cx;
        let dy = p.y as f32 - cy;
        p.x = (dx * ct - dy * st + cx) as i16;
        p.y = (dx * st + dy * ct + cy) as i16;
    }
}

/// Scale distances from (cx, cy)
pub fn scale_points(points: &mut [Point], cx: f32, cy: f32, xscale: f32, yscale: f32) {
    for p in points {
        let dx = p.x as f32 - cx;
        let dy = p.y as f32 - cy;
        p.x = (cx + xscale * dx) as i16;
        p.y = (cy + yscale * dy) as i16;
    }
}

/// Shear: x moves by `xskew` per unit of y distance from the center, and
/// y by `yskew` per unit of x distance
pub fn skew_points(points: &mut [Point], cx: f32, cy: f32, xskew: f32, yskew: f32) {
    for p in points {
        let dx = p.x as f32 - cx;
        let dy = p.y as f32 - cy;
        p.x = (p.x as f32 + xskew * dy) as i16;
        p.y = (p.y as f32 + yskew * dx) as i16;
    }
}

pub fn translate_points(points: &mut [Point], dx: f32, dy: f32) {
    for p in points {
        p.x = (p.x as f32 + dx) as i16;
        p.y = (p.y as f32 + dy) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![Point::new(10, 10), Point::new(20, 10), Point::new(20, 20), Point::new(10, 20)]
    }

    #[test]
    fn test_copy_stops_at_shorter() {
        let src = square();
        let mut dst = [Point::default(); 2];
        assert_eq!(copy_points(&src, &mut dst), 2);
        assert_eq!(dst, [src[0], src[1]]);
    }

    #[test]
    fn test_quarter_turn_about_center() {
        let mut pts = square();
        let before = pts.clone();
        rotate_points(&mut pts, 15.0, 15.0, std::f32::consts::FRAC_PI_2);
        for (p, q) in before.iter().zip(&pts) {
            // (x, y) -> (30 - y, x), give or take truncation
            assert!((q.x - (30 - p.y)).abs() <= 1, "{p:?} -> {q:?}");
            assert!((q.y - p.x).abs() <= 1, "{p:?} -> {q:?}");
        }
    }

    #[test]
    fn test_scale_about_center() {
        let mut pts = square();
        scale_points(&mut pts, 15.0, 15.0, 2.0, 0.5);
        assert_eq!(pts[0], Point::new(5, 12));
        assert_eq!(pts[2], Point::new(25, 17));
    }

    #[test]
    fn test_skew_uses_unskewed_offsets() {
        let mut pts = vec![Point::new(20, 20)];
        skew_points(&mut pts, 10.0, 10.0, 0.5, 1.0);
        assert_eq!(pts[0], Point::new(25, 30));
    }

    #[test]
    fn test_translate() {
        let mut pts = square();
        translate_points(&mut pts, -10.0, 2.5);
        assert_eq!(pts[0], Point::new(0, 12));
        assert_eq!(pts[2], Point::new(10, 22));
    }
}
