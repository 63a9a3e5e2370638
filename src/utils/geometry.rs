//! Perspective transforms between module space and image space.

use crate::models::Point;
use crate::models::point::cross;

/// Projective map stored as a row-major 3x3 homogeneous matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    m: [f64; 9],
}

impl PerspectiveTransform {
    /// Transform taking each `src[i]` to `dst[i]`.
    ///
    /// `None` when either quadrilateral is degenerate (three collinear
    /// corners) or the linear system is singular.
    pub fn from_points(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        if is_degenerate(src) || is_degenerate(dst) {
            return None;
        }

        // Direct linear transform: 8 equations in the 8 unknowns m[0..8]
        let mut a = [[0.0f64; 8]; 8];
        let mut b = [0.0f64; 8];
        for i in 0..4 {
            let (sx, sy) = (src[i].x as f64, src[i].y as f64);
            let (dx, dy) = (dst[i].x as f64, dst[i].y as f64);
            let row = i * 2;
            a[row] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy];
            b[row] = dx;
            a[row + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -dy * sx, -dy * sy];
            b[row + 1] = dy;
        }

        let s = solve_linear_system(a, b)?;
        Some(Self {
            m: [s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7], 1.0],
        })
    }

    /// Apply the map; `None` for points on the line at infinity
    pub fn transform(&self, p: &Point) -> Option<Point> {
        self.transform_f64(p.x as f64, p.y as f64)
            .map(|(x, y)| Point::new(x as f32, y as f32))
    }

    /// Apply the map in double precision
    #[inline]
    pub fn transform_f64(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let m = &self.m;
        let w = m[6] * x + m[7] * y + m[8];
        if w.abs() < 1e-12 {
            return None;
        }
        Some(((m[0] * x + m[1] * y + m[2]) / w, (m[3] * x + m[4] * y + m[5]) / w))
    }

    /// Inverse map, `None` if singular
    pub fn inverse(&self) -> Option<Self> {
        let m = &self.m;
        let c00 = m[4] * m[8] - m[5] * m[7];
        let c01 = m[5] * m[6] - m[3] * m[8];
        let c02 = m[3] * m[7] - m[4] * m[6];
        let det = m[0] * c00 + m[1] * c01 + m[2] * c02;
        if det.abs() < 1e-12 {
            return None;
        }
        let adj = [
            c00,
            m[2] * m[7] - m[1] * m[8],
            m[1] * m[5] - m[2] * m[4],
            c01,
            m[0] * m[8] - m[2] * m[6],
            m[2] * m[3] - m[0] * m[5],
            c02,
            m[1] * m[6] - m[0] * m[7],
            m[0] * m[4] - m[1] * m[3],
        ];
        let mut inv = [0.0; 9];
        for (dst, v) in inv.iter_mut().zip(adj.iter()) {
            *dst = v / det;
        }
        Some(Self { m: inv })
    }
}

fn is_degenerate(quad: &[Point; 4]) -> bool {
    let scale = quad
        .iter()
        .flat_map(|p| [p.x.abs(), p.y.abs()])
        .fold(1.0f32, f32::max);
    let eps = 1e-4 * scale * scale;
    (0..4).any(|i| {
        let a = &quad[i];
        let b = &quad[(i + 1) % 4];
        let c = &quad[(i + 2) % 4];
        cross(a, b, c).abs() < eps
    })
}

/// Solve 8x8 linear system using Gaussian elimination with partial pivoting
#[allow(clippy::needless_range_loop)]
fn solve_linear_system(mut a: [[f64; 8]; 8], mut b: [f64; 8]) -> Option<[f64; 8]> {
    let n = 8;

    for i in 0..n {
        let mut max_row = i;
        for k in (i + 1)..n {
            if a[k][i].abs() > a[max_row][i].abs() {
                max_row = k;
            }
        }
        if a[max_row][i].abs() < 1e-12 {
            return None;
        }
        a.swap(i, max_row);
        b.swap(i, max_row);

        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            b[k] -= factor * b[i];
            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }
    Some(x)
}

/// Cosine of the angle at `vertex` between the rays to `p1` and `p2`
pub fn corner_cosine(vertex: &Point, p1: &Point, p2: &Point) -> f32 {
    let v1 = vertex.to(p1);
    let v2 = vertex.to(p2);
    let denom = (v1.x * v1.x + v1.y * v1.y).sqrt() * (v2.x * v2.x + v2.y * v2.y).sqrt();
    if denom <= f32::EPSILON {
        return 1.0;
    }
    (v1.x * v2.x + v1.y * v2.y) / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f32) -> [Point; 4] {
        [
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn test_perspective_transform_scale() {
        let t = PerspectiveTransform::from_points(&square(100.0), &square(50.0)).unwrap();
        let p = t.transform(&Point::new(50.0, 50.0)).unwrap();
        assert!((p.x - 25.0).abs() < 1e-3 && (p.y - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_maps_corners_and_inverts() {
        let dst = [
            Point::new(10.0, 12.0),
            Point::new(120.0, 20.0),
            Point::new(110.0, 140.0),
            Point::new(5.0, 100.0),
        ];
        let t = PerspectiveTransform::from_points(&square(21.0), &dst).unwrap();
        for (s, d) in square(21.0).iter().zip(dst.iter()) {
            let p = t.transform(s).unwrap();
            assert!(p.distance(d) < 1e-2);
        }
        let inv = t.inverse().unwrap();
        let back = inv.transform(&Point::new(110.0, 140.0)).unwrap();
        assert!(back.distance(&Point::new(21.0, 21.0)) < 1e-2);
    }

    #[test]
    fn test_singular_is_rejected() {
        let collinear = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(30.0, 0.0),
        ];
        assert!(PerspectiveTransform::from_points(&square(10.0), &collinear).is_none());
    }

    #[test]
    fn test_corner_cosine() {
        let c = corner_cosine(&Point::new(1.0, 0.0), &Point::new(0.0, 0.0), &Point::new(1.0, 1.0));
        assert!(c.abs() < 1e-6);
    }
}
