use crate::Point;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

/// Planar projective transform `p_img ~ H * p_board`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2], //
            rows[1][0], rows[1][1], rows[1][2], //
            rows[2][0], rows[2][1], rows[2][2],
        ))
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        Point::new(v[0] / v[2], v[1] / v[2])
    }

    /// Homography mapping `src[k]` onto `dst[k]` for four correspondences.
    ///
    /// Corner order must be consistent between `src` and `dst`. Returns
    /// `None` for degenerate configurations (three collinear points).
    pub fn from_4pt(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        // Unknowns [h11 h12 h13 h21 h22 h23 h31 h32], h33 = 1:
        // h11 x + h12 y + h13 - u h31 x - u h32 y = u
        // h21 x + h22 y + h23 - v h31 x - v h32 y = v
        let (src_n, t_src) = normalize4(src);
        let (dst_n, t_dst) = normalize4(dst);

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for k in 0..4 {
            let (x, y) = (src_n[k].x, src_n[k].y);
            let (u, v) = (dst_n[k].x, dst_n[k].y);

            let r0 = 2 * k;
            a[(r0, 0)] = x;
            a[(r0, 1)] = y;
            a[(r0, 2)] = 1.0;
            a[(r0, 6)] = -u * x;
            a[(r0, 7)] = -u * y;
            b[r0] = u;

            let r1 = r0 + 1;
            a[(r1, 3)] = x;
            a[(r1, 4)] = y;
            a[(r1, 5)] = 1.0;
            a[(r1, 6)] = -v * x;
            a[(r1, 7)] = -v * y;
            b[r1] = v;
        }

        let x = a.lu().solve(&b)?;
        let hn = Matrix3::new(
            x[0], x[1], x[2], //
            x[3], x[4], x[5], //
            x[6], x[7], 1.0,
        );

        // H = T_dst^-1 * Hn * T_src, scaled so h33 = 1.
        let h = t_dst.try_inverse()? * hn * t_src;
        let s = h[(2, 2)];
        if s.abs() < 1e-12 {
            return None;
        }
        Some(Self::new(h / s))
    }
}

/// Hartley normalization: centroid to origin, mean distance `sqrt(2)`.
fn normalize4(pts: &[Point; 4]) -> ([Point; 4], Matrix3<f64>) {
    let c = pts.iter().fold(Vector3::zeros(), |acc, p| {
        acc + Vector3::new(p.x, p.y, 0.0)
    }) / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - c.x).powi(2) + (p.y - c.y).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * c.x, 0.0, s, -s * c.y, 0.0, 0.0, 1.0);
    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        Point::new(v[0], v[1])
    });
    (out, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_close(a: Point, b: Point, tol: f64) {
        assert!(
            (a - b).norm() < tol,
            "expected ({:.6},{:.6}) ~ ({:.6},{:.6}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    #[test]
    fn four_point_solution_recovers_ground_truth() {
        let truth = Homography::from_array([
            [0.8, 0.05, 120.0],
            [-0.02, 1.1, 80.0],
            [0.0009, -0.0004, 1.0],
        ]);
        let src = [
            Point::new(0.0, 0.0),
            Point::new(180.0, 0.0),
            Point::new(180.0, 130.0),
            Point::new(0.0, 130.0),
        ];
        let dst = src.map(|p| truth.apply(p));
        let est = Homography::from_4pt(&src, &dst).expect("solvable");
        for p in [Point::new(10.0, 10.0), Point::new(90.0, 65.0)] {
            assert_close(est.apply(p), truth.apply(p), 1e-6);
        }
    }

    #[test]
    fn maps_unit_square_onto_quad() {
        let quad = [
            Point::new(80.0, 110.0),
            Point::new(430.0, 70.0),
            Point::new(460.0, 440.0),
            Point::new(50.0, 420.0),
        ];
        let square = [
            Point::new(0.0, 0.0),
            Point::new(8.0, 0.0),
            Point::new(8.0, 8.0),
            Point::new(0.0, 8.0),
        ];
        let h = Homography::from_4pt(&square, &quad).expect("solvable");
        for (s, q) in square.iter().zip(&quad) {
            assert_close(h.apply(*s), *q, 1e-9);
        }
        let back = Homography::from_4pt(&quad, &square).expect("solvable");
        assert_close(back.apply(quad[2]), square[2], 1e-9);
        assert_relative_eq!(h.h[(2, 2)], 1.0);
    }

    #[test]
    fn collinear_points_are_rejected() {
        let src = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        assert!(Homography::from_4pt(&src, &src).is_none());
    }
}
