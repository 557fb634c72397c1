use crate::Point;

/// Euclidean distance between two points.
#[inline]
pub fn distance(p1: Point, p2: Point) -> f64 {
    (p2 - p1).norm()
}

/// Estimate the point that follows `points` along their common line.
///
/// The sequence is assumed to be equally spaced on the board, so in the
/// image consecutive gaps shrink or grow by a constant factor. That factor
/// `r` is the mean of the ratios between consecutive gaps. The whole span
/// `S` from the first to the last point is the geometric series
/// `g0 * (1 + r + … + r^(n-1))`, which gives the first gap `g0` and hence
/// the next gap `g0 * r^n`. The result lies on the first→last line at
/// `t = (S + g0 * r^n) / S`.
///
/// Degenerate inputs resolve locally instead of failing:
/// - `r == 1` exactly (the series sum is `0/0`) is nudged to the next
///   representable value above one, which yields the arithmetic step;
/// - zero-length gaps are skipped when averaging ratios; with no usable
///   ratio the sequence is treated as arithmetic;
/// - a zero span (or fewer than two points) returns the last point.
pub fn extrapolate_perspective(points: &[Point]) -> Point {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Point::origin();
    };
    if points.len() < 2 {
        return last;
    }

    let gaps: Vec<f64> = points.windows(2).map(|w| distance(w[0], w[1])).collect();
    let ratios: Vec<f64> = gaps
        .windows(2)
        .filter(|g| g[0] > 0.0)
        .map(|g| g[1] / g[0])
        .collect();

    let mut ratio = if ratios.is_empty() {
        1.0
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    };
    if ratio == 1.0 {
        ratio = ratio.next_up();
    }

    let span = distance(first, last);
    if span <= 0.0 {
        return last;
    }

    let n = gaps.len() as i32;
    let rn = ratio.powi(n);
    let next_gap = span * (1.0 - ratio) / (1.0 - rn) * rn;
    let t = (span + next_gap) / span;

    Point::from((1.0 - t) * first.coords + t * last.coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn along(origin: Point, dir: Vector2<f64>, offsets: &[f64]) -> Vec<Point> {
        let dir = dir.normalize();
        offsets.iter().map(|&s| origin + dir * s).collect()
    }

    #[test]
    fn distance_is_euclidean() {
        assert_relative_eq!(distance(Point::new(1.0, 1.0), Point::new(4.0, 5.0)), 5.0);
    }

    #[test]
    fn reproduces_fourth_point_of_shrinking_sequence() {
        // gaps 10, 8, 6.4 -> r = 0.8
        let pts = along(
            Point::new(10.0, 20.0),
            Vector2::new(0.6, 0.8),
            &[0.0, 10.0, 18.0, 24.4],
        );
        let next = extrapolate_perspective(&pts[..3]);
        assert_relative_eq!(next.x, pts[3].x, epsilon = 1e-9);
        assert_relative_eq!(next.y, pts[3].y, epsilon = 1e-9);
    }

    #[test]
    fn reproduces_next_point_of_growing_sequence() {
        // gaps 4, 6, 9, 13.5 -> r = 1.5
        let pts = along(
            Point::new(-3.0, 7.0),
            Vector2::new(1.0, -2.0),
            &[0.0, 4.0, 10.0, 19.0, 32.5],
        );
        let next = extrapolate_perspective(&pts[..4]);
        assert_relative_eq!(next.x, pts[4].x, epsilon = 1e-9);
        assert_relative_eq!(next.y, pts[4].y, epsilon = 1e-9);
    }

    #[test]
    fn reversed_sequence_extrapolates_backwards() {
        let pts = along(
            Point::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            &[0.0, 10.0, 18.0, 24.4],
        );
        let rev: Vec<Point> = pts[1..].iter().rev().copied().collect();
        let prev = extrapolate_perspective(&rev);
        assert_relative_eq!(prev.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(prev.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn arithmetic_sequence_stays_finite() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
        ];
        let next = extrapolate_perspective(&pts);
        assert!(next.x.is_finite() && next.y.is_finite());
        assert_relative_eq!(next.x, 3.0, epsilon = 1e-6);
        assert_relative_eq!(next.y, 0.0);
    }

    #[test]
    fn two_points_continue_arithmetically() {
        let next = extrapolate_perspective(&[Point::new(0.0, 0.0), Point::new(0.0, 5.0)]);
        assert_relative_eq!(next.x, 0.0);
        assert_relative_eq!(next.y, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_windows_do_not_produce_nan() {
        let same = [Point::new(4.0, 4.0); 3];
        assert_eq!(extrapolate_perspective(&same), Point::new(4.0, 4.0));

        let repeated_start = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
        ];
        let p = extrapolate_perspective(&repeated_start);
        assert!(p.x.is_finite() && p.y.is_finite());

        assert_eq!(extrapolate_perspective(&[]), Point::origin());
        assert_eq!(
            extrapolate_perspective(&[Point::new(1.0, 2.0)]),
            Point::new(1.0, 2.0)
        );
    }
}
