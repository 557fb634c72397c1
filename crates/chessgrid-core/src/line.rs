//! Slope-intercept lines in image-pixel space.
//!
//! Board lines are fitted as `y = slope * x + intercept`. Files photographed
//! head-on are close to vertical, so every constructor clamps the slope to
//! a finite value instead of producing `inf`/`NaN`.

use crate::Point;
use serde::{Deserialize, Serialize};

/// Slopes with a magnitude below this are treated as near-horizontal and
/// clamped (sign preserved) before an x-intercept is computed.
pub const MIN_SLOPE: f64 = 1e-5;

/// Slope assigned to fits without any x spread (vertical point sets).
pub const MAX_SLOPE: f64 = 1.0 / MIN_SLOPE;

/// Line in slope-intercept form: `y = slope * x + intercept`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub slope: f64,
    pub intercept: f64,
}

impl Line {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    #[inline]
    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Slope with near-zero magnitudes pushed out to `±MIN_SLOPE`.
    #[inline]
    pub fn clamped_slope(&self) -> f64 {
        if self.slope.abs() < MIN_SLOPE {
            MIN_SLOPE.copysign(self.slope)
        } else {
            self.slope
        }
    }

    /// Vertical residual `p.y - y(p.x)`.
    #[inline]
    pub fn residual(&self, p: Point) -> f64 {
        p.y - self.y_at(p.x)
    }
}

/// Finite piece of a line, given by two points on it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }
}

/// Ordinary least-squares line through `points`.
///
/// Never fails: fewer than two points produce a horizontal line through the
/// only point (or the origin), and a set without x spread produces a steep
/// line through the centroid.
pub fn fit_line(points: &[Point]) -> Line {
    let weights = vec![1.0; points.len()];
    crate::robust::fit_line_weighted(points, &weights)
}

/// Two points where `line` crosses the borders of a `width × height` box.
///
/// The first point is the x-intercept on the top edge when it is
/// non-negative, otherwise the crossing with the right edge `x = width`.
/// The second point is the y-intercept on the left edge when it is
/// non-negative, otherwise the crossing with the bottom edge `y = height`.
/// Both always lie on one of the four border lines, although not
/// necessarily within the box extent.
pub fn clip_line_to_rect(line: Line, width: f64, height: f64) -> Segment {
    let slope = line.clamped_slope();
    let y_int = line.intercept;
    let x_int = -y_int / slope;

    let a = if x_int >= 0.0 {
        Point::new(x_int, 0.0)
    } else {
        Point::new(width, slope * width + y_int)
    };
    let b = if y_int >= 0.0 {
        Point::new(0.0, y_int)
    } else {
        Point::new((height - y_int) / slope, height)
    };
    Segment::new(a, b)
}

/// Orthogonal projection of `p` onto the line through the segment ends.
///
/// A zero-length segment has no direction; `p` is returned unchanged.
pub fn nearest_point_on_segment(segment: &Segment, p: Point) -> Point {
    let d = segment.b - segment.a;
    let det = d.norm_squared();
    if det <= f64::EPSILON {
        return p;
    }
    let t = d.dot(&(p - segment.a)) / det;
    segment.a + d * t
}

/// Intersection of two lines, `None` when they are parallel.
pub fn intersect(l1: Line, l2: Line) -> Option<Point> {
    let dm = l2.slope - l1.slope;
    if dm.abs() <= f64::EPSILON * l1.slope.abs().max(l2.slope.abs()).max(1.0) {
        return None;
    }
    let x = (l1.intercept - l2.intercept) / dm;
    Some(Point::new(x, l1.y_at(x)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn on_border(p: Point, w: f64, h: f64) -> bool {
        let eps = 1e-9;
        p.x.abs() < eps || p.y.abs() < eps || (p.x - w).abs() < eps || (p.y - h).abs() < eps
    }

    #[test]
    fn least_squares_recovers_exact_line() {
        let pts: Vec<Point> = (0..6)
            .map(|i| Point::new(i as f64 * 10.0, 0.25 * i as f64 * 10.0 + 4.0))
            .collect();
        let l = fit_line(&pts);
        assert_relative_eq!(l.slope, 0.25, epsilon = 1e-12);
        assert_relative_eq!(l.intercept, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn least_squares_is_finite_for_vertical_points() {
        let pts = [
            Point::new(7.0, 1.0),
            Point::new(7.0, 5.0),
            Point::new(7.0, 9.0),
        ];
        let l = fit_line(&pts);
        assert!(l.slope.is_finite() && l.intercept.is_finite());
        assert!(l.slope.abs() >= MAX_SLOPE * 0.5);
    }

    #[test]
    fn clipped_points_lie_on_rectangle_border() {
        let (w, h) = (500.0, 400.0);
        let lines = [
            Line::new(0.5, -20.0),
            Line::new(-0.3, 40.0),
            Line::new(2.0, 15.0),
            Line::new(-1.5, -30.0),
            Line::new(0.0, 120.0),
            Line::new(-0.0, -5.0),
            Line::new(1e-9, 250.0),
        ];
        for line in lines {
            let s = clip_line_to_rect(line, w, h);
            assert!(on_border(s.a, w, h), "{line:?} -> {:?}", s.a);
            assert!(on_border(s.b, w, h), "{line:?} -> {:?}", s.b);
            assert!(s.a.x.is_finite() && s.a.y.is_finite());
            assert!(s.b.x.is_finite() && s.b.y.is_finite());
        }
    }

    #[test]
    fn clipping_uses_intercepts_when_non_negative() {
        let s = clip_line_to_rect(Line::new(-0.3, 40.0), 500.0, 500.0);
        assert_relative_eq!(s.a.x, 40.0 / 0.3, epsilon = 1e-9);
        assert_relative_eq!(s.a.y, 0.0);
        assert_relative_eq!(s.b.x, 0.0);
        assert_relative_eq!(s.b.y, 40.0);

        let s = clip_line_to_rect(Line::new(0.5, -20.0), 500.0, 500.0);
        assert_relative_eq!(s.a.x, 40.0, epsilon = 1e-9);
        assert_relative_eq!(s.b.x, 1040.0, epsilon = 1e-9);
        assert_relative_eq!(s.b.y, 500.0);
    }

    #[test]
    fn projection_onto_segment_line() {
        let seg = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let p = nearest_point_on_segment(&seg, Point::new(10.0, 0.0));
        assert_relative_eq!(p.x, 5.0);
        assert_relative_eq!(p.y, 5.0);

        // Beyond the segment ends the infinite line is used.
        let p = nearest_point_on_segment(&seg, Point::new(30.0, 10.0));
        assert_relative_eq!(p.x, 20.0);
        assert_relative_eq!(p.y, 20.0);
    }

    #[test]
    fn projection_onto_degenerate_segment_keeps_point() {
        let seg = Segment::new(Point::new(3.0, 3.0), Point::new(3.0, 3.0));
        let p = Point::new(8.0, -1.0);
        assert_eq!(nearest_point_on_segment(&seg, p), p);
    }

    #[test]
    fn intersection_of_crossing_lines() {
        let p = intersect(Line::new(1.0, 0.0), Line::new(-1.0, 10.0)).expect("crossing");
        assert_relative_eq!(p.x, 5.0);
        assert_relative_eq!(p.y, 5.0);
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        assert!(intersect(Line::new(0.5, 0.0), Line::new(0.5, 3.0)).is_none());
    }
}
