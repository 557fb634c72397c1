//! Huber-robust line fitting by iteratively reweighted least squares.
//!
//! Each iteration measures vertical residuals against the current line,
//! estimates the residual scale with the median absolute deviation, and
//! down-weights points whose residual exceeds `epsilon` scales:
//!
//! | residual      | weight        |
//! |---------------|---------------|
//! | `|r| <= δ`    | `1`           |
//! | `|r| > δ`     | `δ / |r|`     |
//!
//! with `δ = epsilon * scale`. The loop stops after `max_iters` rounds, when
//! the line stops moving, or when the inliers fit exactly.

use crate::line::{Line, MAX_SLOPE};
use crate::Point;
use serde::{Deserialize, Serialize};

/// MAD to standard deviation factor for normally distributed residuals.
const MAD_TO_SIGMA: f64 = 1.0 / 0.6745;

/// Parameters of the Huber IRLS fit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuberParams {
    /// Transition between the quadratic and linear regimes, in units of the
    /// robust residual scale.
    pub epsilon: f64,
    /// Hard cap on reweighting rounds.
    pub max_iters: usize,
    /// Relative change of slope and intercept below which the fit is
    /// considered converged.
    pub tolerance: f64,
}

impl Default for HuberParams {
    fn default() -> Self {
        Self {
            epsilon: 2.0,
            max_iters: 100,
            tolerance: 1e-9,
        }
    }
}

/// Huber IRLS weight for a residual given the threshold `delta`.
#[inline]
pub fn huber_weight(residual: f64, delta: f64) -> f64 {
    let r = residual.abs();
    if r <= delta {
        1.0
    } else {
        delta / r
    }
}

/// Weighted least-squares line through `points`.
///
/// `weights` must have the same length as `points`; missing weights are
/// treated as zero.
pub fn fit_line_weighted(points: &[Point], weights: &[f64]) -> Line {
    let mut sw = 0.0;
    let mut sx = 0.0;
    let mut sy = 0.0;
    for (p, &w) in points.iter().zip(weights) {
        sw += w;
        sx += w * p.x;
        sy += w * p.y;
    }
    if sw <= 0.0 {
        return match points.first() {
            Some(p) => Line::new(0.0, p.y),
            None => Line::new(0.0, 0.0),
        };
    }
    let mx = sx / sw;
    let my = sy / sw;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (p, &w) in points.iter().zip(weights) {
        let dx = p.x - mx;
        let dy = p.y - my;
        sxx += w * dx * dx;
        sxy += w * dx * dy;
        syy += w * dy * dy;
    }

    let slope = if sxx <= f64::EPSILON * syy.max(1.0) {
        if syy <= f64::EPSILON {
            // Single point (or all coincident): nothing to orient by.
            0.0
        } else {
            MAX_SLOPE.copysign(sxy)
        }
    } else {
        sxy / sxx
    };
    Line::new(slope, my - slope * mx)
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}

/// Robust residual scale: MAD around the median, rescaled to sigma.
fn robust_scale(residuals: &[f64]) -> f64 {
    let mut r = residuals.to_vec();
    let center = median(&mut r);
    let mut dev: Vec<f64> = residuals.iter().map(|v| (v - center).abs()).collect();
    median(&mut dev) * MAD_TO_SIGMA
}

fn converged(prev: &Line, next: &Line, tol: f64) -> bool {
    (next.slope - prev.slope).abs() <= tol * prev.slope.abs().max(1.0)
        && (next.intercept - prev.intercept).abs() <= tol * prev.intercept.abs().max(1.0)
}

/// Outlier-tolerant line fit through `points`.
///
/// Starts from the ordinary least-squares solution and reweights with
/// Huber weights for at most `params.max_iters` rounds.
pub fn fit_line_robust(points: &[Point], params: &HuberParams) -> Line {
    let mut weights = vec![1.0; points.len()];
    let mut line = fit_line_weighted(points, &weights);
    if points.len() < 3 {
        return line;
    }

    let mut residuals = vec![0.0; points.len()];
    for _ in 0..params.max_iters {
        for (r, p) in residuals.iter_mut().zip(points) {
            *r = line.residual(*p);
        }
        let scale = robust_scale(&residuals);
        if !scale.is_finite() || scale <= f64::EPSILON {
            break;
        }
        let delta = params.epsilon * scale;
        for (w, r) in weights.iter_mut().zip(&residuals) {
            *w = huber_weight(*r, delta);
        }

        let next = fit_line_weighted(points, &weights);
        let done = converged(&line, &next, params.tolerance);
        line = next;
        if done {
            break;
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit_line;
    use approx::assert_relative_eq;

    fn points_on(slope: f64, intercept: f64, xs: &[f64]) -> Vec<Point> {
        xs.iter()
            .map(|&x| Point::new(x, slope * x + intercept))
            .collect()
    }

    #[test]
    fn huber_weight_regimes() {
        assert_eq!(huber_weight(0.0, 2.0), 1.0);
        assert_eq!(huber_weight(-2.0, 2.0), 1.0);
        assert_relative_eq!(huber_weight(4.0, 2.0), 0.5);
        assert_relative_eq!(huber_weight(-8.0, 2.0), 0.25);
    }

    #[test]
    fn robust_fit_matches_exact_data() {
        let xs: Vec<f64> = (0..9).map(|i| 40.0 + 50.0 * i as f64).collect();
        let pts = points_on(-0.12, 300.0, &xs);
        let l = fit_line_robust(&pts, &HuberParams::default());
        assert_relative_eq!(l.slope, -0.12, epsilon = 1e-9);
        assert_relative_eq!(l.intercept, 300.0, epsilon = 1e-6);
    }

    #[test]
    fn robust_fit_resists_single_outlier() {
        let xs: Vec<f64> = (0..9).map(|i| 50.0 * i as f64).collect();
        let mut pts = points_on(0.1, 100.0, &xs);
        // Small jitter so the residual scale is not zero.
        for (i, p) in pts.iter_mut().enumerate() {
            p.y += if i % 2 == 0 { 0.3 } else { -0.3 };
        }
        pts[6].y += 60.0;

        let ols = fit_line(&pts);
        let robust = fit_line_robust(&pts, &HuberParams::default());

        let err_ols = (ols.y_at(200.0) - 120.0).abs();
        let err_robust = (robust.y_at(200.0) - 120.0).abs();
        assert!(
            err_robust < err_ols,
            "robust {err_robust} should beat ols {err_ols}"
        );
        assert!(err_robust < 3.0, "robust error {err_robust}");
    }

    #[test]
    fn zero_iterations_equals_least_squares() {
        let pts = [
            Point::new(0.0, 1.0),
            Point::new(1.0, 2.5),
            Point::new(2.0, 2.9),
            Point::new(3.0, 4.2),
        ];
        let params = HuberParams {
            max_iters: 0,
            ..HuberParams::default()
        };
        assert_eq!(fit_line_robust(&pts, &params), fit_line(&pts));
    }

    #[test]
    fn weighted_fit_ignores_zero_weight_points() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(3.0, 50.0),
        ];
        let l = fit_line_weighted(&pts, &[1.0, 1.0, 1.0, 0.0]);
        assert_relative_eq!(l.slope, 1.0, epsilon = 1e-12);
        assert_relative_eq!(l.intercept, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_inputs_stay_finite() {
        let empty = fit_line_robust(&[], &HuberParams::default());
        assert_eq!(empty, Line::new(0.0, 0.0));

        let single = fit_line_robust(&[Point::new(3.0, 4.0)], &HuberParams::default());
        assert_eq!(single, Line::new(0.0, 4.0));

        let coincident = [Point::new(2.0, 2.0); 4];
        let l = fit_line_robust(&coincident, &HuberParams::default());
        assert!(l.slope.is_finite() && l.intercept.is_finite());
    }
}
