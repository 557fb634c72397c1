use chessgrid_core::HuberParams;
use serde::{Deserialize, Serialize};

/// Parameters of the grid reconstructor.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconstructParams {
    /// Radius (pixels) around a rank-line projection in which a candidate
    /// confirms an extrapolated corner.
    pub candidate_radius_px: f64,

    /// Number of outward rings, counted from the kernel, that may accept
    /// candidate confirmations. Outer rings rely on the rank/file line
    /// intersection only. Detections far from the kernel are noisier, so
    /// the default confirms the first ring alone.
    pub confirm_rings: usize,

    /// Robust fit used for rank lines.
    pub huber: HuberParams,

    /// Record named grid snapshots after each stage.
    pub collect_debug: bool,
}

impl Default for ReconstructParams {
    fn default() -> Self {
        Self {
            candidate_radius_px: 30.0,
            confirm_rings: 1,
            huber: HuberParams::default(),
            collect_debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let p: ReconstructParams =
            serde_json::from_str(r#"{ "confirm_rings": 3, "huber": { "max_iters": 5 } }"#)
                .expect("parse");
        assert_eq!(p.confirm_rings, 3);
        assert_eq!(p.huber.max_iters, 5);
        assert_eq!(p.huber.epsilon, HuberParams::default().epsilon);
        assert_eq!(p.candidate_radius_px, 30.0);
        assert!(!p.collect_debug);
    }
}
