use chessgrid_core::{BoardGrid, GridCoords, Segment};
use serde::Serialize;

/// Per-rank outcome of one outward growth step.
#[derive(Clone, Debug, Serialize)]
pub struct RankGrowth {
    pub ring: usize,
    pub rank: usize,
    /// Reference line through the extrapolated rank, clipped to the image.
    pub reference: Segment,
    /// Files whose corner was confirmed by a candidate detection.
    pub confirmed: Vec<usize>,
    /// Files whose corner came from the rank/file line intersection.
    pub intersected: Vec<usize>,
}

/// Grid state after a named stage.
#[derive(Clone, Debug, Serialize)]
pub struct GridSnapshot {
    pub name: String,
    pub grid: BoardGrid,
    /// File and rank lines fitted through the set points, clipped to the
    /// image.
    pub board_lines: Vec<Segment>,
}

/// Stage-by-stage record of a reconstruction, owned by the caller.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReconstructionDebug {
    pub snapshots: Vec<GridSnapshot>,
    pub ranks: Vec<RankGrowth>,
    /// Kernel cells that moved while snapping onto candidates.
    pub kernel_moves: Vec<(GridCoords, f64)>,
}

impl ReconstructionDebug {
    pub(crate) fn snapshot(&mut self, name: impl Into<String>, grid: &BoardGrid, w: f64, h: f64) {
        self.snapshots.push(GridSnapshot {
            name: name.into(),
            grid: grid.clone(),
            board_lines: grid.board_segments(w, h),
        });
    }

    pub fn snapshot_named(&self, name: &str) -> Option<&GridSnapshot> {
        self.snapshots.iter().find(|s| s.name == name)
    }
}
