use crate::debug::{RankGrowth, ReconstructionDebug};
use crate::error::ReconstructError;
use crate::kernel::{Kernel, KERNEL_FILES, KERNEL_RANKS};
use crate::params::ReconstructParams;
use chessgrid_core::{
    clip_line_to_rect, distance, extrapolate_perspective, fit_line, fit_line_robust, intersect,
    nearest_point_on_segment, BoardGrid, CandidateCloud, GridCoords, Point, BOARD_SIZE,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::ops::Range;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Outward rings grown around the kernel; three rings reach ranks 0 and 8.
pub const RING_COUNT: usize = KERNEL_RANKS.start;

/// Completed reconstruction.
#[derive(Clone, Debug, Serialize)]
pub struct ReconstructionResult {
    pub grid: BoardGrid,
    /// Kernel after snapping onto the candidate cloud.
    pub refined_kernel: Kernel,
    /// Ring cells accepted from the candidate cloud.
    pub confirmed: usize,
    /// Ring cells resolved by the rank/file line intersection.
    pub intersected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<ReconstructionDebug>,
}

/// Rebuilds the full 9×9 corner grid from a kernel and candidate detections.
#[derive(Clone, Debug, Default)]
pub struct GridReconstructor {
    pub params: ReconstructParams,
}

struct Frame<'a> {
    cloud: &'a CandidateCloud,
    width: f64,
    height: f64,
}

impl GridReconstructor {
    pub fn new(params: ReconstructParams) -> Self {
        Self { params }
    }

    /// Main entry point.
    ///
    /// `width`/`height` describe the working image the points live in and
    /// bound the reference lines. Fails only on malformed inputs; the
    /// returned grid is always complete.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, kernel, cloud), fields(candidates = cloud.len()))
    )]
    pub fn reconstruct(
        &self,
        kernel: &Kernel,
        cloud: &CandidateCloud,
        width: f64,
        height: f64,
    ) -> Result<ReconstructionResult, ReconstructError> {
        if cloud.is_empty() {
            return Err(ReconstructError::EmptyCandidateCloud);
        }
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ReconstructError::InvalidImageSize { width, height });
        }

        let frame = Frame {
            cloud,
            width,
            height,
        };
        let mut debug = self
            .params
            .collect_debug
            .then(ReconstructionDebug::default);
        if let Some(d) = debug.as_mut() {
            d.snapshot("kernel", &kernel.to_grid(), width, height);
        }

        let refined_kernel = refine_kernel(kernel, cloud, debug.as_mut());
        let mut grid = refined_kernel.to_grid();
        if let Some(d) = debug.as_mut() {
            d.snapshot("kernel_refined", &grid, width, height);
        }

        complete_kernel_ranks(&mut grid, cloud)?;
        if let Some(d) = debug.as_mut() {
            d.snapshot("kernel_ranks", &grid, width, height);
        }

        let mut confirmed = 0;
        let mut intersected = 0;
        for ring in 0..RING_COUNT {
            let window = KERNEL_RANKS.start - ring..KERNEL_RANKS.end + ring;
            for (rank, towards_lower) in [(window.start - 1, true), (window.end, false)] {
                let growth =
                    self.grow_rank(&mut grid, &frame, ring, rank, window.clone(), towards_lower)?;
                confirmed += growth.confirmed.len();
                intersected += growth.intersected.len();
                if let Some(d) = debug.as_mut() {
                    d.ranks.push(growth);
                }
            }
            if let Some(d) = debug.as_mut() {
                d.snapshot(format!("ring_{ring}"), &grid, width, height);
            }
        }

        if let Some(c) = grid.missing().first() {
            return Err(ReconstructError::MissingCell {
                file: c.file,
                rank: c.rank,
            });
        }

        info!(
            "reconstructed 9x9 grid from {} candidates ({} confirmed, {} intersected)",
            cloud.len(),
            confirmed,
            intersected
        );

        Ok(ReconstructionResult {
            grid,
            refined_kernel,
            confirmed,
            intersected,
            debug,
        })
    }

    /// Fill `rank` for every file by extrapolating each file's `window`.
    fn grow_rank(
        &self,
        grid: &mut BoardGrid,
        frame: &Frame<'_>,
        ring: usize,
        rank: usize,
        window: Range<usize>,
        towards_lower: bool,
    ) -> Result<RankGrowth, ReconstructError> {
        let mut extrapolated = [Point::origin(); BOARD_SIZE];
        for (file, slot) in extrapolated.iter_mut().enumerate() {
            let mut pts = file_window(grid, file, window.clone())?;
            if towards_lower {
                pts.reverse();
            }
            *slot = extrapolate_perspective(&pts);
        }

        let reference = fit_line_robust(&extrapolated, &self.params.huber);
        let reference = clip_line_to_rect(reference, frame.width, frame.height);

        let accept = ring < self.params.confirm_rings;
        let mut current = extrapolated;
        let mut confirmed = Vec::new();
        let mut unconfirmed = Vec::new();
        for (file, p) in extrapolated.iter().enumerate() {
            let candidate = if accept {
                let projected = nearest_point_on_segment(&reference, *p);
                frame
                    .cloud
                    .nearest(projected, Some(self.params.candidate_radius_px))
            } else {
                None
            };
            match candidate {
                Some(c) => {
                    current[file] = c;
                    let filled = grid.fill(GridCoords::new(file, rank), c);
                    debug_assert!(filled, "cell ({file}, {rank}) already set");
                    confirmed.push(file);
                }
                None => unconfirmed.push(file),
            }
        }

        if !unconfirmed.is_empty() {
            let rank_line = fit_line_robust(&current, &self.params.huber);
            for &file in &unconfirmed {
                let file_line = fit_line(&file_window(grid, file, window.clone())?);
                let p = match intersect(rank_line, file_line) {
                    Some(p) => p,
                    None => {
                        warn!(
                            "file {file} parallel to rank {rank} line; keeping extrapolated point"
                        );
                        current[file]
                    }
                };
                let filled = grid.fill(GridCoords::new(file, rank), p);
                debug_assert!(filled, "cell ({file}, {rank}) already set");
            }
        }

        debug!(
            "ring {ring} rank {rank}: {} confirmed, {} intersected",
            confirmed.len(),
            unconfirmed.len()
        );

        Ok(RankGrowth {
            ring,
            rank,
            reference,
            confirmed,
            intersected: unconfirmed,
        })
    }
}

/// Rebuild the full grid with default parameters.
pub fn reconstruct_grid(
    kernel: &Kernel,
    cloud: &CandidateCloud,
    width: f64,
    height: f64,
) -> Result<BoardGrid, ReconstructError> {
    GridReconstructor::default()
        .reconstruct(kernel, cloud, width, height)
        .map(|r| r.grid)
}

/// Snap every kernel point onto its nearest candidate.
fn refine_kernel(
    kernel: &Kernel,
    cloud: &CandidateCloud,
    debug: Option<&mut ReconstructionDebug>,
) -> Kernel {
    let refined = kernel.map(|p| cloud.nearest(*p, None).unwrap_or(*p));
    if let Some(d) = debug {
        d.kernel_moves = kernel
            .cells()
            .zip(refined.points())
            .map(|((coords, before), after)| (coords, distance(before, *after)))
            .collect();
    }
    refined
}

/// Extend each kernel rank by one file on both sides, snapped to the
/// nearest candidate.
fn complete_kernel_ranks(
    grid: &mut BoardGrid,
    cloud: &CandidateCloud,
) -> Result<(), ReconstructError> {
    for rank in KERNEL_RANKS {
        let mut row = rank_window(grid, rank, KERNEL_FILES)?;
        let far = extrapolate_perspective(&row);
        row.reverse();
        let near = extrapolate_perspective(&row);

        for (file, p) in [(KERNEL_FILES.end, far), (KERNEL_FILES.start - 1, near)] {
            let snapped = cloud.nearest(p, None).unwrap_or(p);
            let filled = grid.fill(GridCoords::new(file, rank), snapped);
            debug_assert!(filled, "cell ({file}, {rank}) already set");
        }
    }
    Ok(())
}

fn file_window(
    grid: &BoardGrid,
    file: usize,
    ranks: Range<usize>,
) -> Result<Vec<Point>, ReconstructError> {
    let start = ranks.start;
    grid.file_window(file, ranks.clone()).ok_or_else(|| {
        let rank = ranks
            .clone()
            .find(|&r| !grid.is_set(file, r))
            .unwrap_or(start);
        ReconstructError::MissingCell { file, rank }
    })
}

fn rank_window(
    grid: &BoardGrid,
    rank: usize,
    files: Range<usize>,
) -> Result<Vec<Point>, ReconstructError> {
    let start = files.start;
    grid.rank_window(rank, files.clone()).ok_or_else(|| {
        let file = files
            .clone()
            .find(|&f| !grid.is_set(f, rank))
            .unwrap_or(start);
        ReconstructError::MissingCell { file, rank }
    })
}
