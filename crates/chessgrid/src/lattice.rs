//! Interior block search over corner candidates.
//!
//! The search seeds at the candidate nearest a hint point, takes the two
//! lattice axes from the seed's right and lower neighbours, and walks the
//! lattice outward. Every hop re-estimates the local step from the last
//! two corners so perspective foreshortening is followed.
//!
//! Files grow to the right in the image and ranks grow downward. When more
//! than 7 corners are found along a rank, or more than 3 complete ranks,
//! the centered window is kept. A full 9×9 corner set therefore yields
//! files 1..=7 × ranks 3..=5, and so does a starting position where only
//! the empty middle ranks are visible.

use chessgrid_core::{CandidateCloud, Point, Vector, BOARD_SIZE};
use chessgrid_reconstruct::{Kernel, KERNEL_FILES, KERNEL_RANKS};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::pipeline::{CornerCandidateDetector, InteriorGridDetector};

#[cfg(feature = "tracing")]
use tracing::instrument;

const BLOCK_FILES: usize = KERNEL_FILES.end - KERNEL_FILES.start;
const BLOCK_RANKS: usize = KERNEL_RANKS.end - KERNEL_RANKS.start;

/// Parameters of the lattice walk.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LatticeParams {
    /// Neighbours of the seed inspected when estimating the axes.
    pub k_neighbors: usize,
    pub min_spacing_pix: f64,
    pub max_spacing_pix: f64,
    /// Largest deviation of the two seed axes from perpendicular.
    pub axis_tolerance_deg: f64,
    /// Snap radius around a predicted corner, as a fraction of the step.
    pub snap_fraction: f64,
}

impl Default for LatticeParams {
    fn default() -> Self {
        Self {
            k_neighbors: 8,
            min_spacing_pix: 8.0,
            max_spacing_pix: 120.0,
            axis_tolerance_deg: 30.0,
            snap_fraction: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Right,
    Left,
    Down,
    Up,
}

fn direction_quadrant(v: &Vector) -> Direction {
    if v.x.abs() > v.y.abs() {
        if v.x >= 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if v.y >= 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

/// Steps towards the nearest right and lower neighbours of `seed`.
fn seed_axes(
    cloud: &CandidateCloud,
    seed: Point,
    params: &LatticeParams,
) -> Option<(Vector, Vector)> {
    let mut right = None;
    let mut down = None;
    for p in cloud.nearest_n(seed, params.k_neighbors + 1) {
        let v = p - seed;
        let d = v.norm();
        if d < params.min_spacing_pix || d > params.max_spacing_pix {
            continue;
        }
        match direction_quadrant(&v) {
            Direction::Right => {
                right.get_or_insert(v);
            }
            Direction::Down => {
                down.get_or_insert(v);
            }
            Direction::Left | Direction::Up => {}
        }
    }
    let (right, down) = (right?, down?);

    let cos = right.dot(&down) / (right.norm() * down.norm());
    if cos.abs() > params.axis_tolerance_deg.to_radians().sin() {
        debug!("seed axes are {:.1} deg apart", cos.acos().to_degrees());
        return None;
    }
    Some((right, down))
}

fn hop(
    cloud: &CandidateCloud,
    from: Point,
    step: Vector,
    params: &LatticeParams,
) -> Option<Point> {
    cloud.nearest(from + step, Some(params.snap_fraction * step.norm()))
}

/// Corners reached from `start` by repeated hops, excluding `start`.
fn walk(
    cloud: &CandidateCloud,
    start: Point,
    mut step: Vector,
    params: &LatticeParams,
) -> Vec<Point> {
    let mut out = Vec::new();
    let mut last = start;
    while out.len() < BOARD_SIZE {
        let Some(next) = hop(cloud, last, step, params) else {
            break;
        };
        step = next - last;
        last = next;
        out.push(next);
    }
    out
}

/// Complete rows reached from `base` by hopping every column along `step`.
fn grow_rows(
    cloud: &CandidateCloud,
    base: &[Point],
    step: Vector,
    params: &LatticeParams,
) -> Vec<Vec<Point>> {
    let mut steps = vec![step; base.len()];
    let mut current = base.to_vec();
    let mut rows = Vec::new();
    while rows.len() < BOARD_SIZE {
        let next: Option<Vec<Point>> = current
            .iter()
            .zip(&steps)
            .map(|(p, s)| hop(cloud, *p, *s, params))
            .collect();
        let Some(next) = next else {
            break;
        };
        for ((s, p), n) in steps.iter_mut().zip(&current).zip(&next) {
            *s = n - p;
        }
        rows.push(next.clone());
        current = next;
    }
    rows
}

fn centered<T: Clone>(items: &[T], len: usize) -> Option<Vec<T>> {
    if items.len() < len {
        return None;
    }
    let start = (items.len() - len) / 2;
    Some(items[start..start + len].to_vec())
}

/// Find the 7×3 interior block in `cloud`, starting near `hint`.
///
/// Returns `None` when the seed has no usable axes or the walk cannot
/// collect 7 corners along a rank and 3 complete ranks.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(cloud, params), fields(candidates = cloud.len()))
)]
pub fn find_interior_block(
    cloud: &CandidateCloud,
    hint: Point,
    params: &LatticeParams,
) -> Option<Kernel> {
    let seed = cloud.nearest(hint, None)?;
    let Some((right, down)) = seed_axes(cloud, seed, params) else {
        debug!("no lattice axes around seed ({:.1}, {:.1})", seed.x, seed.y);
        return None;
    };

    let mut rank_line = walk(cloud, seed, -right, params);
    rank_line.reverse();
    rank_line.push(seed);
    rank_line.extend(walk(cloud, seed, right, params));
    let Some(base) = centered(&rank_line, BLOCK_FILES) else {
        debug!("only {} corners along the seed rank", rank_line.len());
        return None;
    };

    let mut ranks: Vec<Vec<Point>> = grow_rows(cloud, &base, -down, params)
        .into_iter()
        .rev()
        .collect();
    let below = grow_rows(cloud, &base, down, params);
    ranks.push(base);
    ranks.extend(below);
    let Some(block) = centered(&ranks, BLOCK_RANKS) else {
        debug!("only {} complete ranks around the seed", ranks.len());
        return None;
    };

    Kernel::from_board_order(block.concat()).ok()
}

/// Interior detector that looks for the block among corner candidates.
///
/// Candidates are taken from the wrapped detector, so a pipeline that uses
/// the same detector for both seams runs it twice.
pub struct LatticeInteriorDetector<'a, C: ?Sized> {
    candidates: &'a C,
    hint: Point,
    params: LatticeParams,
}

impl<'a, C: ?Sized> LatticeInteriorDetector<'a, C> {
    /// Search seeded at the candidate nearest `hint`, usually the image
    /// center.
    pub fn new(candidates: &'a C, hint: Point) -> Self {
        Self {
            candidates,
            hint,
            params: LatticeParams::default(),
        }
    }

    pub fn with_params(mut self, params: LatticeParams) -> Self {
        self.params = params;
        self
    }
}

impl<I, C> InteriorGridDetector<I> for LatticeInteriorDetector<'_, C>
where
    I: ?Sized,
    C: CornerCandidateDetector<I> + ?Sized,
{
    fn detect_interior(&self, image: &I) -> Option<Kernel> {
        let points = self.candidates.detect_candidates(image)?;
        let cloud = CandidateCloud::new(points);
        find_interior_block(&cloud, self.hint, &self.params)
    }
}
