use chessgrid_core::{BoardGrid, GridCoords, Point};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::ReconstructError;

/// Files covered by the kernel (7 corner lines).
pub const KERNEL_FILES: Range<usize> = 1..8;
/// Ranks covered by the kernel (3 corner lines).
pub const KERNEL_RANKS: Range<usize> = 3..6;
/// Number of points in a kernel.
pub const KERNEL_LEN: usize = 21;

const KERNEL_WIDTH: usize = KERNEL_FILES.end - KERNEL_FILES.start;

/// The reliably detected interior block of the board: files 1..=7 ×
/// ranks 3..=5.
///
/// Points are kept in board order, `points[(file - 1) + (rank - 3) * 7]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    points: Vec<Point>,
}

impl Kernel {
    /// Build from board-ordered points (index `(file - 1) + (rank - 3) * 7`).
    pub fn from_board_order(points: Vec<Point>) -> Result<Self, ReconstructError> {
        if points.len() != KERNEL_LEN {
            return Err(ReconstructError::KernelSize {
                expected: KERNEL_LEN,
                got: points.len(),
            });
        }
        if let Some(index) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            return Err(ReconstructError::NonFiniteKernelPoint { index });
        }
        Ok(Self { points })
    }

    /// Build from the order produced by a `(7, 3)` inner-corner pattern
    /// finder, which is the board order reversed.
    pub fn from_detector_order(mut points: Vec<Point>) -> Result<Self, ReconstructError> {
        points.reverse();
        Self::from_board_order(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Kernel point at absolute board coordinates, if inside the block.
    pub fn get(&self, file: usize, rank: usize) -> Option<Point> {
        if !KERNEL_FILES.contains(&file) || !KERNEL_RANKS.contains(&rank) {
            return None;
        }
        let idx = (file - KERNEL_FILES.start) + (rank - KERNEL_RANKS.start) * KERNEL_WIDTH;
        self.points.get(idx).copied()
    }

    /// Points paired with their absolute board coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (GridCoords, Point)> + '_ {
        self.points.iter().enumerate().map(|(idx, &p)| {
            let file = KERNEL_FILES.start + idx % KERNEL_WIDTH;
            let rank = KERNEL_RANKS.start + idx / KERNEL_WIDTH;
            (GridCoords::new(file, rank), p)
        })
    }

    /// Same kernel with every point passed through `f`.
    pub fn map(&self, f: impl FnMut(&Point) -> Point) -> Kernel {
        Kernel {
            points: self.points.iter().map(f).collect(),
        }
    }

    /// Grid with only the kernel cells set.
    pub fn to_grid(&self) -> BoardGrid {
        let mut grid = BoardGrid::new();
        for (coords, p) in self.cells() {
            let filled = grid.fill(coords, p);
            debug_assert!(filled, "kernel cell {coords:?} set twice");
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed() -> Vec<Point> {
        (0..KERNEL_LEN).map(|i| Point::new(i as f64, 0.0)).collect()
    }

    #[test]
    fn board_order_indexing() {
        let k = Kernel::from_board_order(indexed()).expect("kernel");
        assert_eq!(k.get(1, 3), Some(Point::new(0.0, 0.0)));
        assert_eq!(k.get(7, 3), Some(Point::new(6.0, 0.0)));
        assert_eq!(k.get(1, 4), Some(Point::new(7.0, 0.0)));
        assert_eq!(k.get(7, 5), Some(Point::new(20.0, 0.0)));
        assert_eq!(k.get(0, 3), None);
        assert_eq!(k.get(4, 6), None);
    }

    #[test]
    fn detector_order_is_reversed_board_order() {
        let k = Kernel::from_detector_order(indexed()).expect("kernel");
        assert_eq!(k.get(1, 3), Some(Point::new(20.0, 0.0)));
        assert_eq!(k.get(7, 5), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn cells_cover_the_interior_block() {
        let k = Kernel::from_board_order(indexed()).expect("kernel");
        let grid = k.to_grid();
        assert_eq!(grid.set_count(), KERNEL_LEN);
        for file in KERNEL_FILES {
            for rank in KERNEL_RANKS {
                assert_eq!(grid.get(file, rank), k.get(file, rank));
            }
        }
    }

    #[test]
    fn rejects_wrong_size_and_non_finite_points() {
        let err = Kernel::from_board_order(vec![Point::origin(); 20]).unwrap_err();
        assert!(matches!(
            err,
            ReconstructError::KernelSize {
                expected: 21,
                got: 20
            }
        ));

        let mut pts = indexed();
        pts[5].y = f64::NAN;
        let err = Kernel::from_board_order(pts).unwrap_err();
        assert!(matches!(err, ReconstructError::NonFiniteKernelPoint { index: 5 }));
    }
}
