use crate::grid::{BoardGrid, GridCoords, BOARD_SIZE};
use crate::homography::Homography;
use crate::Point;

/// Ideal board whose corner `(file, rank)` is the image of board-plane
/// point `(file, rank)` under a homography.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticBoard {
    pub h: Homography,
}

impl SyntheticBoard {
    pub fn new(h: Homography) -> Self {
        Self { h }
    }

    /// Board whose outer corners `(0,0)`, `(8,0)`, `(8,8)`, `(0,8)` land on
    /// `quad`, in that order.
    pub fn from_quad(quad: [Point; 4]) -> Option<Self> {
        let n = (BOARD_SIZE - 1) as f64;
        let board = [
            Point::new(0.0, 0.0),
            Point::new(n, 0.0),
            Point::new(n, n),
            Point::new(0.0, n),
        ];
        Homography::from_4pt(&board, &quad).map(Self::new)
    }

    pub fn corner(&self, file: usize, rank: usize) -> Point {
        self.h.apply(Point::new(file as f64, rank as f64))
    }

    /// All 81 corners, file-major.
    pub fn corners(&self) -> Vec<Point> {
        (0..BOARD_SIZE)
            .flat_map(|file| (0..BOARD_SIZE).map(move |rank| (file, rank)))
            .map(|(file, rank)| self.corner(file, rank))
            .collect()
    }

    /// Points of the cells in `files × ranks`, rank-major
    /// (index `(file - files.start) + (rank - ranks.start) * files.len()`).
    pub fn block(&self, files: std::ops::Range<usize>, ranks: std::ops::Range<usize>) -> Vec<Point> {
        ranks
            .flat_map(|rank| files.clone().map(move |file| (file, rank)))
            .map(|(file, rank)| self.corner(file, rank))
            .collect()
    }

    pub fn grid(&self) -> BoardGrid {
        let mut g = BoardGrid::new();
        for file in 0..BOARD_SIZE {
            for rank in 0..BOARD_SIZE {
                g.fill(GridCoords::new(file, rank), self.corner(file, rank));
            }
        }
        g
    }
}
