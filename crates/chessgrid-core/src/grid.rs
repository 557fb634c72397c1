use crate::line::{clip_line_to_rect, fit_line, Line, Segment};
use crate::Point;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of corner lines along each board axis (8 squares + 1).
pub const BOARD_SIZE: usize = 9;

/// Position of a corner on the board: `file` along one axis, `rank` along
/// the other, both in `0..BOARD_SIZE`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct GridCoords {
    pub file: usize,
    pub rank: usize,
}

impl GridCoords {
    pub fn new(file: usize, rank: usize) -> Self {
        Self { file, rank }
    }
}

/// The 9×9 grid of board corners, stored file-major: `cells[file][rank]`.
///
/// Cells start unset and are filled at most once; [`BoardGrid::fill`]
/// refuses to overwrite a set cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardGrid {
    cells: [[Option<Point>; BOARD_SIZE]; BOARD_SIZE],
}

impl BoardGrid {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, file: usize, rank: usize) -> Option<Point> {
        self.cells.get(file)?.get(rank).copied().flatten()
    }

    #[inline]
    pub fn is_set(&self, file: usize, rank: usize) -> bool {
        self.get(file, rank).is_some()
    }

    /// Set an unset cell. Returns `false` (and leaves the grid untouched)
    /// when the cell is already set or out of range.
    pub fn fill(&mut self, coords: GridCoords, p: Point) -> bool {
        let Some(cell) = self
            .cells
            .get_mut(coords.file)
            .and_then(|f| f.get_mut(coords.rank))
        else {
            return false;
        };
        if cell.is_some() {
            return false;
        }
        *cell = Some(p);
        true
    }

    /// Points of `file` for the given rank range, `None` if any is unset.
    pub fn file_window(&self, file: usize, ranks: Range<usize>) -> Option<Vec<Point>> {
        ranks.map(|rank| self.get(file, rank)).collect()
    }

    /// Points of `rank` for the given file range, `None` if any is unset.
    pub fn rank_window(&self, rank: usize, files: Range<usize>) -> Option<Vec<Point>> {
        files.map(|file| self.get(file, rank)).collect()
    }

    /// Rank-major view: `transpose().get(rank, file) == get(file, rank)`.
    pub fn transpose(&self) -> BoardGrid {
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        for (file, column) in self.cells.iter().enumerate() {
            for (rank, cell) in column.iter().enumerate() {
                cells[rank][file] = *cell;
            }
        }
        BoardGrid { cells }
    }

    pub fn set_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.set_count() == BOARD_SIZE * BOARD_SIZE
    }

    /// Unset cells, file-major.
    pub fn missing(&self) -> Vec<GridCoords> {
        self.iter_cells()
            .filter(|(_, p)| p.is_none())
            .map(|(c, _)| c)
            .collect()
    }

    /// All set points with their coordinates, file-major.
    pub fn points(&self) -> impl Iterator<Item = (GridCoords, Point)> + '_ {
        self.iter_cells().filter_map(|(c, p)| p.map(|p| (c, p)))
    }

    fn iter_cells(&self) -> impl Iterator<Item = (GridCoords, Option<Point>)> + '_ {
        self.cells.iter().enumerate().flat_map(|(file, column)| {
            column
                .iter()
                .enumerate()
                .map(move |(rank, p)| (GridCoords::new(file, rank), *p))
        })
    }

    /// Complete grid as plain rows (`rows[rank][file]`), or `None` while
    /// any cell is unset.
    pub fn to_rows(&self) -> Option<[[Point; BOARD_SIZE]; BOARD_SIZE]> {
        let mut rows = [[Point::origin(); BOARD_SIZE]; BOARD_SIZE];
        for (c, p) in self.iter_cells() {
            rows[c.rank][c.file] = p?;
        }
        Some(rows)
    }

    /// Least-squares line through the set points of every file with at
    /// least two points.
    pub fn file_lines(&self) -> Vec<(usize, Line)> {
        (0..BOARD_SIZE)
            .filter_map(|file| {
                let pts: Vec<Point> = (0..BOARD_SIZE).filter_map(|r| self.get(file, r)).collect();
                (pts.len() >= 2).then(|| (file, fit_line(&pts)))
            })
            .collect()
    }

    /// Least-squares line through the set points of every rank with at
    /// least two points.
    pub fn rank_lines(&self) -> Vec<(usize, Line)> {
        self.transpose().file_lines()
    }

    /// File and rank lines clipped to a `width × height` image.
    pub fn board_segments(&self, width: f64, height: f64) -> Vec<Segment> {
        self.file_lines()
            .into_iter()
            .chain(self.rank_lines())
            .map(|(_, l)| clip_line_to_rect(l, width, height))
            .collect()
    }
}
