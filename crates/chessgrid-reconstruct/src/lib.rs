//! Full chessboard corner-grid reconstruction from an interior kernel.
//!
//! ## Quickstart
//!
//! ```
//! use chessgrid_core::{CandidateCloud, Point, SyntheticBoard};
//! use chessgrid_reconstruct::{reconstruct_grid, Kernel, KERNEL_FILES, KERNEL_RANKS};
//!
//! let board = SyntheticBoard::from_quad([
//!     Point::new(80.0, 110.0),
//!     Point::new(430.0, 70.0),
//!     Point::new(460.0, 440.0),
//!     Point::new(50.0, 420.0),
//! ])
//! .expect("valid quad");
//!
//! let kernel = Kernel::from_board_order(board.block(KERNEL_FILES, KERNEL_RANKS))?;
//! let cloud = CandidateCloud::new(board.corners());
//! let grid = reconstruct_grid(&kernel, &cloud, 500.0, 500.0)?;
//! assert!(grid.is_complete());
//! # Ok::<(), chessgrid_reconstruct::ReconstructError>(())
//! ```
//!
//! Algorithm (grid indexed by file 0..8 × rank 0..8):
//! 1. Snap every kernel point (files 1..7 × ranks 3..5) onto its nearest
//!    candidate detection.
//! 2. Extend each kernel rank to files 0 and 8 by perspective extrapolation,
//!    snapped to the nearest candidate.
//! 3. Grow three rings outward, one rank below and one above the known
//!    block per ring:
//!    - extrapolate every file to the new rank,
//!    - robust-fit the rank line through the nine estimates,
//!    - confirm estimates against nearby candidates (first ring only by
//!      default),
//!    - intersect the refitted rank line with each unconfirmed file's line.

mod debug;
mod error;
mod kernel;
mod params;
mod reconstructor;

pub use debug::{GridSnapshot, RankGrowth, ReconstructionDebug};
pub use error::ReconstructError;
pub use kernel::{Kernel, KERNEL_FILES, KERNEL_LEN, KERNEL_RANKS};
pub use params::ReconstructParams;
pub use reconstructor::{reconstruct_grid, GridReconstructor, ReconstructionResult, RING_COUNT};
