//! High-level facade crate for the `chessgrid-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometry toolkit and the grid reconstructor
//! - the detector seams ([`InteriorGridDetector`], [`CornerCandidateDetector`])
//!   and the [`segment_board`] pipeline that chains them into the
//!   reconstructor
//! - a lattice walk ([`find_interior_block`]) that picks the 7×3 interior
//!   block out of corner candidates when no kernel is supplied
//! - (feature-gated) image helpers that resize a photo, run the ChESS
//!   corner detector (`chess-corners`) and segment the board end-to-end.
//!
//! ## Quickstart
//!
//! ```no_run
//! use chessgrid::detect;
//! use chessgrid::{ReconstructParams, StaticKernel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = detect::load_gray("board.jpg")?;
//! let kernel = StaticKernel::load("kernel.json")?;
//! // `None` searches the block among the ChESS candidates instead.
//! let candidates = detect::ChessCornerDetector::default();
//!
//! let seg = detect::segment_image(
//!     &img,
//!     detect::DEFAULT_WORKING_SIZE,
//!     Some(&kernel),
//!     &candidates,
//!     &ReconstructParams::default(),
//! )?;
//! println!("complete: {}", seg.grid().is_complete());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `chessgrid::core`: points, lines, robust fitting, the 9×9 [`BoardGrid`].
//! - `chessgrid::reconstruct`: the kernel-to-grid reconstructor.
//! - `chessgrid::pipeline`: detector traits and [`segment_board`].
//! - `chessgrid::lattice`: the interior block search over candidates.
//! - `chessgrid::detect` (feature `image`): image loading, resizing and
//!   ChESS candidates.

pub use chessgrid_core as core;
pub use chessgrid_reconstruct as reconstruct;

pub use chessgrid_core::{BoardGrid, CandidateCloud, GridCoords, Point, Vector, BOARD_SIZE};
pub use chessgrid_reconstruct::{
    reconstruct_grid, GridReconstructor, Kernel, ReconstructError, ReconstructParams,
    ReconstructionDebug, ReconstructionResult,
};

pub mod lattice;
pub mod pipeline;

pub use lattice::{find_interior_block, LatticeInteriorDetector, LatticeParams};
pub use pipeline::{
    segment_board, CornerCandidateDetector, InteriorGridDetector, KernelFile, KernelFileError,
    KernelOrder, PipelineError, StaticKernel,
};

#[cfg(feature = "image")]
pub mod detect;
