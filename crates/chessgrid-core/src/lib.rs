//! Core types and geometry for chessboard corner-grid reconstruction.
//!
//! This crate is purely geometric. It does *not* depend on any concrete
//! corner detector or image type: points live in working-image pixel space
//! as `nalgebra::Point2<f64>`.
//!
//! Contents:
//! - [`Line`] / [`Segment`]: slope-intercept lines, least-squares and
//!   Huber-robust fitting, rectangle clipping, intersection.
//! - [`extrapolate_perspective`]: next point of a foreshortened sequence.
//! - [`CandidateCloud`]: k-d tree backed nearest-neighbor lookups.
//! - [`BoardGrid`]: the 9×9 corner grid with fill-once cells.
//! - [`Homography`] / [`SyntheticBoard`]: ideal boards under a projective
//!   transform, used by tests and benches downstream.

mod cloud;
mod grid;
mod homography;
mod line;
mod logger;
mod perspective;
mod robust;
mod synthetic;

pub use cloud::CandidateCloud;
pub use grid::{BoardGrid, GridCoords, BOARD_SIZE};
pub use homography::Homography;
pub use line::{
    clip_line_to_rect, fit_line, intersect, nearest_point_on_segment, Line, Segment, MAX_SLOPE,
    MIN_SLOPE,
};
pub use perspective::{distance, extrapolate_perspective};
pub use robust::{fit_line_robust, fit_line_weighted, huber_weight, HuberParams};
pub use synthetic::SyntheticBoard;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

/// Point type used throughout the workspace (working-image pixels).
pub type Point = nalgebra::Point2<f64>;

/// Displacement between two [`Point`]s.
pub type Vector = nalgebra::Vector2<f64>;
