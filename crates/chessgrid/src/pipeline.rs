//! Detector seams and the end-to-end segmentation pipeline.
//!
//! The pipeline is generic over the image type: any pair of detectors that
//! understand `I` can feed the reconstructor.

use std::path::Path;

use chessgrid_core::{CandidateCloud, Point};
use chessgrid_reconstruct::{
    GridReconstructor, Kernel, ReconstructError, ReconstructParams, ReconstructionResult,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Finds the 7×3 interior corner block of the board.
pub trait InteriorGridDetector<I: ?Sized> {
    fn detect_interior(&self, image: &I) -> Option<Kernel>;
}

/// Finds corner-like points anywhere in the image.
///
/// Returning `None` (or no points) means detection failed.
pub trait CornerCandidateDetector<I: ?Sized> {
    fn detect_candidates(&self, image: &I) -> Option<Vec<Point>>;
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("interior 7x3 corner block not found")]
    InteriorGridNotFound,
    #[error("corner candidate detection failed")]
    CandidatesNotFound,
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),
}

/// Segment one image into its full 9×9 corner grid.
///
/// Runs the interior detector first and the candidate detector second; the
/// reconstructor only runs once both succeeded. `width`/`height` are the
/// dimensions of `image` in the same pixel space the detectors report.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(image, interior, candidates, params))
)]
pub fn segment_board<I, K, C>(
    image: &I,
    width: f64,
    height: f64,
    interior: &K,
    candidates: &C,
    params: &ReconstructParams,
) -> Result<ReconstructionResult, PipelineError>
where
    I: ?Sized,
    K: InteriorGridDetector<I> + ?Sized,
    C: CornerCandidateDetector<I> + ?Sized,
{
    let Some(kernel) = interior.detect_interior(image) else {
        error!("unable to detect the interior corner block");
        return Err(PipelineError::InteriorGridNotFound);
    };

    let points = match candidates.detect_candidates(image) {
        Some(points) if !points.is_empty() => points,
        _ => {
            error!("corner candidate detection failed");
            return Err(PipelineError::CandidatesNotFound);
        }
    };
    debug!("{} corner candidates", points.len());

    let cloud = CandidateCloud::new(points);
    let result =
        GridReconstructor::new(params.clone()).reconstruct(&kernel, &cloud, width, height)?;
    Ok(result)
}

/// Point ordering of a [`KernelFile`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelOrder {
    /// `(file - 1) + (rank - 3) * 7`.
    #[default]
    Board,
    /// Reversed board order, as produced by `(7, 3)` pattern finders.
    Detector,
}

/// On-disk kernel: 21 points in source-image pixels.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct KernelFile {
    #[serde(default)]
    pub order: KernelOrder,
    pub points: Vec<[f64; 2]>,
}

impl KernelFile {
    pub fn to_kernel(&self) -> Result<Kernel, ReconstructError> {
        let points = self.points.iter().map(|&[x, y]| Point::new(x, y)).collect();
        match self.order {
            KernelOrder::Board => Kernel::from_board_order(points),
            KernelOrder::Detector => Kernel::from_detector_order(points),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum KernelFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Kernel(#[from] ReconstructError),
}

/// Interior detector that always reports a fixed, caller-supplied kernel.
///
/// Useful when the interior block was located by another tool or by hand.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticKernel {
    kernel: Kernel,
}

impl StaticKernel {
    pub fn new(kernel: Kernel) -> Self {
        Self { kernel }
    }

    /// Read a JSON [`KernelFile`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KernelFileError> {
        let raw = std::fs::read_to_string(path)?;
        let file: KernelFile = serde_json::from_str(&raw)?;
        Ok(Self::new(file.to_kernel()?))
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Same kernel with every coordinate multiplied by `scale`, e.g. to move
    /// it from source-image pixels into a resized working image.
    pub fn scaled(&self, scale: f64) -> Self {
        Self::new(self.kernel.map(|p| Point::new(p.x * scale, p.y * scale)))
    }
}

impl<I: ?Sized> InteriorGridDetector<I> for StaticKernel {
    fn detect_interior(&self, _image: &I) -> Option<Kernel> {
        Some(self.kernel.clone())
    }
}
