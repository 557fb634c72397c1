/// Errors returned by the grid reconstructor.
///
/// Geometric degeneracies are never reported here; they are resolved inside
/// the geometry toolkit. Only malformed inputs fail.
#[derive(thiserror::Error, Debug)]
pub enum ReconstructError {
    #[error("kernel must contain {expected} points, got {got}")]
    KernelSize { expected: usize, got: usize },
    #[error("kernel point {index} is not finite")]
    NonFiniteKernelPoint { index: usize },
    #[error("candidate cloud is empty")]
    EmptyCandidateCloud,
    #[error("invalid working image size (width={width}, height={height})")]
    InvalidImageSize { width: f64, height: f64 },
    #[error("grid cell (file={file}, rank={rank}) is unset")]
    MissingCell { file: usize, rank: usize },
}
