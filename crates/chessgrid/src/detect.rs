use std::path::Path;

use chess_corners::{find_chess_corners_image, ChessConfig, CornerDescriptor};
use chessgrid_core::{BoardGrid, Point, BOARD_SIZE};
use chessgrid_reconstruct::{ReconstructParams, ReconstructionResult};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageReader};
use log::debug;

use crate::lattice::LatticeInteriorDetector;
use crate::pipeline::{segment_board, CornerCandidateDetector, PipelineError, StaticKernel};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Side of the square box images are resized into before detection.
pub const DEFAULT_WORKING_SIZE: u32 = 500;

/// Errors produced by the image-level helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error("cannot fit a {width}x{height} image into a {size}x{size} box")]
    InvalidResize { width: u32, height: u32, size: u32 },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Reasonable default settings for the `chess-corners` ChESS detector.
pub fn default_chess_config() -> ChessConfig {
    let mut cfg = ChessConfig::single_scale();
    cfg.params.threshold_rel = 0.2;
    cfg.params.nms_radius = 2;
    cfg
}

/// Decode an image file into 8-bit grayscale.
pub fn load_gray(path: impl AsRef<Path>) -> Result<GrayImage, DetectError> {
    Ok(ImageReader::open(path)?.decode()?.to_luma8())
}

/// Grayscale image resized for detection, with the factor that maps
/// source pixels onto it.
#[derive(Clone, Debug)]
pub struct WorkingImage {
    pub image: GrayImage,
    /// `working = source * scale`.
    pub scale: f64,
}

impl WorkingImage {
    pub fn width(&self) -> f64 {
        self.image.width() as f64
    }

    pub fn height(&self) -> f64 {
        self.image.height() as f64
    }

    pub fn to_source(&self, p: Point) -> Point {
        Point::new(p.x / self.scale, p.y / self.scale)
    }
}

/// Resize `img` so it fits a `size × size` box, preserving aspect ratio.
///
/// The longer side always becomes `size`; small images are upscaled.
pub fn resize_to_fit(img: &GrayImage, size: u32) -> Result<WorkingImage, DetectError> {
    let (width, height) = img.dimensions();
    let longest = width.max(height);
    if size == 0 || longest == 0 {
        return Err(DetectError::InvalidResize {
            width,
            height,
            size,
        });
    }

    let scale = size as f64 / longest as f64;
    let w = ((width as f64 * scale) as u32).max(1);
    let h = ((height as f64 * scale) as u32).max(1);
    debug!("image resized from {width}x{height} to {w}x{h}");

    Ok(WorkingImage {
        image: imageops::resize(img, w, h, FilterType::Triangle),
        scale,
    })
}

/// Corner candidates from the `chess-corners` ChESS response detector.
pub struct ChessCornerDetector {
    pub cfg: ChessConfig,
}

impl ChessCornerDetector {
    pub fn new(cfg: ChessConfig) -> Self {
        Self { cfg }
    }
}

impl Default for ChessCornerDetector {
    fn default() -> Self {
        Self::new(default_chess_config())
    }
}

impl CornerCandidateDetector<GrayImage> for ChessCornerDetector {
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image),
            fields(width = image.width(), height = image.height())
        )
    )]
    fn detect_candidates(&self, image: &GrayImage) -> Option<Vec<Point>> {
        let corners = find_chess_corners_image(image, &self.cfg);
        debug!("found {} ChESS corners", corners.len());
        if corners.is_empty() {
            return None;
        }
        Some(corners.iter().map(adapt_chess_corner).collect())
    }
}

fn adapt_chess_corner(c: &CornerDescriptor) -> Point {
    Point::new(c.x as f64, c.y as f64)
}

/// Segmentation of one image, in working-image pixels.
#[derive(Clone, Debug)]
pub struct ImageSegmentation {
    pub working: WorkingImage,
    pub result: ReconstructionResult,
}

impl ImageSegmentation {
    /// Final grid mapped back into source-image pixels, as `rows[rank][file]`.
    pub fn source_rows(&self) -> Option<[[Point; BOARD_SIZE]; BOARD_SIZE]> {
        let mut rows = self.result.grid.to_rows()?;
        for p in rows.iter_mut().flatten() {
            *p = self.working.to_source(*p);
        }
        Some(rows)
    }

    pub fn grid(&self) -> &BoardGrid {
        &self.result.grid
    }
}

/// Run the full pipeline on a source image: resize, interior block, ChESS
/// candidates, reconstruction.
///
/// A caller-supplied `kernel` is given in source pixels. Without one the
/// block is searched among the ChESS candidates, seeded at the image center.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(img, kernel, candidates, params),
        fields(width = img.width(), height = img.height())
    )
)]
pub fn segment_image(
    img: &GrayImage,
    size: u32,
    kernel: Option<&StaticKernel>,
    candidates: &ChessCornerDetector,
    params: &ReconstructParams,
) -> Result<ImageSegmentation, DetectError> {
    let working = resize_to_fit(img, size)?;
    let (width, height) = (working.width(), working.height());
    let result = match kernel {
        Some(kernel) => segment_board(
            &working.image,
            width,
            height,
            &kernel.scaled(working.scale),
            candidates,
            params,
        )?,
        None => {
            let center = Point::new(width / 2.0, height / 2.0);
            let interior = LatticeInteriorDetector::new(candidates, center);
            segment_board(&working.image, width, height, &interior, candidates, params)?
        }
    };
    Ok(ImageSegmentation { working, result })
}
