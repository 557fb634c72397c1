//! chessgrid CLI: segment a chessboard photo into its 9x9 corner grid.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chessgrid::detect::{self, ChessCornerDetector, DEFAULT_WORKING_SIZE};
use chessgrid::{ReconstructParams, ReconstructionDebug, StaticKernel};
use clap::Parser;
use log::info;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "chessgrid")]
#[command(about = "Reconstruct the 9x9 corner grid of a chessboard photo")]
#[command(version)]
struct Cli {
    /// Path to the input image.
    image: PathBuf,

    /// JSON file with the 21 interior corners (source-image pixels).
    /// Without it the block is searched among the corner candidates.
    #[arg(long)]
    kernel: Option<PathBuf>,

    /// JSON file with reconstruction parameters; missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the JSON report (stdout when omitted).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Side of the square box the image is resized into.
    #[arg(long, default_value_t = DEFAULT_WORKING_SIZE)]
    size: u32,

    /// Include per-stage grid snapshots in the report.
    #[arg(long)]
    debug: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("Input image cannot be opened: {0}")]
    ImageOpen(#[source] detect::DetectError),

    #[error("cannot load kernel: {0}")]
    Kernel(#[from] chessgrid::KernelFileError),

    #[error("cannot load config: {0}")]
    Config(String),

    #[error("Detection failed: {0}")]
    Detection(#[source] detect::DetectError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct Report {
    image_path: String,
    working_width: u32,
    working_height: u32,
    scale: f64,
    /// `rows[rank][file] = [x, y]` in source-image pixels.
    rows: Vec<Vec<[f64; 2]>>,
    confirmed: usize,
    intersected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<ReconstructionDebug>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    let _ = chessgrid::core::init_with_level(level);
}

#[cfg(feature = "tracing")]
fn init_logging(_verbose: u8) {
    let _ = tracing_log::LogTracer::init();
    chessgrid::core::init_tracing(false);
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let img = detect::load_gray(&cli.image).map_err(CliError::ImageOpen)?;
    info!(
        "loaded {} ({}x{})",
        cli.image.display(),
        img.width(),
        img.height()
    );

    let kernel = cli.kernel.as_deref().map(StaticKernel::load).transpose()?;
    let mut params = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str::<ReconstructParams>(&raw)
                .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?
        }
        None => ReconstructParams::default(),
    };
    params.collect_debug |= cli.debug;

    let candidates = ChessCornerDetector::default();
    let seg = detect::segment_image(&img, cli.size, kernel.as_ref(), &candidates, &params)
        .map_err(CliError::Detection)?;

    let rows = seg
        .source_rows()
        .map(|rows| {
            rows.iter()
                .map(|row| row.iter().map(|p| [p.x, p.y]).collect())
                .collect()
        })
        .unwrap_or_default();
    let report = Report {
        image_path: cli.image.display().to_string(),
        working_width: seg.working.image.width(),
        working_height: seg.working.image.height(),
        scale: seg.working.scale,
        rows,
        confirmed: seg.result.confirmed,
        intersected: seg.result.intersected,
        debug: seg.result.debug,
    };

    let json = serde_json::to_string_pretty(&report)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)?;
            info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
