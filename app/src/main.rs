mod codec;
mod confirm;
mod error;
mod pipeline;
mod summary;
mod viewer;

use std::io::Write as _;
use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};

use chrono::Local;
use clap::Parser;
use env_logger::Builder;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

use pcd_exporter::ply::PlyEncoding;
use pcd_parser::parsers::Extension;

use crate::{
    codec::PlyCodec,
    confirm::StdinConfirmation,
    pipeline::{MergeConfig, MergePipeline, PipelineState},
    viewer::default_viewer,
};

#[derive(Parser, Debug)]
#[command(
    name = "pcd-merge",
    about = "Merge two PLY point cloud sequences frame by frame",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    #[arg(long, required = true, value_name = "DIR")]
    folder1: PathBuf,

    #[arg(long, required = true, value_name = "DIR")]
    folder2: PathBuf,

    #[arg(long, required = true, value_name = "DIR")]
    destination: PathBuf,

    /// Offset added to every point of the second sequence
    #[arg(
        long,
        num_args = 3,
        action = clap::ArgAction::Set,
        value_names = ["X", "Y", "Z"],
        allow_negative_numbers = true,
        default_values_t = [0.0, 0.0, 0.0]
    )]
    shift: Vec<f64>,

    #[arg(long, alias = "max_frames")]
    max_frames: Option<NonZeroUsize>,

    /// Points kept per input cloud
    #[arg(long)]
    downsample: Option<NonZeroUsize>,

    /// Show the first merged frame
    #[arg(long)]
    verbose: bool,

    /// Ask before continuing past the first merged frame
    #[arg(long, alias = "pause_first")]
    pause_first: bool,

    /// Seed for reproducible downsampling
    #[arg(long)]
    seed: Option<u64>,

    /// Write ASCII instead of binary PLY
    #[arg(long)]
    ascii: bool,

    /// Write a JSON report of the run
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,
}

impl Cli {
    fn shift(&self) -> [f64; 3] {
        match self.shift[..] {
            [x, y, z] => [x, y, z],
            _ => unreachable!("clap takes exactly three shift values"),
        }
    }

    fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            folder1: self.folder1.clone(),
            folder2: self.folder2.clone(),
            destination: self.destination.clone(),
            shift: self.shift(),
            max_frames: self.max_frames,
            downsample: self.downsample,
            verbose: self.verbose,
            pause_first: self.pause_first,
            seed: self.seed,
            extension: Extension::Ply,
        }
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message("Merging");
    pb
}

fn main() -> ExitCode {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Cli::parse();

    log::info!("folder1: {}", args.folder1.display());
    log::info!("folder2: {}", args.folder2.display());
    log::info!("destination: {}", args.destination.display());
    log::info!("shift: {:?}", args.shift());
    if let Some(max_frames) = args.max_frames {
        log::info!("max frames: {}", max_frames);
    }
    if let Some(downsample) = args.downsample {
        log::info!("downsample: {} points", downsample);
    }

    let start = std::time::Instant::now();

    let encoding = if args.ascii {
        PlyEncoding::Ascii
    } else {
        PlyEncoding::BinaryLittleEndian
    };
    let mut pipeline = MergePipeline::new(
        args.merge_config(),
        Box::new(PlyCodec::new(encoding)),
        default_viewer(),
        Box::new(StdinConfirmation::stdin()),
    )
    .with_progress(progress_bar());

    let summary = match pipeline.run() {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.summary {
        if let Err(e) = summary.write_json(path) {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    match summary.state {
        PipelineState::Aborted => log::info!(
            "Aborted after {} of {} frames",
            summary.attempted(),
            summary.bound
        ),
        _ => log::info!(
            "Merged {} frames ({} skipped) into {}",
            summary.written.len(),
            summary.skipped.len(),
            args.destination.display()
        ),
    }
    log::info!("Elapsed: {:?}", start.elapsed());

    ExitCode::SUCCESS
}
