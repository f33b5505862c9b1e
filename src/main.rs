use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use stopmotion::config::{self, RunParams};
use stopmotion::core::assembler;
use stopmotion::core::frame_manager::FrameManager;
use stopmotion::logging;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    debug_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a stop-motion video from a source clip
    Run {
        #[arg(short, long, required_unless_present = "params")]
        input: Option<PathBuf>,
        /// Defaults to the platform video folder
        #[arg(short, long, conflicts_with = "params")]
        output_dir: Option<PathBuf>,
        #[arg(long, default_value = config::DEFAULT_OUTPUT_NAME, conflicts_with = "params")]
        output_name: String,
        /// Stop-motion frame rate to sample at
        #[arg(short, long, default_value = "8", conflicts_with = "params")]
        fps: NonZeroU32,
        /// Draw optical-flow arrows between consecutive frames
        #[arg(long, default_value_t = false, conflicts_with = "params")]
        overlay: bool,
        /// Frame rate of the written video (defaults to --fps)
        #[arg(long, conflicts_with = "params")]
        output_fps: Option<NonZeroU32>,
        /// Keep numbered intermediate images in this directory
        #[arg(long, conflicts_with = "params")]
        frames_dir: Option<PathBuf>,
        #[arg(long, default_value = config::DEFAULT_IMAGE_EXT, conflicts_with = "params")]
        image_ext: String,
        /// Load all run parameters from a JSON file (excludes the other run flags)
        #[arg(long, conflicts_with = "input")]
        params: Option<PathBuf>,
        /// Print the run report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Encode a directory of numbered images into a video
    Assemble {
        #[arg(short = 'd', long)]
        frames_dir: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, default_value = "12")]
        fps: NonZeroU32,
        #[arg(long, default_value = config::DEFAULT_IMAGE_EXT)]
        ext: String,
    },
    /// Print frame rate and size of a video as JSON
    Probe {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug_log.as_deref())?;

    match cli.command {
        Commands::Run {
            input,
            output_dir,
            output_name,
            fps,
            overlay,
            output_fps,
            frames_dir,
            image_ext,
            params,
            json,
        } => {
            let params = match (params, input) {
                (Some(path), _) => load_params(&path)?,
                (None, Some(input)) => RunParams {
                    input,
                    output_dir: output_dir.unwrap_or_else(config::default_output_dir),
                    output_name,
                    target_fps: fps,
                    overlay,
                    output_fps,
                    frames_dir,
                    image_ext,
                },
                (None, None) => anyhow::bail!("either --input or --params is required"),
            };
            run_pipeline(&params, json)?;
        }
        Commands::Assemble { frames_dir, output, fps, ext } => {
            let store = FrameManager::new(&frames_dir, &ext)?;
            let video = assembler::assemble_dir(&store, &output, fps)
                .with_context(|| format!("No video written from {}", frames_dir.display()))?;
            println!(
                "Wrote {} frames ({}x{} @ {} fps) to {}",
                video.frames_written,
                video.width,
                video.height,
                video.fps,
                video.path.display()
            );
        }
        Commands::Probe { input } => {
            let info = stopmotion::probe(&input)
                .with_context(|| format!("Failed to probe {}", input.display()))?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

fn load_params(path: &Path) -> Result<RunParams> {
    RunParams::from_json_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn run_pipeline(params: &RunParams, json: bool) -> Result<()> {
    let report = stopmotion::run(params)
        .with_context(|| format!("Stop-motion run failed for {}", params.input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let source_fps = report
        .source_fps
        .map_or_else(|| "unknown".to_string(), |fps| fps.to_string());
    println!("Source FPS: {} | Frames kept: {}", source_fps, report.retained);
    if report.interrupted {
        println!("Decoding stopped early; kept frames up to the failure");
    }
    println!("Video written to {}", report.output.display());
    Ok(())
}
