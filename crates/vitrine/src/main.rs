//! Command line front end for vitrine.
//!
//! `frame` and `recenter` run the deterministic transforms offline;
//! `session` drives a scripted editing session against the Gemini API.

mod error;
mod files;
mod script;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vitrine_gemini::{GeminiConfig, GeminiGateway};
use vitrine_geometry::{AspectRatio, cover_fit_crop_to_width, scale_and_recenter};
use vitrine_workflow::{Studio, WorkflowConfig};

use crate::error::CliError;
use crate::files::{ExportTarget, read_image, read_json, write_image};
use crate::script::Step;

/// Staged product-photo editing.
#[derive(Parser)]
#[command(name = "vitrine", version)]
struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Workflow configuration file (JSON).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop an image to an aspect ratio with cover semantics.
    Frame(FrameArgs),
    /// Scale an image about its center on a transparent canvas.
    Recenter(RecenterArgs),
    /// Run a scripted editing session against the Gemini API.
    Session(SessionArgs),
}

#[derive(Args)]
struct FrameArgs {
    /// Input image.
    input: PathBuf,

    /// Output PNG path.
    #[arg(short, long)]
    output: PathBuf,

    /// Target aspect ratio as "W:H".
    #[arg(long, default_value = "1:1")]
    aspect: AspectRatio,

    /// Zoom on top of the cover scale (1 to 2).
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// Horizontal pan (-1 to 1).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_x: f64,

    /// Vertical pan (-1 to 1).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_y: f64,

    /// Output width in pixels; defaults to the configured width.
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    width: Option<u32>,
}

#[derive(Args)]
struct RecenterArgs {
    /// Input image, usually a cutout with transparency.
    input: PathBuf,

    /// Output PNG path.
    #[arg(short, long)]
    output: PathBuf,

    /// Scale factor about the center.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "generate"])))]
struct SessionArgs {
    /// Script file: a JSON array of steps.
    script: PathBuf,

    /// Start from this image.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Start from an image generated from this prompt.
    #[arg(long)]
    generate: Option<String>,

    /// Aspect ratio for `--generate`.
    #[arg(long, default_value = "1:1", requires = "generate")]
    generate_aspect: AspectRatio,

    /// Final PNG path, or a directory for default names.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Gateway configuration file (JSON).
    #[arg(long, value_name = "FILE")]
    gemini_config: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<WorkflowConfig, CliError> {
    let config = match path {
        Some(path) => read_json(path)?,
        None => WorkflowConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn frame(args: &FrameArgs, config: &WorkflowConfig) -> Result<(), CliError> {
    let image = read_image(&args.input)?;
    let width = args.width.unwrap_or(config.output_width);
    info!(aspect = %args.aspect, width, zoom = args.zoom, pan_x = args.pan_x, pan_y = args.pan_y, "framing");
    let framed =
        cover_fit_crop_to_width(&image, width, args.aspect, args.zoom, args.pan_x, args.pan_y)?;
    write_image(&args.output, &framed)
}

fn recenter(args: &RecenterArgs) -> Result<(), CliError> {
    let image = read_image(&args.input)?;
    info!(scale = args.scale, "recentering");
    let scaled = scale_and_recenter(&image, args.scale)?;
    write_image(&args.output, &scaled)
}

async fn session(args: SessionArgs, config: WorkflowConfig) -> Result<(), CliError> {
    let steps: Vec<Step> = read_json(&args.script)?;
    let gemini_config = match &args.gemini_config {
        Some(path) => read_json(path)?,
        None => GeminiConfig::default(),
    };
    let mut studio = Studio::new(GeminiGateway::new(gemini_config)?, config)?;

    match (&args.input, &args.generate) {
        (Some(path), _) => {
            studio.open(read_image(path)?)?;
        }
        (None, Some(prompt)) => {
            studio.generate(prompt, args.generate_aspect).await?;
        }
        // clap requires one of the two.
        (None, None) => return Err(vitrine_workflow::WorkflowError::NoSession.into()),
    }

    let target = ExportTarget::new(&args.output);
    let report = script::run(&mut studio, &steps, &target).await?;

    for text in &report.advisories {
        println!("{text}");
    }
    for (index, message) in &report.failures {
        eprintln!("step {index}: {message}");
    }

    let png = studio.export_png()?;
    write_image(&target.final_path(), &png)?;
    info!(
        steps = steps.len(),
        exports = report.exports,
        failures = report.failures.len(),
        "session finished"
    );
    studio.reset_session();
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Frame(args) => frame(&args, &config),
        Command::Recenter(args) => recenter(&args),
        Command::Session(args) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(CliError::Runtime)?;
            runtime.block_on(session(args, config))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn frame_arguments_parse() {
        let cli = Cli::try_parse_from([
            "vitrine", "frame", "in.jpg", "-o", "out.png", "--aspect", "16:9", "--pan-x", "-0.5",
        ])
        .unwrap();
        let Command::Frame(args) = cli.command else {
            panic!("expected frame");
        };
        assert_eq!(args.aspect, "16:9".parse::<AspectRatio>().unwrap());
        assert!((args.pan_x + 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn session_requires_a_source() {
        assert!(Cli::try_parse_from(["vitrine", "session", "steps.json"]).is_err());
        assert!(
            Cli::try_parse_from([
                "vitrine", "session", "steps.json", "--input", "a.png", "--generate", "kettle"
            ])
            .is_err()
        );
        assert!(
            Cli::try_parse_from(["vitrine", "session", "steps.json", "--generate", "kettle"])
                .is_ok()
        );
    }

    #[test]
    fn invalid_aspect_is_rejected() {
        assert!(
            Cli::try_parse_from(["vitrine", "frame", "in.png", "-o", "o.png", "--aspect", "0:1"])
                .is_err()
        );
    }
}
