//! Studio CLI
//!
//! `serve` runs the web studio; the other subcommands push one local image
//! through the same gateway and write the processed result to disk.

use super::config::CliConfigBuilder;
use crate::{
    backends::create_backend,
    config::{OutputFormat, StudioConfig},
    gateway::Gateway,
    server,
    services::OutputFormatHandler,
    tracing_config::{events, init_cli_tracing, spans, TracingFormat},
    types::{BackgroundColor, BackgroundOptions, BlurIntensity, ComparisonResult, Feature, ImageInput, RequestContext},
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Before/after image studio: background removal, upscaling and background blur
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bg-studio")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (JSON) [default: <config dir>/bg-studio/config.json if present]
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the processing service
    #[arg(long, value_name = "URL", global = true)]
    pub backend_url: Option<String>,

    /// API key for the processing service (prefer the BG_STUDIO_API_KEY variable)
    #[arg(long, value_name = "KEY", global = true)]
    pub api_key: Option<String>,

    /// Request timeout for the processing service in seconds [default: none]
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console, global = true)]
    pub log_format: CliLogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the web studio
    Serve(ServeArgs),

    /// Remove the background of an image, optionally replacing it
    RemoveBackground {
        #[command(flatten)]
        image: ImageArgs,

        /// Replacement background image
        #[arg(long, value_name = "PATH")]
        background_image: Option<PathBuf>,

        /// Replacement background color (#RRGGBB)
        #[arg(long, value_name = "HEX")]
        background_color: Option<String>,
    },

    /// Upscale an image
    Upscale {
        #[command(flatten)]
        image: ImageArgs,
    },

    /// Blur the background of an image
    Blur {
        #[command(flatten)]
        image: ImageArgs,

        /// Blur strength between 0.1 and 1.0 (snapped to steps of 0.1)
        #[arg(short, long, default_value_t = BlurIntensity::DEFAULT)]
        intensity: f32,
    },
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Number of HTTP workers (0 = one per CPU core)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Directory with example images in remove-background/, upscale/ and blur/
    #[arg(long, value_name = "PATH")]
    pub examples_dir: Option<PathBuf>,

    /// Limit every session to this many successful generations
    #[arg(long, value_name = "COUNT")]
    pub free_generations: Option<u32>,

    /// Maximum upload size in MiB
    #[arg(long, value_name = "MIB")]
    pub max_upload_mb: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Input image
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file [default: <input stem>_<operation>.<format extension>]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output format [default: from the output extension, then the configuration]
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// JPEG quality (0-100)
    #[arg(long)]
    pub jpeg_quality: Option<u8>,

    /// Also write a side-by-side before/after image to this path
    #[arg(long, value_name = "PATH")]
    pub comparison: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
    Tiff,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Png => Self::Png,
            CliOutputFormat::Jpeg => Self::Jpeg,
            CliOutputFormat::Webp => Self::WebP,
            CliOutputFormat::Tiff => Self::Tiff,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => Self::Console,
            CliLogFormat::Compact => Self::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => Self::Json,
        }
    }
}

/// Entry point of the `bg-studio` binary
///
/// Synchronous on purpose: the remote backend uses a blocking HTTP client,
/// which must be created and dropped outside of any async runtime.
///
/// # Errors
/// Any configuration, I/O or processing failure, with context
pub fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = init_cli_tracing(cli.verbose, cli.log_format.into())
        .context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    let backend = create_backend(&config).context("Failed to create processing backend")?;
    let _session = spans::session(&session_id, backend.name()).entered();
    let gateway = Gateway::new(backend);

    match cli.command {
        Command::Serve(_) => serve(&config, &gateway),
        Command::RemoveBackground {
            ref image,
            ref background_image,
            ref background_color,
        } => {
            let options = background_options(background_image.as_deref(), background_color.as_deref())?;
            process_single_file(&config, image, Feature::RemoveBackground, &session_id, |input, ctx| {
                gateway.remove_background(input, &options, ctx)
            })
        },
        Command::Upscale { ref image } => {
            process_single_file(&config, image, Feature::Upscale, &session_id, |input, ctx| {
                gateway.upscale(input, ctx)
            })
        },
        Command::Blur {
            ref image,
            intensity,
        } => {
            let intensity = BlurIntensity::new(intensity);
            process_single_file(&config, image, Feature::BlurBackground, &session_id, |input, ctx| {
                gateway.blur_background(input, intensity, ctx)
            })
        },
    }
}

/// Run the HTTP server on a dedicated actix system until interrupted
fn serve(config: &StudioConfig, gateway: &Gateway) -> Result<()> {
    let bind_address = config.server.bind_address();
    let _span = spans::server(&bind_address).entered();

    println!("🚀 Studio running at http://{}", bind_address);
    actix_web::rt::System::new().block_on(server::run(config, gateway.clone()))
}

fn background_options(image: Option<&Path>, color: Option<&str>) -> Result<BackgroundOptions> {
    let mut options = BackgroundOptions::none();
    if let Some(path) = image {
        let background = ImageInput::from_path(path)
            .with_context(|| format!("Failed to load background image {}", path.display()))?;
        options = options.with_image(background.image().clone());
    }
    if let Some(hex) = color {
        options = options.with_color(BackgroundColor::from_hex(hex)?);
    }
    Ok(options)
}

fn process_single_file<F>(
    config: &StudioConfig,
    args: &ImageArgs,
    feature: Feature,
    session_id: &str,
    operation: F,
) -> Result<()>
where
    F: FnOnce(Option<ImageInput>, &RequestContext) -> crate::Result<ComparisonResult>,
{
    let _span = spans::file_processing(&args.input, feature.slug()).entered();

    let input = ImageInput::from_path(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let (width, height) = input.dimensions();
    info!("Input: {} ({}x{})", args.input.display(), width, height);

    let format = output_format(args, config);
    if feature == Feature::RemoveBackground {
        OutputFormatHandler::validate_for_background_removal(format);
    }
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| generate_output_path(&args.input, feature, format));

    let ctx = RequestContext::new(session_id).with_user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "-cli/",
        env!("CARGO_PKG_VERSION")
    ));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("{}...", feature.label()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = operation(Some(input), &ctx);
    spinner.finish_and_clear();
    let result = result.map_err(|e| {
        events::error_with_context(&e, feature.label());
        e
    })?;
    events::performance_metric(feature.slug(), result.elapsed_ms());

    let encoded = OutputFormatHandler::encode(result.processed(), format, config.jpeg_quality)
        .context("Failed to encode result")?;
    std::fs::write(&output_path, encoded)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    let (out_width, out_height) = (result.processed().width(), result.processed().height());
    println!(
        "✅ {} -> {} ({}x{}, {}ms)",
        args.input.display(),
        output_path.display(),
        out_width,
        out_height,
        result.elapsed_ms()
    );

    if let Some(ref comparison_path) = args.comparison {
        write_comparison(&result, comparison_path, config.jpeg_quality)?;
        println!("🖼️  Comparison written to {}", comparison_path.display());
    }

    Ok(())
}

fn write_comparison(result: &ComparisonResult, path: &Path, jpeg_quality: u8) -> Result<()> {
    let format = OutputFormatHandler::from_path(path).unwrap_or(OutputFormat::Png);
    let canvas = DynamicImage::ImageRgba8(result.side_by_side());
    let encoded = OutputFormatHandler::encode(&canvas, format, jpeg_quality)
        .context("Failed to encode comparison image")?;
    std::fs::write(path, encoded).with_context(|| format!("Failed to write {}", path.display()))
}

/// Explicit `--format`, then the output extension, then the configured default
fn output_format(args: &ImageArgs, config: &StudioConfig) -> OutputFormat {
    if let Some(format) = args.format {
        return format.into();
    }
    args.output
        .as_deref()
        .and_then(|path| OutputFormatHandler::from_path(path).ok())
        .unwrap_or(config.output_format)
}

/// Generate output path with the operation suffix and correct extension
fn generate_output_path(input_path: &Path, feature: Feature, format: OutputFormat) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    let dir = input_path.parent().unwrap_or(Path::new("."));

    dir.join(format!(
        "{}_{}.{}",
        stem.to_string_lossy(),
        feature.output_suffix(),
        OutputFormatHandler::get_extension(format)
    ))
}
