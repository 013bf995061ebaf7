//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, Command, ImageArgs, ServeArgs};
use crate::{
    config::{StudioConfig, StudioConfigBuilder},
    tracing_config::events,
    types::{BackgroundColor, BlurIntensity},
};
use anyhow::{Context, Result};
use log::debug;

const MIB: usize = 1024 * 1024;

/// Merge configuration file, environment and CLI flags into a `StudioConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the configuration; later sources win: defaults, file, environment, flags
    pub(crate) fn from_cli(cli: &Cli) -> Result<StudioConfig> {
        let base = Self::load_file(cli)?.with_env_overrides();
        Self::from_cli_with_base(cli, base)
    }

    /// Apply the CLI flags on top of an already loaded `base`
    pub(crate) fn from_cli_with_base(cli: &Cli, base: StudioConfig) -> Result<StudioConfig> {
        let mut builder = StudioConfigBuilder::from_config(base);

        if let Some(ref url) = cli.backend_url {
            builder = builder.backend_url(url.clone());
        }
        if let Some(ref key) = cli.api_key {
            builder = builder.api_key(key.clone());
        }
        if cli.timeout.is_some() {
            builder = builder.timeout_secs(cli.timeout);
        }

        builder = match cli.command {
            Command::Serve(ref args) => Self::apply_serve_args(builder, args),
            Command::RemoveBackground { ref image, .. }
            | Command::Upscale { ref image }
            | Command::Blur { ref image, .. } => Self::apply_image_args(builder, image),
        };

        builder.build().context("Invalid configuration")
    }

    fn load_file(cli: &Cli) -> Result<StudioConfig> {
        if let Some(ref path) = cli.config {
            return StudioConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()));
        }

        match StudioConfig::default_path() {
            Some(path) if path.is_file() => {
                debug!("Using configuration file {}", path.display());
                StudioConfig::from_file(&path)
                    .with_context(|| format!("Failed to load configuration from {}", path.display()))
            },
            _ => Ok(StudioConfig::default()),
        }
    }

    fn apply_serve_args(mut builder: StudioConfigBuilder, args: &ServeArgs) -> StudioConfigBuilder {
        if let Some(ref host) = args.host {
            builder = builder.host(host.clone());
        }
        if let Some(port) = args.port {
            builder = builder.port(port);
        }
        if let Some(workers) = args.workers {
            builder = builder.workers(workers);
        }
        if let Some(ref dir) = args.examples_dir {
            builder = builder.examples_dir(dir.clone());
        }
        if args.free_generations.is_some() {
            builder = builder.quota(args.free_generations);
        }
        if let Some(mib) = args.max_upload_mb {
            builder = builder.max_upload_bytes(mib.saturating_mul(MIB));
        }
        builder
    }

    fn apply_image_args(mut builder: StudioConfigBuilder, args: &ImageArgs) -> StudioConfigBuilder {
        if let Some(format) = args.format {
            builder = builder.output_format(format.into());
        }
        if let Some(quality) = args.jpeg_quality {
            builder = builder.jpeg_quality(quality);
        }
        builder
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        match cli.command {
            Command::RemoveBackground {
                ref background_color,
                ..
            } => {
                if let Some(ref hex) = background_color {
                    BackgroundColor::from_hex(hex).context("Invalid --background-color")?;
                }
            },
            Command::Blur { intensity, .. } => {
                if !BlurIntensity::in_range(intensity) {
                    events::warning_with_recommendation(
                        &format!("Blur intensity {} is outside 0.1-1.0", intensity),
                        &format!("using {}", BlurIntensity::new(intensity)),
                    );
                }
            },
            Command::Serve(ServeArgs {
                max_upload_mb: Some(0),
                ..
            }) => anyhow::bail!("--max-upload-mb must be at least 1"),
            _ => {},
        }

        if let Some(ref path) = cli.config {
            if !path.is_file() {
                anyhow::bail!("Configuration file {} does not exist", path.display());
            }
        }

        Ok(())
    }
}
