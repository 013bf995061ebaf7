#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # bg-studio
//!
//! A before/after image studio. Users pick one of three features, upload an
//! image and get back the original next to the processed result:
//!
//! - **Background removal**, with an optional replacement image or color
//! - **Upscaling**
//! - **Background blur** with an intensity between 0.1 and 1.0
//!
//! The processing itself lives behind the [`ProcessingBackend`] trait. The
//! [`Gateway`] validates input, makes exactly one backend call per request and
//! pairs the untouched input with the backend's output in a
//! [`ComparisonResult`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bg_studio::{
//!     backends::create_backend, BlurIntensity, Gateway, ImageInput, RequestContext,
//!     StudioConfig,
//! };
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = StudioConfig::builder()
//!     .backend_url("https://api.example.com")
//!     .build()?;
//! let gateway = Gateway::new(create_backend(&config)?);
//!
//! let input = ImageInput::from_path("portrait.jpg")?;
//! let ctx = RequestContext::new("my-session");
//! let result = gateway.blur_background(Some(input), BlurIntensity::new(0.7), &ctx)?;
//! result.processed().save("portrait_blurred.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `server` (default): actix-web single page and JSON API
//! - `cli` (default): the `bg-studio` binary (`serve`, `remove-background`, `upscale`, `blur`)
//! - `webp-support` (default): WebP output
//! - `tracing-json`: JSON log output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! bg-studio = { version = "0.1", default-features = false }
//! ```

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compositing;
pub mod config;
pub mod content;
pub mod error;
pub mod gateway;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
pub mod tracing_config;
pub mod types;

pub use backends::{ProcessingBackend, QuotaBackend, RemoteBackend};
pub use config::{OutputFormat, StudioConfig, StudioConfigBuilder};
pub use error::{Result, StudioError};
pub use gateway::Gateway;
pub use services::{ExampleCatalog, OutputFormatHandler};
pub use types::{
    BackgroundColor, BackgroundOptions, BlurIntensity, ComparisonResult, Feature, ImageInput,
    RequestContext,
};
