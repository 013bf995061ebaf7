//! Processing backends
//!
//! The gateway only talks to [`ProcessingBackend`]. This module provides:
//! - `remote`: the hosted processing API, reached over HTTP
//! - `quota`: a decorator limiting free generations per session

pub mod quota;
pub mod remote;

#[cfg(test)]
pub(crate) mod test_utils;

pub use self::quota::QuotaBackend;
pub use self::remote::RemoteBackend;

use crate::{
    config::StudioConfig,
    error::Result,
    types::{BackgroundOptions, BlurIntensity, RequestContext},
};
use image::DynamicImage;
use std::sync::Arc;
use tracing::info;

/// The capability set of an image-processing backend
///
/// Every call is one synchronous round-trip. Implementations must not keep
/// per-request state between calls; anything they need about the caller
/// arrives in the [`RequestContext`].
pub trait ProcessingBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Remove the background of `image`, optionally replacing it
    ///
    /// # Errors
    /// Any failure of the underlying service
    fn remove_background(
        &self,
        image: &DynamicImage,
        options: &BackgroundOptions,
        ctx: &RequestContext,
    ) -> Result<DynamicImage>;

    /// Produce a higher resolution version of `image`
    ///
    /// # Errors
    /// Any failure of the underlying service
    fn upscale(&self, image: &DynamicImage, ctx: &RequestContext) -> Result<DynamicImage>;

    /// Blur the background of `image` with the given strength
    ///
    /// # Errors
    /// Any failure of the underlying service
    fn blur_background(
        &self,
        image: &DynamicImage,
        intensity: BlurIntensity,
        ctx: &RequestContext,
    ) -> Result<DynamicImage>;
}

/// Build the backend described by `config`
///
/// # Errors
/// - `Http` if the HTTP client cannot be constructed
pub fn create_backend(config: &StudioConfig) -> Result<Arc<dyn ProcessingBackend>> {
    let remote: Arc<dyn ProcessingBackend> = Arc::new(RemoteBackend::new(config.backend.clone())?);
    info!(
        backend = remote.name(),
        base_url = %config.backend.base_url,
        "Processing backend ready"
    );

    if config.quota.enabled {
        info!(
            free_generations = config.quota.free_generations,
            "Per-session quota enabled"
        );
        Ok(Arc::new(QuotaBackend::new(
            remote,
            config.quota.free_generations,
        )))
    } else {
        Ok(remote)
    }
}
