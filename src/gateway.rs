//! The interaction gateway
//!
//! One stateless entry point per feature. Each call validates that an image
//! was supplied, makes exactly one backend call and pairs the untouched input
//! with the backend's output. Backend errors are returned as they are; there
//! is no retry, timeout or caching here.

use crate::{
    backends::ProcessingBackend,
    error::{Result, StudioError},
    types::{BackgroundOptions, BlurIntensity, ComparisonResult, Feature, ImageInput, RequestContext},
};
use instant::Instant;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Routes validated user input to a [`ProcessingBackend`]
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn ProcessingBackend>,
}

impl Gateway {
    #[must_use]
    pub fn new(backend: Arc<dyn ProcessingBackend>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn ProcessingBackend> {
        &self.backend
    }

    /// Remove (and optionally replace) the background of `image`
    ///
    /// # Errors
    /// - `Validation` if `image` is `None`; the backend is not called
    /// - whatever the backend returns, unchanged
    #[instrument(skip_all, fields(session_id = %ctx.session_id(), request_id = %ctx.request_id()))]
    pub fn remove_background(
        &self,
        image: Option<ImageInput>,
        options: &BackgroundOptions,
        ctx: &RequestContext,
    ) -> Result<ComparisonResult> {
        let image = Self::require_image(image, Feature::RemoveBackground)?;
        debug!(
            replacement_image = options.image.is_some(),
            replacement_color = ?options.color.map(|c| c.to_hex()),
            "Background options"
        );
        self.run(Feature::RemoveBackground, image, ctx, |backend, input| {
            backend.remove_background(input.image(), options, ctx)
        })
    }

    /// Upscale `image`
    ///
    /// # Errors
    /// - `Validation` if `image` is `None`; the backend is not called
    /// - whatever the backend returns, unchanged
    #[instrument(skip_all, fields(session_id = %ctx.session_id(), request_id = %ctx.request_id()))]
    pub fn upscale(&self, image: Option<ImageInput>, ctx: &RequestContext) -> Result<ComparisonResult> {
        let image = Self::require_image(image, Feature::Upscale)?;
        self.run(Feature::Upscale, image, ctx, |backend, input| {
            backend.upscale(input.image(), ctx)
        })
    }

    /// Blur the background of `image`
    ///
    /// # Errors
    /// - `Validation` if `image` is `None`; the backend is not called
    /// - whatever the backend returns, unchanged
    #[instrument(skip_all, fields(session_id = %ctx.session_id(), request_id = %ctx.request_id(), intensity = %intensity))]
    pub fn blur_background(
        &self,
        image: Option<ImageInput>,
        intensity: BlurIntensity,
        ctx: &RequestContext,
    ) -> Result<ComparisonResult> {
        let image = Self::require_image(image, Feature::BlurBackground)?;
        self.run(Feature::BlurBackground, image, ctx, |backend, input| {
            backend.blur_background(input.image(), intensity, ctx)
        })
    }

    fn require_image(image: Option<ImageInput>, feature: Feature) -> Result<ImageInput> {
        image.ok_or_else(|| {
            debug!(%feature, "Rejected request without image");
            StudioError::missing_image()
        })
    }

    fn run<F>(
        &self,
        feature: Feature,
        image: ImageInput,
        ctx: &RequestContext,
        call: F,
    ) -> Result<ComparisonResult>
    where
        F: FnOnce(&dyn ProcessingBackend, &ImageInput) -> Result<image::DynamicImage>,
    {
        let (width, height) = image.dimensions();
        info!(
            %feature,
            backend = self.backend.name(),
            width,
            height,
            "Processing request"
        );

        let start = Instant::now();
        let processed = call(self.backend.as_ref(), &image).map_err(|e| {
            warn!(%feature, error = %e, "Backend call failed");
            e
        })?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            %feature,
            elapsed_ms,
            output_width = processed.width(),
            output_height = processed.height(),
            "Request completed"
        );

        Ok(ComparisonResult::new(
            image,
            processed,
            feature,
            ctx.request_id(),
            elapsed_ms,
        ))
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("backend", &self.backend.name())
            .finish()
    }
}
