//! HTTP client for the hosted processing API
//!
//! Each operation is a single multipart `POST` carrying the image as PNG. The
//! service answers with the processed image bytes. Background removal asks
//! the service for a transparent cut-out and applies replacement backgrounds
//! locally.

use super::ProcessingBackend;
use crate::{
    compositing::composite_background,
    config::BackendConfig,
    error::{Result, StudioError},
    types::{BackgroundOptions, BlurIntensity, RequestContext},
};
use image::{DynamicImage, GenericImageView, ImageFormat};
use instant::Instant;
use reqwest::blocking::{
    multipart::{Form, Part},
    Client,
};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const SESSION_HEADER: &str = "X-Session-Id";
pub const REQUEST_HEADER: &str = "X-Request-Id";
pub const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";
pub const CLIENT_AGENT_HEADER: &str = "X-Client-User-Agent";

/// Backend that forwards every operation to a remote service
pub struct RemoteBackend {
    client: Client,
    config: BackendConfig,
}

impl RemoteBackend {
    /// Create a client for the service described by `config`
    ///
    /// # Errors
    /// - `Http` if the TLS backend cannot be initialised
    pub fn new(config: BackendConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        // No timeout unless configured
        builder = builder.timeout(config.timeout_secs.map(Duration::from_secs));

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Join the base URL and an endpoint path with exactly one slash
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Headers identifying the caller to the service
    #[must_use]
    pub fn context_headers(ctx: &RequestContext) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            (SESSION_HEADER, ctx.session_id().to_string()),
            (REQUEST_HEADER, ctx.request_id().to_string()),
        ];
        if let Some(addr) = ctx.client_addr() {
            headers.push((FORWARDED_FOR_HEADER, addr.to_string()));
        }
        if let Some(agent) = ctx.user_agent() {
            headers.push((CLIENT_AGENT_HEADER, agent.to_string()));
        }
        headers
    }

    fn png_part(image: &DynamicImage) -> Result<Part> {
        let mut bytes = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(Part::bytes(bytes).file_name("image.png").mime_str("image/png")?)
    }

    #[instrument(skip(self, image, extra, ctx), fields(session_id = %ctx.session_id()))]
    fn post_image(
        &self,
        operation: &str,
        path: &str,
        image: &DynamicImage,
        extra: Vec<(&'static str, String)>,
        ctx: &RequestContext,
    ) -> Result<DynamicImage> {
        let url = self.endpoint_url(path);
        let mut form = Form::new().part("image", Self::png_part(image)?);
        for (name, value) in extra {
            form = form.text(name, value);
        }

        let mut request = self.client.post(&url).multipart(form);
        for (name, value) in Self::context_headers(ctx) {
            request = request.header(name, value);
        }
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let start = Instant::now();
        debug!(%url, "Sending request to processing service");
        let response = request.send()?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%url, status = status.as_u16(), "Processing service rejected request");
            return Err(StudioError::backend_status_error(
                operation,
                status.as_u16(),
                &body,
            ));
        }

        let bytes = response.bytes()?;
        let processed = image::load_from_memory(&bytes).map_err(|e| {
            StudioError::backend(format!(
                "{} returned data that is not an image: {}",
                operation, e
            ))
        })?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            width = processed.width(),
            height = processed.height(),
            "Processing service responded"
        );
        Ok(processed)
    }
}

impl ProcessingBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    fn remove_background(
        &self,
        image: &DynamicImage,
        options: &BackgroundOptions,
        ctx: &RequestContext,
    ) -> Result<DynamicImage> {
        let cutout = self.post_image(
            "Background removal",
            &self.config.remove_background_path,
            image,
            Vec::new(),
            ctx,
        )?;

        // The service may return the mask at its own resolution
        let cutout = if cutout.dimensions() == image.dimensions() {
            cutout
        } else {
            let (width, height) = image.dimensions();
            cutout.resize_exact(width, height, image::imageops::FilterType::Lanczos3)
        };

        Ok(composite_background(&cutout, options))
    }

    fn upscale(&self, image: &DynamicImage, ctx: &RequestContext) -> Result<DynamicImage> {
        self.post_image("Upscaling", &self.config.upscale_path, image, Vec::new(), ctx)
    }

    fn blur_background(
        &self,
        image: &DynamicImage,
        intensity: BlurIntensity,
        ctx: &RequestContext,
    ) -> Result<DynamicImage> {
        self.post_image(
            "Background blur",
            &self.config.blur_path,
            image,
            vec![("intensity", intensity.to_string())],
            ctx,
        )
    }
}
