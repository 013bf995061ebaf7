//! Mock backend for unit tests inside the crate

use super::ProcessingBackend;
use crate::{
    error::{Result, StudioError},
    types::{BackgroundOptions, BlurIntensity, RequestContext},
};
use image::DynamicImage;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend that returns a copy of its input, or always fails
pub(crate) struct MockBackend {
    calls: AtomicUsize,
    should_fail: bool,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            should_fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, image: &DynamicImage) -> Result<DynamicImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(StudioError::backend("mock backend failure"));
        }
        Ok(image.clone())
    }
}

impl ProcessingBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn remove_background(
        &self,
        image: &DynamicImage,
        _options: &BackgroundOptions,
        _ctx: &RequestContext,
    ) -> Result<DynamicImage> {
        self.respond(image)
    }

    fn upscale(&self, image: &DynamicImage, _ctx: &RequestContext) -> Result<DynamicImage> {
        self.respond(image)
    }

    fn blur_background(
        &self,
        image: &DynamicImage,
        _intensity: BlurIntensity,
        _ctx: &RequestContext,
    ) -> Result<DynamicImage> {
        self.respond(image)
    }
}
