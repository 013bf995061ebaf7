//! Shared test doubles and fixtures for the integration tests

#![allow(dead_code)]

use bg_studio::{
    error::{Result, StudioError},
    BackgroundColor, BackgroundOptions, BlurIntensity, ProcessingBackend, RequestContext,
};
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use std::sync::Mutex;

/// One backend invocation with the arguments it received
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    RemoveBackground {
        size: (u32, u32),
        background_image: Option<(u32, u32)>,
        background_color: Option<BackgroundColor>,
    },
    Upscale {
        size: (u32, u32),
    },
    BlurBackground {
        size: (u32, u32),
        intensity: BlurIntensity,
    },
}

/// Backend double that records every call
///
/// Upscaling doubles both dimensions; the other operations return a
/// same-sized solid image so the output always differs from the input.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<(RecordedCall, String)>>,
    failure: Option<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(call, _)| call.clone())
            .collect()
    }

    pub fn sessions(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, session)| session.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: RecordedCall, ctx: &RequestContext) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((call, ctx.session_id().to_string()));
        match self.failure {
            Some(ref message) => Err(StudioError::backend(message.clone())),
            None => Ok(()),
        }
    }
}

impl ProcessingBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn remove_background(
        &self,
        image: &DynamicImage,
        options: &BackgroundOptions,
        ctx: &RequestContext,
    ) -> Result<DynamicImage> {
        self.record(
            RecordedCall::RemoveBackground {
                size: image.dimensions(),
                background_image: options.image.as_ref().map(GenericImageView::dimensions),
                background_color: options.color,
            },
            ctx,
        )?;
        let (width, height) = image.dimensions();
        Ok(solid(width, height, [0, 0, 0, 0]))
    }

    fn upscale(&self, image: &DynamicImage, ctx: &RequestContext) -> Result<DynamicImage> {
        self.record(
            RecordedCall::Upscale {
                size: image.dimensions(),
            },
            ctx,
        )?;
        Ok(image.resize_exact(image.width() * 2, image.height() * 2, FilterType::Nearest))
    }

    fn blur_background(
        &self,
        image: &DynamicImage,
        intensity: BlurIntensity,
        ctx: &RequestContext,
    ) -> Result<DynamicImage> {
        self.record(
            RecordedCall::BlurBackground {
                size: image.dimensions(),
                intensity,
            },
            ctx,
        )?;
        let (width, height) = image.dimensions();
        Ok(solid(width, height, [128, 128, 128, 255]))
    }
}

pub fn solid(width: u32, height: u32, pixel: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(pixel)))
}

/// A small gradient image encoded in `format`
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 90, 255])
    });
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8())
    } else {
        DynamicImage::ImageRgba8(image)
    };
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageFormat::Png)
}

pub const BOUNDARY: &str = "----bgstudio-test-boundary";

/// One multipart field: name, optional file name, content
pub struct FormField<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub data: Vec<u8>,
}

impl<'a> FormField<'a> {
    pub fn file(name: &'a str, data: Vec<u8>) -> Self {
        Self {
            name,
            file_name: Some("upload.png"),
            data,
        }
    }

    pub fn text(name: &'a str, value: &str) -> Self {
        Self {
            name,
            file_name: None,
            data: value.as_bytes().to_vec(),
        }
    }
}

/// Encode `fields` as a `multipart/form-data` body delimited by [`BOUNDARY`]
pub fn multipart_body(fields: &[FormField<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for field in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match field.file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        field.name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            },
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field.name)
                        .as_bytes(),
                );
            },
        }
        body.extend_from_slice(&field.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
