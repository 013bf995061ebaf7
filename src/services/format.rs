//! Output format handling service
//!
//! Encodes processed images for download and for embedding in JSON responses.

use crate::{
    config::OutputFormat,
    error::{Result, StudioError},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat};
use std::{io::Cursor, path::Path};

/// Service for handling output format conversions
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Encode `image` in the requested format
    ///
    /// JPEG drops the alpha channel; every other format keeps it.
    ///
    /// # Errors
    /// - `Image` if the encoder fails
    /// - `UnsupportedFormat` for WebP when built without `webp-support`
    pub fn encode(image: &DynamicImage, format: OutputFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        match format {
            OutputFormat::Png => {
                image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
            },
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality.min(100));
                rgb.write_with_encoder(encoder)?;
            },
            OutputFormat::Tiff => {
                let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                rgba.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Tiff)?;
            },
            OutputFormat::WebP => {
                #[cfg(feature = "webp-support")]
                {
                    let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                    rgba.write_to(&mut Cursor::new(&mut buffer), ImageFormat::WebP)?;
                }
                #[cfg(not(feature = "webp-support"))]
                {
                    return Err(StudioError::unsupported_format(
                        "WebP output requires the webp-support feature",
                    ));
                }
            },
        }
        Ok(buffer)
    }

    /// Get the appropriate file extension for a given output format
    ///
    /// # Examples
    /// ```rust
    /// use bg_studio::{services::OutputFormatHandler, config::OutputFormat};
    ///
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpg");
    /// ```
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Tiff => "tiff",
        }
    }

    #[must_use]
    pub fn mime_type(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Tiff => "image/tiff",
        }
    }

    /// Check if a format supports transparency (alpha channel)
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        !matches!(format, OutputFormat::Jpeg)
    }

    /// Warn when a background removal result is about to lose its transparency
    pub fn validate_for_background_removal(format: OutputFormat) {
        if !Self::supports_transparency(format) {
            log::warn!(
                "Output format {:?} does not support transparency. Background removal results may appear with a solid background.",
                format
            );
        }
    }

    /// Infer the output format from a file extension
    ///
    /// # Errors
    /// - `UnsupportedFormat` for unknown or missing extensions
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<OutputFormat> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::WebP),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            other => Err(StudioError::unsupported_format(format!(
                "'{}' (expected png, jpg, webp or tiff)",
                other
            ))),
        }
    }

    /// Build a `data:` URL suitable for an `<img src>` attribute
    #[must_use]
    pub fn data_url(bytes: &[u8], mime_type: &str) -> String {
        format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
    }
}
