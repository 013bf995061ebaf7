//! Per-request value types shared by the gateway, backends and surfaces
//!
//! Nothing in here outlives a single request/response cycle.

use crate::error::{Result, StudioError};
use chrono::{DateTime, Utc};
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};
use uuid::Uuid;

/// The three features offered by the studio, one per tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    RemoveBackground,
    Upscale,
    BlurBackground,
}

impl Feature {
    /// All features in tab order
    pub const ALL: [Feature; 3] = [
        Feature::RemoveBackground,
        Feature::Upscale,
        Feature::BlurBackground,
    ];

    /// URL-safe identifier, also the example sub-directory name
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::RemoveBackground => "remove-background",
            Self::Upscale => "upscale",
            Self::BlurBackground => "blur",
        }
    }

    /// Human readable tab title
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::RemoveBackground => "Background Remover",
            Self::Upscale => "Image Upscaler",
            Self::BlurBackground => "Background Blur",
        }
    }

    /// Suffix appended to output file names produced for this feature
    #[must_use]
    pub fn output_suffix(self) -> &'static str {
        match self {
            Self::RemoveBackground => "nobg",
            Self::Upscale => "upscaled",
            Self::BlurBackground => "blurred",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Feature {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "remove-background" | "remove" | "remb" => Ok(Self::RemoveBackground),
            "upscale" => Ok(Self::Upscale),
            "blur" | "blur-background" => Ok(Self::BlurBackground),
            other => Err(StudioError::validation(format!("Unknown feature '{}'", other))),
        }
    }
}

/// An uploaded image: the exact bytes received plus the decoded pixels
#[derive(Debug, Clone)]
pub struct ImageInput {
    bytes: Vec<u8>,
    image: DynamicImage,
    format: Option<ImageFormat>,
}

impl ImageInput {
    /// Decode an upload, keeping the original bytes untouched
    ///
    /// # Errors
    /// - `Validation` when `bytes` is empty, undecodable, or decodes to a zero-sized image
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(StudioError::missing_image());
        }

        let format = image::guess_format(&bytes).ok();
        let image = image::load_from_memory(&bytes).map_err(|e| {
            StudioError::validation(format!("Could not decode the uploaded image: {}", e))
        })?;

        Self::checked(bytes, image, format)
    }

    /// Read and decode an image file
    ///
    /// # Errors
    /// - `Io` when the file cannot be read
    /// - `Validation` when its content is not a usable image
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| StudioError::file_io_error("read image", path, &e))?;
        Self::from_bytes(bytes)
    }

    /// Wrap an already decoded image, encoding it as PNG to obtain its bytes
    ///
    /// # Errors
    /// - `Validation` for zero-sized images
    /// - `Image` if PNG encoding fails
    pub fn from_image(image: DynamicImage) -> Result<Self> {
        let mut bytes = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
        Self::checked(bytes, image, Some(ImageFormat::Png))
    }

    fn checked(bytes: Vec<u8>, image: DynamicImage, format: Option<ImageFormat>) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(StudioError::missing_image());
        }
        Ok(Self {
            bytes,
            image,
            format,
        })
    }

    /// The bytes exactly as they were uploaded
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The decoded pixel buffer
    #[must_use]
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Detected container format of the upload, if recognised
    #[must_use]
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// MIME type of the original bytes
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.map_or("application/octet-stream", |f| f.to_mime_type())
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Consume the input, returning the original bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// RGB color used to fill a removed background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BackgroundColor {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Parse `#RRGGBB` or `#RGB` (the leading `#` is optional)
    ///
    /// # Errors
    /// - `Validation` for any other shape or non-hex digits
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StudioError::validation(format!(
                "Invalid background color '{}': expected #RRGGBB or #RGB",
                hex
            )));
        }

        let component = |range: std::ops::Range<usize>| -> Result<u8> {
            digits
                .get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| {
                    StudioError::validation(format!("Invalid background color '{}'", hex))
                })
        };

        match digits.len() {
            6 => Ok(Self::new(component(0..2)?, component(2..4)?, component(4..6)?)),
            // #RGB expands each nibble: f -> ff
            3 => Ok(Self::new(
                component(0..1)? * 17,
                component(1..2)? * 17,
                component(2..3)? * 17,
            )),
            _ => Err(StudioError::validation(format!(
                "Invalid background color '{}': expected #RRGGBB or #RGB",
                hex
            ))),
        }
    }

    /// Lowercase `#rrggbb` representation
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for BackgroundColor {
    fn default() -> Self {
        Self::white()
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for BackgroundColor {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Optional replacement for a removed background
///
/// Any combination is valid. With neither field set the background stays
/// transparent. When both are set the image wins and the color shows through
/// wherever the replacement image is itself transparent.
#[derive(Debug, Clone, Default)]
pub struct BackgroundOptions {
    pub image: Option<DynamicImage>,
    pub color: Option<BackgroundColor>,
}

impl BackgroundOptions {
    /// Keep a transparent background
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_color(mut self, color: BackgroundColor) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: DynamicImage) -> Self {
        self.image = Some(image);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.color.is_none()
    }
}

/// Blur strength, always within `[0.1, 1.0]` on a 0.1 grid
///
/// Stored as tenths so that every representable value is exactly on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlurIntensity {
    tenths: u8,
}

impl BlurIntensity {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 1.0;
    pub const STEP: f32 = 0.1;
    pub const DEFAULT: f32 = 0.5;

    /// Clamp and snap `value` onto the slider grid; NaN falls back to the default
    #[must_use]
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        let tenths = (value * 10.0).round().clamp(1.0, 10.0) as u8;
        Self { tenths }
    }

    /// Whether `value` lies inside the accepted range without clamping
    #[must_use]
    pub fn in_range(value: f32) -> bool {
        // half a step of tolerance for values typed as decimals
        value.is_finite() && value >= Self::MIN - 0.05 && value <= Self::MAX + 0.05
    }

    #[must_use]
    pub fn value(self) -> f32 {
        f32::from(self.tenths) / 10.0
    }
}

impl Default for BlurIntensity {
    fn default() -> Self {
        Self { tenths: 5 }
    }
}

impl fmt::Display for BlurIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

impl FromStr for BlurIntensity {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        trimmed
            .parse::<f32>()
            .map(Self::new)
            .map_err(|_| StudioError::validation(format!("Invalid blur intensity '{}'", s)))
    }
}

/// Identity of one invocation, threaded explicitly through every backend call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    session_id: String,
    request_id: Uuid,
    client_addr: Option<String>,
    user_agent: Option<String>,
    received_at: DateTime<Utc>,
}

impl RequestContext {
    /// Context for a request belonging to `session_id`
    pub fn new<S: Into<String>>(session_id: S) -> Self {
        Self {
            session_id: session_id.into(),
            request_id: Uuid::new_v4(),
            client_addr: None,
            user_agent: None,
            received_at: Utc::now(),
        }
    }

    /// Context with a freshly generated session id
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn with_client_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.client_addr = Some(addr.into());
        self
    }

    #[must_use]
    pub fn with_user_agent<S: Into<String>>(mut self, agent: S) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    #[must_use]
    pub fn client_addr(&self) -> Option<&str> {
        self.client_addr.as_deref()
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    #[must_use]
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

/// The before/after pair produced by one successful operation
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    original: ImageInput,
    processed: DynamicImage,
    feature: Feature,
    request_id: Uuid,
    elapsed_ms: u64,
}

impl ComparisonResult {
    #[must_use]
    pub fn new(
        original: ImageInput,
        processed: DynamicImage,
        feature: Feature,
        request_id: Uuid,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            original,
            processed,
            feature,
            request_id,
            elapsed_ms,
        }
    }

    /// The input exactly as it was supplied
    #[must_use]
    pub fn original(&self) -> &ImageInput {
        &self.original
    }

    /// The backend's output
    #[must_use]
    pub fn processed(&self) -> &DynamicImage {
        &self.processed
    }

    #[must_use]
    pub fn feature(&self) -> Feature {
        self.feature
    }

    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Wall time spent in the backend call
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    #[must_use]
    pub fn into_pair(self) -> (ImageInput, DynamicImage) {
        (self.original, self.processed)
    }

    /// Render original and processed next to each other at the original's height
    #[must_use]
    pub fn side_by_side(&self) -> RgbaImage {
        let (orig_width, height) = self.original.dimensions();
        let (proc_width, proc_height) = self.processed.dimensions();

        let processed = if proc_height == height {
            self.processed.to_rgba8()
        } else {
            let scaled_width =
                ((f64::from(proc_width) * f64::from(height) / f64::from(proc_height)).round()
                    as u32)
                    .max(1);
            self.processed
                .resize_exact(scaled_width, height, FilterType::Lanczos3)
                .to_rgba8()
        };

        let mut canvas = RgbaImage::new(orig_width + processed.width(), height);
        image::imageops::replace(&mut canvas, &self.original.image().to_rgba8(), 0, 0);
        image::imageops::replace(&mut canvas, &processed, i64::from(orig_width), 0);
        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([10, 20, 30, 255]),
        ));
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_image_input_keeps_original_bytes() {
        let bytes = png_bytes(8, 4);
        let input = ImageInput::from_bytes(bytes.clone()).unwrap();
        assert_eq!(input.bytes(), bytes.as_slice());
        assert_eq!(input.dimensions(), (8, 4));
        assert_eq!(input.format(), Some(ImageFormat::Png));
        assert_eq!(input.mime_type(), "image/png");
    }

    #[test]
    fn test_image_input_rejects_empty_and_garbage() {
        let err = ImageInput::from_bytes(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Please upload an image first!");

        let err = ImageInput::from_bytes(b"not an image".to_vec()).unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));
    }

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(
            BackgroundColor::from_hex("#FFFFFF").unwrap(),
            BackgroundColor::white()
        );
        assert_eq!(
            BackgroundColor::from_hex("f00").unwrap(),
            BackgroundColor::new(255, 0, 0)
        );
        assert_eq!(
            BackgroundColor::from_hex(" #0080ff ").unwrap(),
            BackgroundColor::new(0, 128, 255)
        );
        assert_eq!(BackgroundColor::new(255, 0, 128).to_hex(), "#ff0080");
    }

    #[test]
    fn test_parse_hex_colors_invalid() {
        for bad in ["", "#ff", "#fffff", "#gggggg", "#ffééff", "rgb(0,0,0)"] {
            assert!(BackgroundColor::from_hex(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_blur_intensity_bounds() {
        assert!((BlurIntensity::default().value() - 0.5).abs() < f32::EPSILON);
        assert!((BlurIntensity::new(0.1).value() - 0.1).abs() < f32::EPSILON);
        assert!((BlurIntensity::new(1.0).value() - 1.0).abs() < f32::EPSILON);
        assert!((BlurIntensity::new(0.0).value() - 0.1).abs() < f32::EPSILON);
        assert!((BlurIntensity::new(1.1).value() - 1.0).abs() < f32::EPSILON);
        assert!((BlurIntensity::new(-3.0).value() - 0.1).abs() < f32::EPSILON);
        assert!((BlurIntensity::new(0.34).value() - 0.3).abs() < f32::EPSILON);
        assert_eq!(BlurIntensity::new(f32::NAN), BlurIntensity::default());
        assert_eq!(BlurIntensity::new(0.7).to_string(), "0.7");
    }

    #[test]
    fn test_blur_intensity_from_str() {
        assert_eq!("".parse::<BlurIntensity>().unwrap(), BlurIntensity::default());
        assert_eq!("0.8".parse::<BlurIntensity>().unwrap(), BlurIntensity::new(0.8));
        assert!("strong".parse::<BlurIntensity>().is_err());
        assert!(BlurIntensity::in_range(0.1));
        assert!(BlurIntensity::in_range(1.0));
        assert!(!BlurIntensity::in_range(1.1));
        assert!(!BlurIntensity::in_range(0.0));
    }

    #[test]
    fn test_feature_round_trip_names() {
        for feature in Feature::ALL {
            assert_eq!(feature.slug().parse::<Feature>().unwrap(), feature);
        }
        assert!("sharpen".parse::<Feature>().is_err());
    }

    #[test]
    fn test_side_by_side_scales_processed_to_original_height() {
        let original = ImageInput::from_bytes(png_bytes(10, 10)).unwrap();
        let processed = DynamicImage::ImageRgba8(RgbaImage::new(40, 20));
        let result = ComparisonResult::new(
            original,
            processed,
            Feature::Upscale,
            Uuid::new_v4(),
            0,
        );

        let canvas = result.side_by_side();
        assert_eq!(canvas.dimensions(), (30, 10));
        assert_eq!(canvas.get_pixel(0, 0), &image::Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_request_context_builders() {
        let ctx = RequestContext::new("session-1")
            .with_client_addr("127.0.0.1")
            .with_user_agent("curl/8");
        assert_eq!(ctx.session_id(), "session-1");
        assert_eq!(ctx.client_addr(), Some("127.0.0.1"));
        assert_eq!(ctx.user_agent(), Some("curl/8"));
        assert_ne!(RequestContext::anonymous().session_id(), "session-1");
    }
}
