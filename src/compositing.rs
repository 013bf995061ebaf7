//! Background replacement for cut-out foregrounds
//!
//! Backends that only know how to produce a transparent cut-out use this to
//! honour [`BackgroundOptions`]: the replacement image is scaled to cover the
//! canvas, the replacement color fills whatever is still transparent, and the
//! foreground is alpha-blended on top.

use crate::types::{BackgroundColor, BackgroundOptions};
use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgba, RgbaImage};
use tracing::debug;

/// Place `cutout` over the background described by `options`
#[must_use]
pub fn composite_background(cutout: &DynamicImage, options: &BackgroundOptions) -> DynamicImage {
    let foreground = cutout.to_rgba8();
    if options.is_empty() {
        return DynamicImage::ImageRgba8(foreground);
    }

    let (width, height) = foreground.dimensions();
    debug!(
        width,
        height,
        has_image = options.image.is_some(),
        color = ?options.color.map(|c| c.to_hex()),
        "Compositing replacement background"
    );

    let mut canvas = match options.color {
        Some(color) => solid_canvas(width, height, color),
        None => RgbaImage::new(width, height),
    };

    if let Some(ref background) = options.image {
        let cover = cover_resize(background, width, height);
        image::imageops::overlay(&mut canvas, &cover, 0, 0);
    }

    image::imageops::overlay(&mut canvas, &foreground, 0, 0);
    DynamicImage::ImageRgba8(canvas)
}

/// Opaque canvas filled with `color`
#[must_use]
pub fn solid_canvas(width: u32, height: u32, color: BackgroundColor) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([color.r, color.g, color.b, 255]))
}

/// Scale `image` so it covers `width`x`height`, cropping the overflow around the centre
fn cover_resize(image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.to_rgba8();
    }
    image
        .resize_to_fill(width, height, FilterType::Lanczos3)
        .to_rgba8()
}
