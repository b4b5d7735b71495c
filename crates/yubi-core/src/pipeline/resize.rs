//! Bounded resizing onto a fresh raster.
//!
//! The bounds are applied in two independent steps, width first and then
//! height, and the height step computes its width from the *original*
//! dimensions. When both bounds are exceeded the width step is discarded, so
//! the result can end up wider than `max_width` (1600x900 becomes 1066x600).
//! This matches the browser tool's output and is kept for parity.

use image::imageops::FilterType;
use image::DynamicImage;

/// Compute output dimensions for an image of `width` x `height`.
///
/// Never upscales. Fractional results are truncated the way a canvas
/// truncates its width/height, and clamped to at least one pixel.
pub fn target_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (w, h) = (width as f64, height as f64);
    let mut new_width = w;
    let mut new_height = h;

    if width > max_width {
        new_width = max_width as f64;
        new_height = h * max_width as f64 / w;
    }

    if height > max_height {
        new_height = max_height as f64;
        new_width = w * max_height as f64 / h;
    }

    (truncate_dimension(new_width), truncate_dimension(new_height))
}

fn truncate_dimension(value: f64) -> u32 {
    (value.trunc() as u32).max(1)
}

/// Draw `image` onto a raster of exactly `width` x `height`.
///
/// Uses bilinear filtering, close to a canvas's default smoothing. Returns a
/// copy untouched when the size is unchanged.
pub fn render(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    image.resize_exact(width, height, FilterType::Triangle)
}
