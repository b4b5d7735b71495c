//! Encoding rendered rasters to PNG or JPEG data URLs.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat, RgbImage};
use std::io::Cursor;

use crate::types::TargetFormat;

/// Encodes rasters into the target format.
#[derive(Debug, Clone)]
pub struct Encoder {
    jpeg_quality: u8,
}

impl Encoder {
    /// Create an encoder. `jpeg_quality` is on the 1-100 scale.
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Encode `image` and return the raw file bytes.
    ///
    /// PNG output is lossless RGBA8. JPEG has no alpha channel, so translucent
    /// pixels are composited onto black first.
    pub fn encode(&self, image: &DynamicImage, format: TargetFormat) -> image::ImageResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        match format {
            TargetFormat::Png => {
                DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut buffer, ImageFormat::Png)?;
            }
            TargetFormat::Jpg => {
                let rgb = flatten_onto_black(image);
                let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
                encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
            }
        }
        Ok(buffer.into_inner())
    }
}

fn flatten_onto_black(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        image::Rgb([scale(r), scale(g), scale(b)])
    })
}

/// Wrap encoded bytes in a `data:` URL.
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

/// Split a base64 `data:` URL into its media type and decoded bytes.
///
/// Returns `None` for anything that is not a base64 data URL.
pub fn parse_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    let bytes = BASE64.decode(payload).ok()?;
    Some((mime_type.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_png_is_lossless() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_fn(16, 9, |x, y| {
            image::Rgba([x as u8 * 10, y as u8 * 20, 77, 255])
        }));
        let bytes = Encoder::new(80).encode(&img, TargetFormat::Png).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 9));
        assert_eq!(decoded.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn test_jpeg_keeps_dimensions() {
        let img = DynamicImage::new_rgb8(33, 17);
        let bytes = Encoder::new(80).encode(&img, TargetFormat::Jpg).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (33, 17));
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(128, 128, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
        }));
        let high = Encoder::new(95).encode(&img, TargetFormat::Jpg).unwrap();
        let low = Encoder::new(10).encode(&img, TargetFormat::Jpg).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_transparent_pixels_flatten_to_black() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            2,
            image::Rgba([255, 255, 255, 0]),
        ));
        let flat = flatten_onto_black(&img);
        assert_eq!(flat.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_data_url_round_trip() {
        let url = to_data_url("image/png", b"\x89PNG-bytes");
        assert!(url.starts_with("data:image/png;base64,"));

        let (mime, bytes) = parse_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"\x89PNG-bytes");
    }

    #[test]
    fn test_parse_data_url_rejects_non_base64() {
        assert!(parse_data_url("data:text/plain,hello").is_none());
        assert!(parse_data_url("https://example.com/a.png").is_none());
    }
}
