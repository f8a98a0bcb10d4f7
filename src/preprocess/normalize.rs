//! Image normalization for the freshness classifier.
//!
//! Decodes uploaded bytes (PNG/JPEG/BMP/GIF), forces 8-bit RGB, resizes to
//! 224×224 and scales channels to [0, 1].

use std::io::Cursor;

use image::imageops::FilterType;
use image::io::{Limits, Reader};
use image::DynamicImage;

use crate::error::InvalidImageError;
use crate::math::tensor::Tensor3;
use crate::preprocess::{IMG_CHANNELS, IMG_SIZE};

/// Largest accepted width or height.
pub const MAX_SIDE: u32 = 16_384;
/// Largest accepted pixel count (40 MP).
pub const MAX_PIXELS: u64 = 40_000_000;
/// Ceiling on what a decoder may allocate for one upload.
pub const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

/// Decodes `raw`, converts it to RGB, resizes to `IMG_SIZE × IMG_SIZE`, and
/// normalizes pixels to [0, 1].
///
/// Any alpha channel is dropped by straight conversion; palette and grayscale
/// images are expanded to three channels. Images larger than `MAX_SIDE` on
/// either side or `MAX_PIXELS` in total are refused before decoding.
pub fn normalize(raw: &[u8]) -> Result<Tensor3, InvalidImageError> {
    let img = decode_bounded(raw, MAX_PIXELS)?;

    let side = IMG_SIZE as u32;
    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, side, side, FilterType::Triangle);

    let data: Vec<f64> = resized
        .pixels()
        .flat_map(|p| p.0.map(|c| c as f64 / 255.0))
        .collect();
    Tensor3::from_data(IMG_SIZE, IMG_SIZE, IMG_CHANNELS, data)
        .ok_or_else(|| InvalidImageError::new("resized image has an unexpected buffer size"))
}

fn reader(raw: &[u8]) -> Result<Reader<Cursor<&[u8]>>, InvalidImageError> {
    Reader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| InvalidImageError::new(e.to_string()))
}

/// Reads the header first and only decodes images within the size caps.
fn decode_bounded(raw: &[u8], max_pixels: u64) -> Result<DynamicImage, InvalidImageError> {
    if raw.is_empty() {
        return Err(InvalidImageError::new("empty upload"));
    }
    let (width, height) = reader(raw)?
        .into_dimensions()
        .map_err(|e| InvalidImageError::new(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(InvalidImageError::new(format!("image has no pixels ({}x{})", width, height)));
    }
    if width > MAX_SIDE || height > MAX_SIDE || u64::from(width) * u64::from(height) > max_pixels {
        return Err(InvalidImageError::new(format!(
            "image too large ({}x{}, limit {} pixels and {} per side)",
            width, height, max_pixels, MAX_SIDE
        )));
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SIDE);
    limits.max_image_height = Some(MAX_SIDE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut decoder = reader(raw)?;
    decoder.limits(limits);
    decoder.decode().map_err(|e| InvalidImageError::new(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(img: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width.max(2)) as u8, (y * 255 / height.max(2)) as u8, 128])
        })
    }

    fn assert_canonical(t: &Tensor3) {
        assert_eq!((t.height, t.width, t.channels), (224, 224, 3));
        assert_eq!(t.data.len(), 224 * 224 * 3);
        assert!(t.data.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn any_size_and_colour_mode_becomes_224x224_rgb() {
        let inputs = vec![
            encode(&DynamicImage::ImageRgb8(gradient(500, 300)), ImageOutputFormat::Jpeg(90)),
            encode(&DynamicImage::ImageRgb8(gradient(17, 641)), ImageOutputFormat::Png),
            encode(&DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([200]))), ImageOutputFormat::Png),
            encode(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 5, Rgba([10, 20, 30, 0]))), ImageOutputFormat::Png),
            encode(&DynamicImage::ImageRgb8(gradient(1, 1)), ImageOutputFormat::Bmp),
            encode(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 30, Rgba([90, 160, 20, 255]))), ImageOutputFormat::Gif),
        ];
        for bytes in inputs {
            assert_canonical(&normalize(&bytes).unwrap());
        }
    }

    #[test]
    fn grayscale_is_replicated_across_channels() {
        let bytes = encode(&DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 10, Luma([51]))), ImageOutputFormat::Png);
        let t = normalize(&bytes).unwrap();
        assert_eq!(t.pixel(100, 100), &[0.2, 0.2, 0.2]);
    }

    #[test]
    fn alpha_is_discarded_not_blended() {
        let bytes = encode(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 0]))), ImageOutputFormat::Png);
        let t = normalize(&bytes).unwrap();
        assert_eq!(t.pixel(0, 0), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn rgb_order_is_preserved() {
        let bytes = encode(&DynamicImage::ImageRgb8(RgbImage::from_pixel(30, 20, Rgb([255, 0, 51]))), ImageOutputFormat::Png);
        let t = normalize(&bytes).unwrap();
        assert_eq!(t.pixel(223, 223), &[1.0, 0.0, 0.2]);
    }

    #[test]
    fn undecodable_input_is_rejected() {
        let png = encode(&DynamicImage::ImageRgb8(gradient(50, 50)), ImageOutputFormat::Png);
        let truncated = &png[..png.len() / 2];
        let cases: [&[u8]; 4] = [b"", b"0123456789", b"hello, this is plain text", truncated];
        for bytes in cases {
            let err = normalize(bytes).unwrap_err();
            assert!(err.to_string().starts_with("Error preprocessing image: "), "{}", err);
        }
    }

    #[test]
    fn overlong_side_is_refused_before_decoding() {
        let strip = encode(&DynamicImage::ImageLuma8(GrayImage::new(MAX_SIDE + 1, 1)), ImageOutputFormat::Png);
        let err = normalize(&strip).unwrap_err();
        assert!(err.to_string().starts_with("Error preprocessing image: image too large"), "{}", err);
    }

    #[test]
    fn pixel_budget_is_enforced_from_the_header() {
        let png = encode(&DynamicImage::ImageRgb8(gradient(20, 20)), ImageOutputFormat::Png);
        assert!(decode_bounded(&png, 400).is_ok());
        let err = decode_bounded(&png, 399).unwrap_err();
        assert!(err.to_string().contains("image too large (20x20"), "{}", err);
    }
}
