//! Image transformer
//!
//! Downscales an image so its longer axis fits the configured cap (aspect
//! preserved) and re-encodes to JPEG at a fixed quality. Output is always
//! JPEG regardless of the input format; alpha channels are flattened.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};

pub struct ImageTransformer;

impl ImageTransformer {
    /// Decode, downscale if either axis exceeds `max_dimension`, and encode
    /// to JPEG at `quality`. Returns the encoded bytes and final dimensions.
    pub fn downscale_and_encode(
        data: &[u8],
        max_dimension: u32,
        quality: u8,
    ) -> Result<(Bytes, u32, u32), anyhow::Error> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()?;

        let (width, height) = img.dimensions();
        let img = if width > max_dimension || height > max_dimension {
            tracing::debug!(
                width,
                height,
                max_dimension,
                "Downscaling image to fit longer-axis cap"
            );
            // `resize` preserves aspect ratio; the longer axis lands on the cap.
            img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
        } else {
            img
        };

        // JPEG has no alpha channel.
        let img = DynamicImage::ImageRgb8(img.to_rgb8());
        let (out_width, out_height) = img.dimensions();

        let estimated_size = (out_width * out_height * 3) as usize / 4;
        let mut buffer = Vec::with_capacity(estimated_size);
        let mut cursor = Cursor::new(&mut buffer);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
        img.write_with_encoder(encoder)?;

        Ok((Bytes::from(buffer), out_width, out_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 200, 30]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn decode_dims(data: &[u8]) -> (u32, u32) {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
            .dimensions()
    }

    #[test]
    fn test_wide_image_capped_on_longer_axis() {
        let data = png_bytes(2000, 500);
        let (out, w, h) = ImageTransformer::downscale_and_encode(&data, 800, 85).unwrap();

        assert_eq!(w, 800);
        // Aspect ratio 4:1 preserved within rounding.
        assert!((h as i64 - 200).unsigned_abs() <= 1, "height was {}", h);
        assert_eq!(decode_dims(&out), (w, h));
    }

    #[test]
    fn test_tall_image_capped_on_longer_axis() {
        let data = png_bytes(300, 1200);
        let (_, w, h) = ImageTransformer::downscale_and_encode(&data, 800, 85).unwrap();

        assert_eq!(h, 800);
        assert!((w as i64 - 200).unsigned_abs() <= 1, "width was {}", w);
    }

    #[test]
    fn test_small_image_untouched() {
        let data = png_bytes(400, 300);
        let (_, w, h) = ImageTransformer::downscale_and_encode(&data, 800, 85).unwrap();
        assert_eq!((w, h), (400, 300));
    }

    #[test]
    fn test_output_is_jpeg() {
        let data = png_bytes(100, 100);
        let (out, _, _) = ImageTransformer::downscale_and_encode(&data, 800, 85).unwrap();
        let format = ImageReader::new(Cursor::new(out.as_ref()))
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_alpha_is_flattened() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([255, 0, 0, 128]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();

        let result = ImageTransformer::downscale_and_encode(&buffer, 800, 85);
        assert!(result.is_ok());
    }

    #[test]
    fn test_corrupt_input_errors() {
        let result = ImageTransformer::downscale_and_encode(b"garbage", 800, 85);
        assert!(result.is_err());
    }
}
