use anyhow::{Context, Result};
use image::GrayImage;

use crate::core::errors::ImageReadError;
use crate::services::preprocess::{self, Preprocessor};

/// Decode upload bytes and normalize them for OCR on a blocking thread.
///
/// Decoding and the normalization passes are CPU-bound; running them inline
/// would stall the async runtime for large scans.
pub async fn decode_and_normalize_async(
    preprocessor: Preprocessor,
    bytes: Vec<u8>,
) -> Result<Result<GrayImage, ImageReadError>> {
    tokio::task::spawn_blocking(move || {
        let image = match preprocess::decode(&bytes) {
            Ok(image) => image,
            Err(e) => return Ok(Err(e)),
        };
        Ok(preprocessor.normalize(&image))
    })
    .await
    .context("failed to spawn blocking task for image normalization")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PreprocessConfig;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn preprocessor() -> Preprocessor {
        Preprocessor::new(PreprocessConfig {
            upscale_factor: 2,
            denoise_sigma: 0.8,
            threshold_window: 31,
            threshold_bias: 15,
            closing_radius: 1,
        })
    }

    #[tokio::test]
    async fn decodes_and_normalizes_png_bytes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(30, 20, Rgb([240, 240, 240])));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();

        let normalized = decode_and_normalize_async(preprocessor(), png)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((normalized.width(), normalized.height()), (60, 40));
    }

    #[tokio::test]
    async fn corrupt_bytes_surface_as_image_read_error() {
        let result = decode_and_normalize_async(preprocessor(), vec![0, 1, 2, 3])
            .await
            .unwrap();
        assert!(matches!(result, Err(ImageReadError::Decode(_))));
    }
}
