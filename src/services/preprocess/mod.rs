// Image normalization for OCR accuracy
//
// Fixed stage order; every stage earns its keep on scanned pages:
// grayscale -> 2x cubic upscale -> denoise blur -> adaptive threshold
// (inverted) -> morphological closing -> invert back. Uneven lighting
// defeats a single global threshold, so the threshold is computed per pixel
// from a Gaussian-weighted neighborhood.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology;
use tracing::debug;

use crate::core::config::PreprocessConfig;
use crate::core::errors::ImageReadError;

/// Decode uploaded bytes into an image.
///
/// Zero-byte and corrupt payloads fail here; nothing downstream ever sees a
/// partially decoded image.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageReadError> {
    let image = image::load_from_memory(bytes)?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageReadError::EmptyImage { width, height });
    }
    Ok(image)
}

/// Deterministic image-to-binary-image transform. Pure function of its
/// input; all constants come from `PreprocessConfig`.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Normalize a decoded image for OCR.
    ///
    /// Output dimensions are exactly `upscale_factor` times the input and
    /// every sample is 0 or 255, with ink low and background high (the
    /// polarity Tesseract expects).
    pub fn normalize(&self, image: &DynamicImage) -> Result<GrayImage, ImageReadError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageReadError::EmptyImage { width, height });
        }

        let gray = image.to_luma8();

        // Small source text benefits from upscaling before binarization
        let factor = self.config.upscale_factor;
        let scaled = imageops::resize(
            &gray,
            width * factor,
            height * factor,
            FilterType::CatmullRom,
        );

        let blurred = gaussian_blur_f32(&scaled, self.config.denoise_sigma);

        let binary = self.adaptive_threshold_inv(&blurred);

        // Reconnect strokes the thresholding broke apart
        let mut closed = morphology::close(&binary, Norm::LInf, self.config.closing_radius);

        imageops::invert(&mut closed);

        debug!(
            "normalized image {}x{} -> {}x{}",
            width,
            height,
            closed.width(),
            closed.height()
        );

        Ok(closed)
    }

    /// Adaptive threshold with an inverted output (ink = 255).
    ///
    /// The per-pixel threshold is the Gaussian-weighted local mean minus the
    /// bias constant; a pixel strictly above its threshold is background.
    fn adaptive_threshold_inv(&self, gray: &GrayImage) -> GrayImage {
        let sigma = sigma_for_window(self.config.threshold_window);
        let local_mean = gaussian_blur_f32(gray, sigma);
        let bias = self.config.threshold_bias;

        let mut binary = GrayImage::new(gray.width(), gray.height());
        for (x, y, pixel) in gray.enumerate_pixels() {
            let threshold = i16::from(local_mean.get_pixel(x, y)[0]) - bias;
            let value = if i16::from(pixel[0]) > threshold { 0 } else { 255 };
            binary.put_pixel(x, y, Luma([value]));
        }
        binary
    }
}

/// Gaussian sigma matching a windowed kernel of the given width, so the
/// window size stays the tunable and the sigma follows it.
fn sigma_for_window(window: u32) -> f32 {
    0.3 * ((window as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn preprocessor() -> Preprocessor {
        Preprocessor::new(PreprocessConfig {
            upscale_factor: 2,
            denoise_sigma: 0.8,
            threshold_window: 31,
            threshold_bias: 15,
            closing_radius: 1,
        })
    }

    /// Light page with a dark stroke through the middle
    fn page_with_stroke() -> DynamicImage {
        let img = image::RgbImage::from_fn(64, 48, |_, y| {
            if (20..24).contains(&y) {
                Rgb([20, 20, 20])
            } else {
                Rgb([235, 235, 235])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn output_is_exactly_double_the_input() {
        let normalized = preprocessor().normalize(&page_with_stroke()).unwrap();
        assert_eq!(normalized.width(), 128);
        assert_eq!(normalized.height(), 96);
    }

    #[test]
    fn output_is_binary_valued() {
        let normalized = preprocessor().normalize(&page_with_stroke()).unwrap();
        for pixel in normalized.pixels() {
            assert!(
                pixel[0] == 0 || pixel[0] == 255,
                "sample {} is not binary",
                pixel[0]
            );
        }
    }

    #[test]
    fn ink_ends_up_dark_on_light_background() {
        let normalized = preprocessor().normalize(&page_with_stroke()).unwrap();
        // The stroke row should come out as ink (0), a far corner as background
        assert_eq!(normalized.get_pixel(64, 44)[0], 0);
        assert_eq!(normalized.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn zero_area_image_is_rejected() {
        let empty = DynamicImage::new_luma8(0, 0);
        assert!(matches!(
            preprocessor().normalize(&empty),
            Err(ImageReadError::EmptyImage { .. })
        ));
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(ImageReadError::Decode(_))
        ));
        assert!(matches!(decode(&[]), Err(ImageReadError::Decode(_))));
    }

    #[test]
    fn window_sigma_tracks_window_size() {
        // 3-wide window is the small denoise kernel
        assert!((sigma_for_window(3) - 0.8).abs() < 1e-6);
        assert!((sigma_for_window(31) - 5.0).abs() < 1e-6);
    }
}
