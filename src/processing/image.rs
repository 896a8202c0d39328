use crate::utils::PassportError;
use image::imageops::invert;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{otsu_level, threshold};
use imageproc::filter::gaussian_blur_f32;
use log::debug;
use std::path::Path;

// Sigma a 3x3 Gaussian kernel gets when none is given explicitly.
const DENOISE_SIGMA: f32 = 0.8;

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn load(image_path: &Path) -> Result<DynamicImage, PassportError> {
        image::open(image_path).map_err(|e| {
            PassportError::ImageProcessingError(format!(
                "Failed to open image {}: {}",
                image_path.display(),
                e
            ))
        })
    }

    /// Grayscale, denoise and sharpen an image ahead of MRZ reading.
    ///
    /// Sharpening is an unsharp mask: `2 * gray - blurred`, saturated to the
    /// 8-bit range.
    pub fn preprocess_for_mrz(img: &DynamicImage) -> GrayImage {
        let gray = img.to_luma8();
        let blurred = gaussian_blur_f32(&gray, DENOISE_SIGMA);

        let mut sharpened = GrayImage::new(gray.width(), gray.height());
        for (x, y, pixel) in sharpened.enumerate_pixels_mut() {
            let original = gray.get_pixel(x, y)[0] as i32;
            let smooth = blurred.get_pixel(x, y)[0] as i32;
            *pixel = Luma([(2 * original - smooth).clamp(0, 255) as u8]);
        }
        sharpened
    }

    /// Global binarization with an Otsu-selected threshold and inverted
    /// polarity: pixels above the threshold turn black, the rest white.
    pub fn binarize_otsu_inverted(gray: &GrayImage) -> GrayImage {
        let level = otsu_level(gray);
        debug!("Otsu threshold level: {}", level);
        let mut binary = threshold(gray, level);
        invert(&mut binary);
        binary
    }

    pub fn save_gray(img: &GrayImage, output_path: &Path) -> Result<(), PassportError> {
        img.save(output_path).map_err(|e| {
            PassportError::ImageProcessingError(format!(
                "Failed to save image {}: {}",
                output_path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_preprocess_keeps_dimensions_and_flat_regions() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 30, Luma([120])));
        let processed = ImageProcessor::preprocess_for_mrz(&img);
        assert_eq!(processed.dimensions(), (40, 30));
        assert!(processed.pixels().all(|p| (119..=121).contains(&p[0])));
    }

    #[test]
    fn test_preprocess_converts_color_to_gray() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255])));
        let processed = ImageProcessor::preprocess_for_mrz(&img);
        assert!(processed.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_binarize_inverts_dark_text_to_white() {
        let gray = GrayImage::from_fn(20, 10, |x, _| if x < 10 { Luma([20]) } else { Luma([220]) });
        let binary = ImageProcessor::binarize_otsu_inverted(&gray);
        assert_eq!(binary.get_pixel(0, 0)[0], 255);
        assert_eq!(binary.get_pixel(19, 9)[0], 0);
        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ImageProcessor::load(Path::new("does/not/exist.jpg"));
        assert!(matches!(result, Err(PassportError::ImageProcessingError(_))));
    }
}
