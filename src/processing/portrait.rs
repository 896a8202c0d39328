use crate::models::{CropRegion, FaceBox, PortraitOutcome};
use crate::utils::PassportError;
use image::DynamicImage;
use log::{info, warn};
use std::path::Path;

const WIDTH_EXPANSION: f64 = 1.4;
const HEIGHT_EXPANSION: f64 = 1.8;
// Fraction of the expanded height the crop is moved up by.
const UPWARD_SHIFT: f64 = 0.05;

/// Locates faces in a decoded image.
pub trait FaceDetector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<FaceBox>, PassportError>;
}

/// SeetaFace frontal face cascade.
pub struct SeetaFaceDetector {
    detector: Box<dyn rustface::Detector>,
}

impl SeetaFaceDetector {
    pub fn from_model(model_path: &Path, min_face_size: u32) -> Result<Self, PassportError> {
        let path_str = model_path.to_str().ok_or_else(|| {
            PassportError::ConfigError(format!("Non UTF-8 model path: {}", model_path.display()))
        })?;

        let mut detector = rustface::create_detector(path_str).map_err(|e| {
            PassportError::FaceDetectionError(format!(
                "Failed to load face model {}: {}",
                path_str, e
            ))
        })?;
        detector.set_min_face_size(min_face_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        Ok(SeetaFaceDetector { detector })
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<FaceBox>, PassportError> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        let data = rustface::ImageData::new(gray.as_raw(), width, height);

        let faces = self
            .detector
            .detect(&data)
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox::from_xywh(
                    bbox.x() as i64,
                    bbox.y() as i64,
                    bbox.width() as i64,
                    bbox.height() as i64,
                )
            })
            .collect();
        Ok(faces)
    }
}

/// Scale the span `lo..hi` by `factor` around its center; an odd extra pixel
/// goes to the `hi` side.
fn expand_span(lo: i64, hi: i64, factor: f64) -> (i64, i64) {
    let len = hi - lo;
    let diff = (len as f64 * factor) as i64 - len;
    (lo - diff.div_euclid(2), hi + diff - diff.div_euclid(2))
}

pub struct PortraitExtractor<D: FaceDetector> {
    detector: D,
}

impl<D: FaceDetector> PortraitExtractor<D> {
    pub fn new(detector: D) -> Self {
        PortraitExtractor { detector }
    }

    /// Expanded, slightly raised crop around a face, clamped to the image.
    pub fn crop_region(face: &FaceBox, image_width: u32, image_height: u32) -> CropRegion {
        let (left, right) = expand_span(face.left, face.right, WIDTH_EXPANSION);
        let (top, bottom) = expand_span(face.top, face.bottom, HEIGHT_EXPANSION);

        let shift = ((bottom - top) as f64 * UPWARD_SHIFT) as i64;
        let (top, bottom) = (top - shift, bottom - shift);

        let (width, height) = (image_width as i64, image_height as i64);
        let left = left.clamp(0, width);
        let right = right.clamp(left, width);
        let top = top.clamp(0, height);
        let bottom = bottom.clamp(top, height);

        CropRegion {
            left: left as u32,
            top: top as u32,
            right: right as u32,
            bottom: bottom as u32,
        }
    }

    /// Crop the first detected face and save it to `output_path`. No face is
    /// a normal outcome and writes nothing.
    pub fn extract(
        &mut self,
        image: &DynamicImage,
        output_path: &Path,
    ) -> Result<PortraitOutcome, PassportError> {
        let faces = self.detector.detect(image)?;
        let face = match faces.first() {
            Some(face) => face,
            None => {
                info!("No faces found in the image");
                return Ok(PortraitOutcome::NoFaceFound);
            }
        };

        let region = Self::crop_region(face, image.width(), image.height());
        if region.is_empty() {
            warn!("Detected face {:?} lies outside the image", face);
            return Ok(PortraitOutcome::NoFaceFound);
        }

        let portrait = image
            .crop_imm(region.left, region.top, region.width(), region.height())
            .to_rgb8();
        portrait.save(output_path).map_err(|e| {
            PassportError::ImageProcessingError(format!(
                "Failed to save portrait {}: {}",
                output_path.display(),
                e
            ))
        })?;

        info!("Portrait saved to {}", output_path.display());
        Ok(PortraitOutcome::Saved(output_path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    struct FixedFaces(Vec<FaceBox>);

    impl FaceDetector for FixedFaces {
        fn detect(&mut self, _image: &DynamicImage) -> Result<Vec<FaceBox>, PassportError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_crop_expands_and_raises_face() {
        let face = FaceBox::new(100, 200, 200, 100);
        let region = PortraitExtractor::<FixedFaces>::crop_region(&face, 1000, 1000);
        assert_eq!(region, CropRegion { left: 80, top: 51, right: 220, bottom: 231 });
    }

    #[test]
    fn test_crop_is_clamped_to_image() {
        let face = FaceBox::new(0, 50, 50, 0);
        let region = PortraitExtractor::<FixedFaces>::crop_region(&face, 100, 100);
        assert_eq!(region, CropRegion { left: 0, top: 0, right: 60, bottom: 66 });

        let face = FaceBox::new(60, 100, 100, 60);
        let region = PortraitExtractor::<FixedFaces>::crop_region(&face, 100, 100);
        assert_eq!(region.right, 100);
        assert_eq!(region.bottom, 100);
    }

    #[test]
    fn test_first_face_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("card_portrait.jpg");
        let image =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 300, image::Rgb([200, 150, 100])));
        let faces = vec![FaceBox::new(100, 200, 200, 100), FaceBox::new(0, 10, 10, 0)];

        let outcome = PortraitExtractor::new(FixedFaces(faces)).extract(&image, &output).unwrap();
        assert_eq!(outcome, PortraitOutcome::Saved(output.clone()));

        let saved = image::open(&output).unwrap();
        assert_eq!((saved.width(), saved.height()), (140, 180));
    }

    #[test]
    fn test_no_face_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("card_portrait.jpg");
        let image = DynamicImage::ImageRgb8(RgbImage::new(50, 50));

        let outcome = PortraitExtractor::new(FixedFaces(Vec::new()))
            .extract(&image, &output)
            .unwrap();
        assert_eq!(outcome, PortraitOutcome::NoFaceFound);
        assert_eq!(outcome.message(), "No faces found in the image.");
        assert!(!output.exists());
    }
}
