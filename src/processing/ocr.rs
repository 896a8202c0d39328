use crate::utils::PassportError;
use image::{GrayImage, ImageFormat};
use log::debug;
use std::path::{Path, PathBuf};
use tesseract::{PageSegMode, Tesseract};

/// General-purpose text recognition over a binarized page image.
pub trait TextRecognizer {
    fn recognize(&mut self, image: &GrayImage) -> Result<String, PassportError>;
}

/// Tesseract-backed OCR. The data directory and language are fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    datapath: Option<String>,
    language: String,
    whitelist: Option<String>,
}

impl TesseractEngine {
    pub fn new(datapath: Option<&Path>, language: &str) -> Self {
        TesseractEngine {
            datapath: datapath.map(|p| p.to_string_lossy().into_owned()),
            language: language.to_string(),
            whitelist: None,
        }
    }

    /// Restrict recognition to the given characters.
    pub fn with_whitelist(mut self, whitelist: &str) -> Self {
        self.whitelist = Some(whitelist.to_string());
        self
    }

    pub fn recognize_file(&self, image_path: &Path) -> Result<String, PassportError> {
        let path_str = image_path.to_str().ok_or_else(|| {
            PassportError::OcrError(format!("Non UTF-8 image path: {}", image_path.display()))
        })?;

        let mut tess = Tesseract::new(self.datapath.as_deref(), Some(self.language.as_str()))
            .map_err(|e| {
                PassportError::OcrError(format!("Failed to initialize Tesseract: {}", e))
            })?;

        if let Some(whitelist) = &self.whitelist {
            tess = tess
                .set_variable("tessedit_char_whitelist", whitelist)
                .map_err(|e| {
                    PassportError::OcrError(format!("Failed to set Tesseract variable: {}", e))
                })?;
        }

        tess.set_page_seg_mode(PageSegMode::PsmAuto);

        let mut tess = tess
            .set_image(path_str)
            .map_err(|e| PassportError::OcrError(format!("Failed to set image: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| PassportError::OcrError(format!("Failed to extract text: {}", e)))?;

        debug!("OCR produced {} characters from {}", text.len(), image_path.display());
        Ok(text)
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&mut self, image: &GrayImage) -> Result<String, PassportError> {
        let temp_file = tempfile::Builder::new()
            .prefix("passport-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| {
                PassportError::IoError(format!("Failed to create temporary file: {}", e))
            })?;
        let temp_path: PathBuf = temp_file.path().to_path_buf();

        image
            .save_with_format(&temp_path, ImageFormat::Png)
            .map_err(|e| {
                PassportError::OcrError(format!("Failed to write OCR input image: {}", e))
            })?;

        self.recognize_file(&temp_path)
    }
}
