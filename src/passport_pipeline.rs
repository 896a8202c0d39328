use crate::config::{OutputLayout, PipelineConfig};
use crate::models::{PassportRecord, PortraitOutcome};
use crate::processing::{
    FaceDetector, FieldNormalizer, ImageProcessor, IssuingDateRecoverer, MrzReader,
    PortraitExtractor, SeetaFaceDetector, TesseractEngine, TesseractMrzReader, TextRecognizer,
};
use crate::utils::PassportError;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything one run produces besides the files it writes.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub record: PassportRecord,
    pub summary: String,
    pub json_path: PathBuf,
    pub portrait: PortraitOutcome,
}

pub struct PassportPipeline<D: FaceDetector, M: MrzReader, T: TextRecognizer> {
    layout: OutputLayout,
    portraits: PortraitExtractor<D>,
    mrz_reader: M,
    normalizer: FieldNormalizer,
    issue_dates: IssuingDateRecoverer<T>,
}

impl PassportPipeline<SeetaFaceDetector, TesseractMrzReader, TesseractEngine> {
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PassportError> {
        let tessdata = config.resolved_tessdata_dir();
        let detector = SeetaFaceDetector::from_model(&config.face_model, config.min_face_size)?;

        Ok(PassportPipeline::new(
            config.layout(),
            detector,
            TesseractMrzReader::new(tessdata.as_deref(), &config.ocr_language),
            TesseractEngine::new(tessdata.as_deref(), &config.ocr_language),
            FieldNormalizer::new(),
        ))
    }
}

impl<D: FaceDetector, M: MrzReader, T: TextRecognizer> PassportPipeline<D, M, T> {
    pub fn new(
        layout: OutputLayout,
        detector: D,
        mrz_reader: M,
        recognizer: T,
        normalizer: FieldNormalizer,
    ) -> Self {
        PassportPipeline {
            layout,
            portraits: PortraitExtractor::new(detector),
            mrz_reader,
            normalizer,
            issue_dates: IssuingDateRecoverer::new(recognizer),
        }
    }

    /// Run every stage on one image and write the JSON record.
    ///
    /// Missing faces and missing issuing dates are reported in the output;
    /// an unreadable image or MRZ aborts the run.
    pub fn process(&mut self, image_path: &Path) -> Result<PipelineOutput, PassportError> {
        info!("Processing passport image {}", image_path.display());

        // Step 1: Output tree
        self.layout.ensure_dirs()?;

        // Step 2: Portrait
        let image = ImageProcessor::load(image_path)?;
        let portrait = self
            .portraits
            .extract(&image, &self.layout.portrait_path(image_path)?)?;

        // Step 3: Preprocess and read the MRZ
        let preprocessed_path = self.layout.preprocessed_path(image_path)?;
        ImageProcessor::save_gray(&ImageProcessor::preprocess_for_mrz(&image), &preprocessed_path)?;
        let raw = self.mrz_reader.read_mrz(&preprocessed_path)?;

        // Step 4: Normalize MRZ fields
        let record = self.normalizer.normalize(&raw);

        // Step 5: Date of issue from a second OCR pass
        let (record, summary) = self.issue_dates.augment(image_path, record, &portrait)?;

        // Step 6: Persist
        let json_path = self.layout.json_path(image_path)?;
        write_record(&record, &json_path)?;
        info!("Record written to {}", json_path.display());

        Ok(PipelineOutput {
            record,
            summary,
            json_path,
            portrait,
        })
    }
}

/// JSON rendering with four-space indentation.
pub fn record_to_json(record: &PassportRecord) -> Result<String, PassportError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    record.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|e| PassportError::SerializationError(e.to_string()))
}

/// Overwrites any previous record of the same name.
pub fn write_record(record: &PassportRecord, path: &Path) -> Result<(), PassportError> {
    fs::write(path, record_to_json(record)?)
        .map_err(|e| PassportError::IoError(format!("Failed to write {}: {}", path.display(), e)))
}
