use crate::models::{PassportRecord, PortraitOutcome};
use crate::processing::image::ImageProcessor;
use crate::processing::ocr::TextRecognizer;
use crate::utils::PassportError;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use std::path::Path;

lazy_static! {
    // DD/MM/YYYY by shape only, no calendar validation. `\d` takes any
    // Unicode decimal digit.
    static ref DISPLAY_DATE_PATTERN: Regex =
        Regex::new(r"\b(\d{2}/\d{2}/\d{4})\b").unwrap();
}

/// All `DD/MM/YYYY` shaped substrings in OCR text, in reading order.
pub fn find_date_candidates(text: &str) -> Vec<String> {
    DISPLAY_DATE_PATTERN
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Candidates that are not textually equal to the record's expiry or birth date.
pub fn unknown_dates(text: &str, record: &PassportRecord) -> Vec<String> {
    let known = [record.expiry_date.as_str(), record.date_of_birth.as_str()];
    find_date_candidates(text)
        .into_iter()
        .filter(|date| !known.contains(&date.as_str()))
        .collect()
}

/// Recovers the date of issue, which the MRZ does not encode, from a full-page
/// OCR pass over the original image.
pub struct IssuingDateRecoverer<T: TextRecognizer> {
    recognizer: T,
}

impl<T: TextRecognizer> IssuingDateRecoverer<T> {
    pub fn new(recognizer: T) -> Self {
        IssuingDateRecoverer { recognizer }
    }

    /// First unknown date on the page, or `None` when every date found is
    /// already known (or there are none).
    pub fn find_issue_date(
        &mut self,
        image_path: &Path,
        record: &PassportRecord,
    ) -> Result<Option<String>, PassportError> {
        let gray = ImageProcessor::load(image_path)?.to_luma8();
        let binary = ImageProcessor::binarize_otsu_inverted(&gray);
        let text = self.recognizer.recognize(&binary)?;

        let dates = unknown_dates(&text, record);
        if dates.is_empty() {
            info!("No issuing date in DD/MM/YYYY format");
        } else {
            info!("Dates not present in the MRZ: {}", dates.join(", "));
        }
        Ok(dates.into_iter().next())
    }

    /// Record with `date_of_issue` filled in when one was found, plus the
    /// refreshed summary ending in the portrait status.
    pub fn augment(
        &mut self,
        image_path: &Path,
        mut record: PassportRecord,
        portrait: &PortraitOutcome,
    ) -> Result<(PassportRecord, String), PassportError> {
        record.date_of_issue = self.find_issue_date(image_path, &record)?;
        let summary = record.summary_with_portrait(portrait);
        Ok((record, summary))
    }
}
