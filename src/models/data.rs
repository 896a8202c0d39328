use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw key/value output of an MRZ reader.
///
/// Values are in the MRZ character set: dates are `YYMMDD`, padding uses the
/// `<` filler and the letter `O` may stand in for the digit `0`. Missing keys
/// deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMrzFields {
    pub names: String,
    pub surname: String,
    pub sex: String,
    pub country: String,
    pub date_of_birth: String,
    pub expiration_date: String,
    pub number: String,
}

/// Identity fields extracted from one passport image.
///
/// Serializes with the field order of the JSON output file; `date_of_issue`
/// is left out entirely when it could not be recovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportRecord {
    pub name: String,
    pub expiry_date: String,
    pub date_of_birth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_issue: Option<String>,
    pub passport_number: String,
    pub nationality: String,
    pub sex: String,
}

impl PassportRecord {
    /// Multi-line, human readable rendering of the record.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Name: {}\nExpiry Date: {}\nDate of Birth: {}\n",
            self.name, self.expiry_date, self.date_of_birth
        );
        if let Some(date_of_issue) = &self.date_of_issue {
            text.push_str(&format!("Date of Issue: {}\n", date_of_issue));
        }
        text.push_str(&format!(
            "Passport Number: {}\nSex: {}\nNationality: {}\n",
            self.passport_number, self.sex, self.nationality
        ));
        text
    }

    /// Summary followed by the portrait extraction status line.
    pub fn summary_with_portrait(&self, portrait: &PortraitOutcome) -> String {
        format!("{}\n{}", self.summary(), portrait.message())
    }
}

/// Face bounding box in pixel coordinates, `(top, right, bottom, left)`.
///
/// Coordinates are signed because detectors may report boxes that reach past
/// the image border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
    pub left: i64,
}

impl FaceBox {
    pub fn new(top: i64, right: i64, bottom: i64, left: i64) -> Self {
        FaceBox { top, right, bottom, left }
    }

    pub fn from_xywh(x: i64, y: i64, width: i64, height: i64) -> Self {
        FaceBox {
            top: y,
            right: x + width,
            bottom: y + height,
            left: x,
        }
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }
}

/// Pixel region to cut out of the source image, already clamped to its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRegion {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Result of the portrait extraction step. Finding no face is a reported
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortraitOutcome {
    Saved(PathBuf),
    NoFaceFound,
}

impl PortraitOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            PortraitOutcome::Saved(_) => "Portrait extracted and saved successfully.",
            PortraitOutcome::NoFaceFound => "No faces found in the image.",
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            PortraitOutcome::Saved(path) => Some(path),
            PortraitOutcome::NoFaceFound => None,
        }
    }
}
