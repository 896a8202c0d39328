// Turns raw MRZ reader output into a PassportRecord: filler removal, OCR
// digit correction, YYMMDD -> DD/MM/YYYY and birth-date century correction.

use crate::models::{PassportRecord, RawMrzFields};
use chrono::{Datelike, Local, NaiveDate};
use log::{debug, warn};

pub const MRZ_FILLER: char = '<';
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Two-digit years up to this value belong to the 2000s, later ones to the 1900s.
const TWO_DIGIT_YEAR_PIVOT: i32 = 68;

/// A cleaned MRZ date field after the length check and parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateField {
    /// Six-character `YYMMDD` value that formed a calendar date.
    Formatted { text: String, date: NaiveDate },
    /// Wrong length or not a real date; kept as the cleaned string.
    Passthrough(String),
}

impl DateField {
    pub fn text(&self) -> &str {
        match self {
            DateField::Formatted { text, .. } => text,
            DateField::Passthrough(text) => text,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DateField::Formatted { date, .. } => Some(*date),
            DateField::Passthrough(_) => None,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            DateField::Formatted { text, .. } => text,
            DateField::Passthrough(text) => text,
        }
    }
}

pub fn strip_filler(value: &str) -> String {
    value.chars().filter(|c| *c != MRZ_FILLER).collect()
}

/// Replace the letter O (either case) with the digit 0, then strip filler.
///
/// Postcondition: the result contains no `O`, `o` or `<`.
pub fn clean_numeric_field(value: &str) -> String {
    let corrected: String = value
        .chars()
        .map(|c| if c == 'O' || c == 'o' { '0' } else { c })
        .collect();
    strip_filler(&corrected)
}

pub fn expand_two_digit_year(yy: i32) -> i32 {
    if yy <= TWO_DIGIT_YEAR_PIVOT {
        2000 + yy
    } else {
        1900 + yy
    }
}

/// Parse a cleaned field as `YYMMDD`.
///
/// Only exactly six ASCII digits forming a real calendar date are formatted;
/// everything else passes through untouched.
pub fn parse_mrz_date(cleaned: &str) -> DateField {
    if cleaned.len() != 6 || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return DateField::Passthrough(cleaned.to_string());
    }

    let yy: i32 = cleaned[0..2].parse().unwrap_or_default();
    let mm: u32 = cleaned[2..4].parse().unwrap_or_default();
    let dd: u32 = cleaned[4..6].parse().unwrap_or_default();

    match NaiveDate::from_ymd_opt(expand_two_digit_year(yy), mm, dd) {
        Some(date) => DateField::Formatted {
            text: date.format(DISPLAY_DATE_FORMAT).to_string(),
            date,
        },
        None => {
            warn!("MRZ date {} is not a valid calendar date, keeping it unformatted", cleaned);
            DateField::Passthrough(cleaned.to_string())
        }
    }
}

/// Move a birth date that lands after `today` back one century.
///
/// Only the year digits (the last four characters of the text) are rewritten.
/// Unformatted fields are returned as-is.
pub fn correct_birth_century(field: DateField, today: NaiveDate) -> String {
    match field {
        DateField::Formatted { text, date } if date > today => {
            let split = text.len() - 4;
            let corrected = format!("{}{}", &text[..split], date.year() - 100);
            debug!("Birth date {} is in the future, corrected to {}", text, corrected);
            corrected
        }
        other => other.into_text(),
    }
}

pub struct FieldNormalizer {
    today: NaiveDate,
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldNormalizer {
    /// Normalizer that treats the local calendar date as the processing date.
    pub fn new() -> Self {
        FieldNormalizer {
            today: Local::now().naive_local().date(),
        }
    }

    pub fn with_processing_date(today: NaiveDate) -> Self {
        FieldNormalizer { today }
    }

    pub fn processing_date(&self) -> NaiveDate {
        self.today
    }

    pub fn normalize(&self, raw: &RawMrzFields) -> PassportRecord {
        let name = strip_filler(&format!("{} {}", raw.names, raw.surname));

        let passport_number = clean_numeric_field(&raw.number);
        let expiry = parse_mrz_date(&clean_numeric_field(&raw.expiration_date));
        let birth = parse_mrz_date(&clean_numeric_field(&raw.date_of_birth));

        PassportRecord {
            name,
            expiry_date: expiry.into_text(),
            date_of_birth: correct_birth_century(birth, self.today),
            date_of_issue: None,
            passport_number,
            nationality: strip_filler(&raw.country),
            sex: strip_filler(&raw.sex),
        }
    }
}
