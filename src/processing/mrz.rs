use crate::models::RawMrzFields;
use crate::processing::ocr::TesseractEngine;
use crate::utils::PassportError;
use log::{debug, info, warn};
use std::cmp::Reverse;
use std::path::Path;

pub const MRZ_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789<";
pub const TD3_LINE_LENGTH: usize = 44;

// Shorter lines cannot be part of a machine readable zone.
const MIN_CANDIDATE_LENGTH: usize = 30;

/// Reads the machine readable zone of a preprocessed passport image.
pub trait MrzReader {
    fn read_mrz(&mut self, preprocessed_path: &Path) -> Result<RawMrzFields, PassportError>;
}

pub struct TesseractMrzReader {
    engine: TesseractEngine,
}

impl TesseractMrzReader {
    pub fn new(datapath: Option<&Path>, language: &str) -> Self {
        TesseractMrzReader {
            engine: TesseractEngine::new(datapath, language).with_whitelist(MRZ_CHARSET),
        }
    }
}

impl MrzReader for TesseractMrzReader {
    fn read_mrz(&mut self, preprocessed_path: &Path) -> Result<RawMrzFields, PassportError> {
        info!("Reading MRZ from {}", preprocessed_path.display());
        let text = self
            .engine
            .recognize_file(preprocessed_path)
            .map_err(|e| PassportError::MrzExtractionError(e.to_string()))?;
        debug!("MRZ OCR result:\n{}", text);
        parse_mrz_text(&text)
    }
}

/// Locate a TD3 zone in OCR output and split it into raw fields.
pub fn parse_mrz_text(text: &str) -> Result<RawMrzFields, PassportError> {
    let (line1, line2) = locate_td3_lines(text).ok_or_else(|| {
        PassportError::MrzExtractionError(
            "Failed to extract MRZ lines from passport image".to_string(),
        )
    })?;

    let failed = failed_check_digits(&line2);
    if !failed.is_empty() {
        warn!("MRZ check digit mismatch for: {}", failed.join(", "));
    }

    parse_td3(&line1, &line2)
}

/// Uppercase, drop whitespace and anything outside the MRZ character set.
fn clean_mrz_line(line: &str) -> String {
    line.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '<')
        .collect()
}

/// Pad with filler or truncate to the TD3 line width.
fn fit_td3_width(line: &str) -> String {
    let mut fitted: String = line.chars().take(TD3_LINE_LENGTH).collect();
    while fitted.len() < TD3_LINE_LENGTH {
        fitted.push('<');
    }
    fitted
}

/// `P<` or `P` + type letter + `<`, the opening of a passport first line.
fn looks_like_first_line(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.first() == Some(&b'P')
        && (bytes.get(1) == Some(&b'<')
            || (bytes.get(1).map_or(false, u8::is_ascii_uppercase) && bytes.get(2) == Some(&b'<')))
}

fn filler_count(line: &str) -> usize {
    line.chars().filter(|c| *c == '<').count()
}

/// The two candidates with the most filler characters, in page order.
fn most_filled_pair(candidates: &[String]) -> Option<(String, String)> {
    let mut ranked: Vec<usize> = (0..candidates.len()).collect();
    ranked.sort_by_key(|&i| Reverse(filler_count(&candidates[i])));
    ranked.truncate(2);
    if ranked.len() < 2 {
        return None;
    }
    ranked.sort_unstable();
    Some((
        fit_td3_width(&candidates[ranked[0]]),
        fit_td3_width(&candidates[ranked[1]]),
    ))
}

/// Find the two TD3 lines.
///
/// Adjacent pairs whose first line opens like a passport MRZ are tried first,
/// preferring one whose second line passes its check digits. Without such a
/// pair the two lines richest in `<` filler are used.
pub fn locate_td3_lines(text: &str) -> Option<(String, String)> {
    let candidates: Vec<String> = text
        .lines()
        .map(clean_mrz_line)
        .filter(|line| line.len() >= MIN_CANDIDATE_LENGTH)
        .collect();

    let pairs: Vec<(String, String)> = candidates
        .windows(2)
        .filter(|pair| looks_like_first_line(&pair[0]))
        .map(|pair| (fit_td3_width(&pair[0]), fit_td3_width(&pair[1])))
        .collect();

    if let Some(pair) = pairs
        .iter()
        .find(|(_, line2)| failed_check_digits(line2).is_empty())
    {
        return Some(pair.clone());
    }
    if let Some(pair) = pairs.into_iter().next() {
        return Some(pair);
    }

    debug!("No passport first line found, ranking MRZ candidates by filler");
    most_filled_pair(&candidates)
}

fn split_name_group(group: &str) -> String {
    group
        .split('<')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Slice two 44-character TD3 lines into raw fields.
pub fn parse_td3(line1: &str, line2: &str) -> Result<RawMrzFields, PassportError> {
    if line1.len() != TD3_LINE_LENGTH
        || line2.len() != TD3_LINE_LENGTH
        || !line1.is_ascii()
        || !line2.is_ascii()
    {
        return Err(PassportError::MrzParsingError(format!(
            "Expected two {}-character MRZ lines",
            TD3_LINE_LENGTH
        )));
    }

    let (surname, names) = match line1[5..].split_once("<<") {
        Some((surname, names)) => (split_name_group(surname), split_name_group(names)),
        None => (split_name_group(&line1[5..]), String::new()),
    };

    Ok(RawMrzFields {
        names,
        surname,
        sex: line2[20..21].to_string(),
        country: line1[2..5].to_string(),
        date_of_birth: line2[13..19].to_string(),
        expiration_date: line2[21..27].to_string(),
        number: line2[0..9].to_string(),
    })
}

fn char_value(c: char) -> Option<u32> {
    match c {
        '0'..='9' => c.to_digit(10),
        'A'..='Z' => Some(c as u32 - 'A' as u32 + 10),
        '<' => Some(0),
        _ => None,
    }
}

/// ICAO 9303 check digit: weighted sum with repeating weights 7, 3, 1, mod 10.
pub fn check_digit(field: &str) -> Option<char> {
    const WEIGHTS: [u32; 3] = [7, 3, 1];
    let mut sum = 0;
    for (i, c) in field.chars().enumerate() {
        sum += char_value(c)? * WEIGHTS[i % 3];
    }
    std::char::from_digit(sum % 10, 10)
}

/// Names of the second-line fields whose check digit does not match.
pub fn failed_check_digits(line2: &str) -> Vec<&'static str> {
    if line2.len() < 28 || !line2.is_ascii() {
        return vec!["line length"];
    }
    let fields = [
        ("document number", &line2[0..9], &line2[9..10]),
        ("date of birth", &line2[13..19], &line2[19..20]),
        ("date of expiry", &line2[21..27], &line2[27..28]),
    ];
    fields
        .iter()
        .filter(|(_, value, check)| check_digit(value).map(String::from) != Some(check.to_string()))
        .map(|(name, _, _)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECIMEN_LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const SPECIMEN_LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    #[test]
    fn test_check_digits_of_specimen() {
        assert_eq!(check_digit("L898902C3"), Some('6'));
        assert_eq!(check_digit("740812"), Some('2'));
        assert_eq!(check_digit("120415"), Some('9'));
        assert!(failed_check_digits(SPECIMEN_LINE2).is_empty());
    }

    #[test]
    fn test_check_digit_rejects_foreign_characters() {
        assert_eq!(check_digit("12#4"), None);
        let corrupted = SPECIMEN_LINE2.replacen("740812", "740813", 1);
        assert_eq!(failed_check_digits(&corrupted), vec!["date of birth"]);
    }

    #[test]
    fn test_parse_specimen_zone() {
        let text = format!("PASSPORT\nSome header text\n{}\n{}\n", SPECIMEN_LINE1, SPECIMEN_LINE2);
        let raw = parse_mrz_text(&text).unwrap();
        assert_eq!(raw.surname, "ERIKSSON");
        assert_eq!(raw.names, "ANNA MARIA");
        assert_eq!(raw.country, "UTO");
        assert_eq!(raw.number, "L898902C3");
        assert_eq!(raw.date_of_birth, "740812");
        assert_eq!(raw.expiration_date, "120415");
        assert_eq!(raw.sex, "F");
    }

    #[test]
    fn test_locate_cleans_and_pads_lines() {
        let text = "p<uto eriksson<<anna<maria<<<<<<<<\nL898902C36UTO7408122F1204159ZE184226B\n";
        let (line1, line2) = locate_td3_lines(text).unwrap();
        assert_eq!(line1.len(), TD3_LINE_LENGTH);
        assert_eq!(line2.len(), TD3_LINE_LENGTH);
        assert!(line1.starts_with("P<UTOERIKSSON<<ANNA<MARIA<"));
        assert!(line2.ends_with("B<<<<<<<"));
    }

    #[test]
    fn test_header_starting_with_p_is_not_taken_for_the_zone() {
        let text = format!(
            "PERSONAL DATA AND SIGNATURE OF THE HOLDER\n{}\n{}\n",
            SPECIMEN_LINE1, SPECIMEN_LINE2
        );
        let raw = parse_mrz_text(&text).unwrap();
        assert_eq!(raw.number, "L898902C3");
        assert_eq!(raw.surname, "ERIKSSON");
        assert_eq!(raw.date_of_birth, "740812");
    }

    #[test]
    fn test_pair_passing_check_digits_is_preferred() {
        let text = format!(
            "{}\nTHIS LINE IS NOISE FROM THE PAGE BODY TEXT\n{}\n{}\n",
            SPECIMEN_LINE1, SPECIMEN_LINE1, SPECIMEN_LINE2
        );
        let (line1, line2) = locate_td3_lines(&text).unwrap();
        assert_eq!(line1, SPECIMEN_LINE1);
        assert_eq!(line2, SPECIMEN_LINE2);
    }

    #[test]
    fn test_falls_back_to_lines_richest_in_filler() {
        let text = format!(
            "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789\nERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\n{}\n",
            SPECIMEN_LINE2
        );
        let (line1, line2) = locate_td3_lines(&text).unwrap();
        assert!(line1.starts_with("ERIKSSON<<ANNA"));
        assert_eq!(line2, SPECIMEN_LINE2);
        assert!(locate_td3_lines("ERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<").is_none());
    }

    #[test]
    fn test_ocr_letter_o_is_kept_raw() {
        let line2 = SPECIMEN_LINE2.replacen("1204159", "12O4159", 1);
        let raw = parse_td3(SPECIMEN_LINE1, &line2).unwrap();
        assert_eq!(raw.expiration_date, "12O415");
    }

    #[test]
    fn test_missing_zone_is_an_error() {
        let result = parse_mrz_text("no machine readable zone here");
        assert!(matches!(result, Err(PassportError::MrzExtractionError(_))));
    }

    #[test]
    fn test_parse_rejects_short_lines() {
        let result = parse_td3("P<UTO", SPECIMEN_LINE2);
        assert!(matches!(result, Err(PassportError::MrzParsingError(_))));
    }
}
