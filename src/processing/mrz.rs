use log::{debug, info};

use crate::config::ScanConfig;
use crate::models::{CandidateFields, CountryRules, DocumentFormat, Field, MrzRecord, FILLER};
use crate::processing::correction::{clean_mrz_line, correct_text_with_context, FieldType};
use crate::processing::dates::DateDisambiguator;
use crate::utils::ScanError;

/// Decodes ICAO 9303 TD1/TD2/TD3 machine-readable zones by character
/// position. Check digits are skipped, never validated.
pub struct MrzDecoder {
    dates: DateDisambiguator,
    rules: CountryRules,
    correct_confusables: bool,
}

/// Raw slices of one MRZ, fillers still in place.
#[derive(Debug, Clone, PartialEq)]
struct MrzSlices<'a> {
    document_type: &'a str,
    issuing_country: &'a str,
    names: &'a str,
    document_number: String,
    nationality: &'a str,
    date_of_birth: &'a str,
    sex: &'a str,
    date_of_expiry: &'a str,
    personal_number: &'a str,
}

impl MrzDecoder {
    pub fn new(config: &ScanConfig) -> Self {
        MrzDecoder {
            dates: DateDisambiguator::from_config(config),
            rules: CountryRules::with_overrides(&config.personal_number_lengths),
            correct_confusables: config.correct_confusables,
        }
    }

    pub fn with_parts(dates: DateDisambiguator, rules: CountryRules, correct_confusables: bool) -> Self {
        MrzDecoder {
            dates,
            rules,
            correct_confusables,
        }
    }

    /// Decodes an isolated MRZ block (2 or 3 lines).
    pub fn decode(&self, text: &str) -> Result<MrzRecord, ScanError> {
        let lines: Vec<String> = text
            .lines()
            .map(clean_mrz_line)
            .filter(|line| !line.is_empty())
            .collect();

        let format = DocumentFormat::detect(&lines).ok_or_else(|| {
            let widths: Vec<usize> = lines.iter().map(|l| l.len()).collect();
            ScanError::MrzFormatError(format!(
                "{} line(s) of widths {:?} match no TD1 (3x30), TD2 (2x36) or TD3 (2x44) layout",
                lines.len(),
                widths
            ))
        })?;
        debug!("Detected MRZ layout {}", format);

        let slices = match format {
            DocumentFormat::TD1 => Self::slice_td1(&lines[0], &lines[1], &lines[2]),
            DocumentFormat::TD2 | DocumentFormat::TD3 => Self::slice_td2_td3(format, &lines[0], &lines[1]),
        };

        let candidates = self.to_candidates(&slices);
        let record = MrzRecord::from_candidates(&candidates, &self.dates, &self.rules)?;
        info!("Decoded {} MRZ for document {}", format, record.document_number());
        Ok(record)
    }

    /// Picks the first block of consecutive lines in free-form OCR text
    /// that forms a complete MRZ. Returns the cleaned lines, or an empty
    /// vector when no block matches a layout.
    pub fn locate_mrz_lines(text: &str) -> Vec<String> {
        let candidates: Vec<Option<String>> = text
            .lines()
            .map(|line| {
                let trimmed = line.trim();
                let plausible = trimmed.contains(FILLER) && !trimmed.chars().any(|c| c.is_lowercase());
                if !plausible {
                    return None;
                }
                let cleaned = clean_mrz_line(trimmed);
                matches!(cleaned.len(), 30 | 36 | 44).then_some(cleaned)
            })
            .collect();

        for start in 0..candidates.len() {
            for format in [DocumentFormat::TD1, DocumentFormat::TD3, DocumentFormat::TD2] {
                let end = start + format.mrz_lines();
                if end > candidates.len() {
                    continue;
                }
                let block: Option<Vec<String>> = candidates[start..end].iter().cloned().collect();
                if let Some(block) = block {
                    if DocumentFormat::detect(&block) == Some(format) {
                        debug!("Located {} MRZ block at line {}", format, start + 1);
                        return block;
                    }
                }
            }
        }
        Vec::new()
    }

    // Line 1: type 0..2, issuing 2..5, names 5..
    // Line 2: number 0..9, check 9, nationality 10..13, birth 13..19, check 19,
    // sex 20, expiry 21..27, check 27, optional 28..(width - 2 on TD3, width - 1 on TD2)
    fn slice_td2_td3<'a>(format: DocumentFormat, line1: &'a str, line2: &'a str) -> MrzSlices<'a> {
        let optional_end = match format {
            DocumentFormat::TD3 => 42, // 42 is the personal number check digit, 43 the composite
            _ => 35,                   // 35 is the composite check digit
        };
        MrzSlices {
            document_type: &line1[0..2],
            issuing_country: &line1[2..5],
            names: &line1[5..],
            document_number: line2[0..9].to_string(),
            nationality: &line2[10..13],
            date_of_birth: &line2[13..19],
            sex: &line2[20..21],
            date_of_expiry: &line2[21..27],
            personal_number: &line2[28..optional_end],
        }
    }

    // Line 1: type 0..2, issuing 2..5, number 5..14, check 14, optional 15..30
    // Line 2: birth 0..6, check 6, sex 7, expiry 8..14, check 14, nationality 15..18,
    // optional 18..29, composite 29
    // Line 3: names
    fn slice_td1<'a>(line1: &'a str, line2: &'a str, line3: &'a str) -> MrzSlices<'a> {
        let mut document_number = line1[5..14].to_string();
        let mut optional1 = &line1[15..30];

        // Long document numbers: the check position holds a filler and the
        // number continues in the optional field, its check digit last.
        if line1.as_bytes()[14] == b'<' {
            let extension_len = optional1.find(FILLER).unwrap_or(optional1.len());
            if extension_len > 0 {
                // A one-character extension is the check digit alone.
                document_number.push_str(&optional1[..extension_len - 1]);
                optional1 = &optional1[extension_len..];
                debug!("TD1 long document number: {}", document_number);
            }
        }

        let optional2 = &line2[18..29];
        let personal_number = if optional1.chars().all(|c| c == FILLER) {
            optional2
        } else {
            optional1
        };

        MrzSlices {
            document_type: &line1[0..2],
            issuing_country: &line1[2..5],
            names: line3,
            document_number,
            nationality: &line2[15..18],
            date_of_birth: &line2[0..6],
            sex: &line2[7..8],
            date_of_expiry: &line2[8..14],
            personal_number,
        }
    }

    fn to_candidates(&self, slices: &MrzSlices) -> CandidateFields {
        let (surname, given_name) = Self::split_names(slices.names);

        let alpha = |value: &str| {
            if self.correct_confusables {
                correct_text_with_context(value, FieldType::Alphabetic)
            } else {
                value.to_string()
            }
        };
        let numeric = |value: &str| {
            if self.correct_confusables {
                correct_text_with_context(value, FieldType::Numeric)
            } else {
                value.to_string()
            }
        };

        let mut fields = CandidateFields::new();
        fields.set(Field::DocumentType, slices.document_type);
        fields.set(Field::IssuingCountry, alpha(slices.issuing_country));
        fields.set(Field::Surname, alpha(&surname));
        fields.set(Field::GivenName, alpha(&given_name));
        fields.set(Field::DocumentNumber, slices.document_number.as_str());
        fields.set(Field::Nationality, alpha(slices.nationality));
        fields.set(Field::DateOfBirth, numeric(slices.date_of_birth));
        fields.set(Field::Sex, slices.sex);
        fields.set(Field::ExpiryDate, numeric(slices.date_of_expiry));
        fields.set(Field::PersonalNumber, slices.personal_number);
        fields
    }

    /// Splits the name field at the first double filler. Filler runs inside
    /// each part become one space; trailing padding is dropped.
    pub fn split_names(names: &str) -> (String, String) {
        let (surname, given) = names.split_once("<<").unwrap_or((names, ""));
        (Self::clean_name(surname), Self::clean_name(given))
    }

    fn clean_name(name: &str) -> String {
        name.split(FILLER)
            .filter(|part| !part.is_empty())
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn decoder() -> MrzDecoder {
        let config = ScanConfig {
            reference_date: NaiveDate::from_ymd_opt(2024, 6, 15),
            ..ScanConfig::default()
        };
        MrzDecoder::new(&config)
    }

    fn pad(s: &str, width: usize) -> String {
        format!("{:<<width$}", s, width = width)
    }

    fn td3_block() -> String {
        format!(
            "{}\n{}",
            pad("P<UTOERIKSSON<<ANNA<MARIA", 44),
            "L898902C36UTO7408122F3004159ZE184226B<<<<<10"
        )
    }

    #[test]
    fn test_decode_td3() {
        let record = decoder().decode(&td3_block()).unwrap();
        assert_eq!(record.document_type(), "P");
        assert_eq!(record.issuing_country(), "UTO");
        assert_eq!(record.surname(), "ERIKSSON");
        assert_eq!(record.given_name(), "ANNA MARIA");
        assert_eq!(record.document_number(), "L898902C3");
        assert_eq!(record.nationality(), "UTO");
        assert_eq!(record.date_of_birth(), "12.08.1974");
        assert_eq!(record.sex(), "F");
        assert_eq!(record.expiry_date(), "15.04.2030");
        assert_eq!(record.personal_number(), "ZE184226B");
        assert_eq!(record.date_of_issue(), "");
        assert_eq!(record.place_of_birth(), "");
        assert_eq!(record.authority(), "");
    }

    #[test]
    fn test_decode_td3_is_idempotent() {
        let decoder = decoder();
        let first = decoder.decode(&td3_block()).unwrap();
        let second = decoder.decode(&td3_block()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filler_only_personal_number_is_empty() {
        let block = format!(
            "{}\n{}",
            pad("P<UTOERIKSSON<<ANNA<MARIA", 44),
            "L898902C36UTO7408122F3004159<<<<<<<<<<<<<<00"
        );
        let record = decoder().decode(&block).unwrap();
        assert_eq!(record.personal_number(), "");
    }

    #[test]
    fn test_decode_td2() {
        let block = format!(
            "{}\n{}",
            pad("I<UTOERIKSSON<<ANNA<MARIA", 36),
            "D231458907UTO7408122F3004159<<<<<<<6"
        );
        let record = decoder().decode(&block).unwrap();
        assert_eq!(record.document_type(), "I");
        assert_eq!(record.document_number(), "D23145890");
        assert_eq!(record.surname(), "ERIKSSON");
        assert_eq!(record.given_name(), "ANNA MARIA");
        assert_eq!(record.expiry_date(), "15.04.2030");
        assert_eq!(record.personal_number(), "");
    }

    #[test]
    fn test_decode_td1() {
        let block = format!(
            "{}\n{}\n{}",
            pad("I<UTOD231458907", 30),
            pad("7408122F3004159UTO", 29) + "6",
            pad("ERIKSSON<<ANNA<MARIA", 30)
        );
        let record = decoder().decode(&block).unwrap();
        assert_eq!(record.document_type(), "I");
        assert_eq!(record.issuing_country(), "UTO");
        assert_eq!(record.document_number(), "D23145890");
        assert_eq!(record.nationality(), "UTO");
        assert_eq!(record.date_of_birth(), "12.08.1974");
        assert_eq!(record.sex(), "F");
        assert_eq!(record.expiry_date(), "15.04.2030");
        assert_eq!(record.surname(), "ERIKSSON");
        assert_eq!(record.given_name(), "ANNA MARIA");
    }

    #[test]
    fn test_decode_td1_long_document_number() {
        let block = format!(
            "{}\n{}\n{}",
            pad("I<UTOD23145890<7349", 30),
            pad("7408122F3004159UTO", 29) + "6",
            pad("ERIKSSON<<ANNA", 30)
        );
        let record = decoder().decode(&block).unwrap();
        assert_eq!(record.document_number(), "D23145890734");
        assert_eq!(record.personal_number(), "");
    }

    #[test]
    fn test_td1_check_digit_only_extension() {
        let block = format!(
            "{}\n{}\n{}",
            pad("I<UTOD23145890<7", 30),
            pad("7408122F3004159UTO", 29) + "6",
            pad("ERIKSSON<<ANNA", 30)
        );
        let record = decoder().decode(&block).unwrap();
        assert_eq!(record.document_number(), "D23145890");
        assert_eq!(record.personal_number(), "");
    }

    #[test]
    fn test_td1_personal_number_from_second_optional_field() {
        let block = format!(
            "{}\n{}\n{}",
            pad("I<UTOD231458907", 30),
            pad("7408122F3004159UTO12345678901", 29) + "6",
            pad("ERIKSSON<<ANNA", 30)
        );
        let record = decoder().decode(&block).unwrap();
        assert_eq!(record.personal_number(), "12345678901");
    }

    #[test]
    fn test_uzb_personal_number_rule() {
        let block = format!(
            "{}\n{}",
            pad("P<UZBIVANOV<<IVAN", 44),
            "AA12345670UZB8501012M300101931234567890123<4"
        );
        let record = decoder().decode(&block).unwrap();
        assert_eq!(record.personal_number(), "31234567890123");
        assert_eq!(record.personal_number().len(), 14);
    }

    #[test]
    fn test_unspecified_sex() {
        let block = format!(
            "{}\n{}",
            pad("P<UTOERIKSSON<<ANNA", 44),
            "L898902C36UTO7408122<3004159<<<<<<<<<<<<<<00"
        );
        assert_eq!(decoder().decode(&block).unwrap().sex(), "<");
    }

    #[test]
    fn test_empty_document_number_fails() {
        let block = format!(
            "{}\n{}",
            pad("P<UTOERIKSSON<<ANNA", 44),
            "<<<<<<<<<0UTO7408122F3004159<<<<<<<<<<<<<<00"
        );
        let err = decoder().decode(&block).unwrap_err();
        assert!(matches!(err, ScanError::MrzFormatError(_)));
    }

    #[test]
    fn test_unknown_layout_fails() {
        let err = decoder().decode("P<UTOERIKSSON<<ANNA\nL898902C36UTO").unwrap_err();
        assert!(matches!(err, ScanError::MrzFormatError(_)));
        assert!(matches!(decoder().decode(""), Err(ScanError::MrzFormatError(_))));
    }

    #[test]
    fn test_split_names() {
        assert_eq!(
            MrzDecoder::split_names("DE<LA<CRUZ<<MARIA<<<<<<<<"),
            ("DE LA CRUZ".to_string(), "MARIA".to_string())
        );
        assert_eq!(MrzDecoder::split_names("MONONYM<<<<"), ("MONONYM".to_string(), String::new()));
        assert_eq!(MrzDecoder::split_names("SMITH<JONES"), ("SMITH JONES".to_string(), String::new()));
    }

    #[test]
    fn test_confusable_correction_is_opt_in() {
        let block = format!(
            "{}\n{}",
            pad("P<UTOERIKSSON<<ANNA", 44),
            "L898902C36UTO7408I22F3OO4159<<<<<<<<<<<<<<00"
        );
        let plain = decoder().decode(&block).unwrap();
        assert_eq!(plain.date_of_birth(), "");
        assert_eq!(plain.expiry_date(), "");

        let config = ScanConfig {
            reference_date: NaiveDate::from_ymd_opt(2024, 6, 15),
            correct_confusables: true,
            ..ScanConfig::default()
        };
        let corrected = MrzDecoder::new(&config).decode(&block).unwrap();
        assert_eq!(corrected.date_of_birth(), "12.08.1974");
        assert_eq!(corrected.expiry_date(), "15.04.2030");
        assert_eq!(corrected.document_number(), "L898902C3");
    }

    #[test]
    fn test_locate_mrz_lines_in_ocr_text() {
        let text = format!(
            "PASSPORT\nSurname / Nom\nERIKSSON\n{}\n{}\n",
            pad("P<UTOERIKSSON<<ANNA<MARIA", 44),
            "L898902C36UTO7408122F3004159ZE184226B<<<<<10"
        );
        let lines = MrzDecoder::locate_mrz_lines(&text);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("P<UTO"));
        assert!(MrzDecoder::locate_mrz_lines("just some prose, no zone").is_empty());
    }
}
