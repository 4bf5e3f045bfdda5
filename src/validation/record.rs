use log::{debug, warn};

use crate::models::{CandidateFields, CountryRules, DateContext, Field, MrzRecord, FILLER};
use crate::processing::dates::DateDisambiguator;
use crate::utils::ScanError;

impl MrzRecord {
    /// Validates candidate fields into a record.
    ///
    /// Names get filler runs collapsed to single spaces, code and number
    /// fields lose their fillers entirely, dates are brought to
    /// `DD.MM.YYYY` (or left empty), and the issuing country's personal
    /// number rules are applied. An empty document number is a hard
    /// failure no matter how many other fields were filled.
    pub fn from_candidates(
        fields: &CandidateFields,
        dates: &DateDisambiguator,
        rules: &CountryRules,
    ) -> Result<MrzRecord, ScanError> {
        let document_number = clean_code(fields.get(Field::DocumentNumber));
        if document_number.is_empty() {
            return Err(ScanError::MrzFormatError(
                "Document number is missing or consists only of filler".to_string(),
            ));
        }

        let issuing_country = clean_code(fields.get(Field::IssuingCountry));
        let personal_number = rules.apply_personal_number(
            &issuing_country,
            &clean_code(fields.get(Field::PersonalNumber)),
        );

        let date_of_birth = dates.normalize_date(fields.get(Field::DateOfBirth), DateContext::Birth);
        let expiry_date = dates.normalize_date(fields.get(Field::ExpiryDate), DateContext::Expiry);
        let date_of_issue = dates.normalize_date(fields.get(Field::DateOfIssue), DateContext::Issue);
        for (field, value) in [
            (Field::DateOfBirth, &date_of_birth),
            (Field::ExpiryDate, &expiry_date),
            (Field::DateOfIssue, &date_of_issue),
        ] {
            if value.is_empty() && !fields.get(field).trim().is_empty() {
                warn!("Discarding unusable {} {:?}", field.key(), fields.get(field));
            }
        }

        let record = MrzRecord {
            document_type: clean_code(fields.get(Field::DocumentType)),
            issuing_country,
            surname: clean_name(fields.get(Field::Surname)),
            given_name: clean_name(fields.get(Field::GivenName)),
            document_number,
            nationality: clean_code(fields.get(Field::Nationality)),
            date_of_birth,
            sex: normalize_sex(fields.get(Field::Sex)).to_string(),
            expiry_date,
            personal_number,
            date_of_issue,
            place_of_birth: clean_text(fields.get(Field::PlaceOfBirth)),
            authority: clean_text(fields.get(Field::Authority)),
        };
        debug!("Built record for document {}", record.document_number);
        Ok(record)
    }
}

/// Uppercase with every filler and whitespace character removed.
fn clean_code(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != FILLER && !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Uppercase, every run of fillers or whitespace collapsed to one space.
fn clean_name(value: &str) -> String {
    value
        .to_uppercase()
        .split(|c: char| c == FILLER || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Visual-zone text: trimmed, internal whitespace collapsed, case kept.
fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// `M`, `F`, or `<` for anything unspecified or unrecognized.
/// Bilingual visual-zone forms such as `K/F` or `Ж` are accepted.
pub fn normalize_sex(value: &str) -> &'static str {
    let value = value.trim().to_uppercase();
    let mut verdict = "<";
    for part in value.split('/').map(str::trim) {
        match part {
            "M" | "MALE" | "М" | "МУЖ" | "МУЖСКОЙ" | "E" | "ERKEK" => {
                verdict = "M";
                break;
            }
            "F" | "FEMALE" | "Ж" | "ЖЕН" | "ЖЕНСКИЙ" | "K" | "KADIN" => {
                verdict = "F";
                break;
            }
            _ => {}
        }
    }
    verdict
}
