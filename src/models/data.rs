use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::utils::ScanError;

/// The MRZ filler character.
pub const FILLER: char = '<';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    TD1, // ID Card (85.6mm × 54.0mm)
    TD2, // ID Card (105.0mm × 74.0mm)
    TD3, // Passport (125.0mm × 88.0mm)
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 3] = [DocumentFormat::TD1, DocumentFormat::TD2, DocumentFormat::TD3];

    pub fn mrz_lines(&self) -> usize {
        match self {
            DocumentFormat::TD1 => 3,
            DocumentFormat::TD2 => 2,
            DocumentFormat::TD3 => 2,
        }
    }

    pub fn mrz_chars_per_line(&self) -> usize {
        match self {
            DocumentFormat::TD1 => 30,
            DocumentFormat::TD2 => 36,
            DocumentFormat::TD3 => 44,
        }
    }

    /// Matches a block of cleaned MRZ lines against the known layouts.
    pub fn detect(lines: &[String]) -> Option<DocumentFormat> {
        Self::ALL.into_iter().find(|format| {
            lines.len() == format.mrz_lines()
                && lines.iter().all(|line| line.chars().count() == format.mrz_chars_per_line())
        })
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DocumentFormat::TD1 => "TD1",
            DocumentFormat::TD2 => "TD2",
            DocumentFormat::TD3 => "TD3",
        };
        write!(f, "{} ({}x{})", name, self.mrz_lines(), self.mrz_chars_per_line())
    }
}

/// Which century policy applies to a two-digit MRZ year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateContext {
    Birth,
    Expiry,
    /// Visual-zone issue date: always in the past, no lower bound.
    Issue,
}

/// The record fields, in export column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    DocumentType,
    IssuingCountry,
    Surname,
    GivenName,
    DocumentNumber,
    Nationality,
    DateOfBirth,
    Sex,
    ExpiryDate,
    PersonalNumber,
    DateOfIssue,
    PlaceOfBirth,
    Authority,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::DocumentType,
        Field::IssuingCountry,
        Field::Surname,
        Field::GivenName,
        Field::DocumentNumber,
        Field::Nationality,
        Field::DateOfBirth,
        Field::Sex,
        Field::ExpiryDate,
        Field::PersonalNumber,
        Field::DateOfIssue,
        Field::PlaceOfBirth,
        Field::Authority,
    ];

    /// JSON key used by the upstream prompt and by serialized records.
    pub fn key(&self) -> &'static str {
        match self {
            Field::DocumentType => "documentType",
            Field::IssuingCountry => "issuingCountry",
            Field::Surname => "surname",
            Field::GivenName => "givenName",
            Field::DocumentNumber => "documentNumber",
            Field::Nationality => "nationality",
            Field::DateOfBirth => "dateOfBirth",
            Field::Sex => "sex",
            Field::ExpiryDate => "expiryDate",
            Field::PersonalNumber => "personalNumber",
            Field::DateOfIssue => "dateOfIssue",
            Field::PlaceOfBirth => "placeOfBirth",
            Field::Authority => "authority",
        }
    }

    /// Column header in the CSV export.
    pub fn label(&self) -> &'static str {
        match self {
            Field::DocumentType => "Document Type",
            Field::IssuingCountry => "Issuing Country",
            Field::Surname => "Surname",
            Field::GivenName => "Given Name",
            Field::DocumentNumber => "Document Number",
            Field::Nationality => "Nationality",
            Field::DateOfBirth => "Date of Birth",
            Field::Sex => "Sex",
            Field::ExpiryDate => "Expiry Date",
            Field::PersonalNumber => "Personal Number",
            Field::DateOfIssue => "Date of Issue",
            Field::PlaceOfBirth => "Place of Birth",
            Field::Authority => "Authority",
        }
    }
}

/// Field values as found in an upstream response, before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFields {
    values: BTreeMap<Field, String>,
}

impl CandidateFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    /// Missing fields read as empty.
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The canonical, validated description of one scanned document.
///
/// Only constructed through [`MrzRecord::from_candidates`] or the MRZ
/// decoder, so `document_number` is never empty and dates are either
/// `DD.MM.YYYY` or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MrzRecord {
    pub(crate) document_type: String,
    pub(crate) issuing_country: String,
    pub(crate) surname: String,
    pub(crate) given_name: String,
    pub(crate) document_number: String,
    pub(crate) nationality: String,
    pub(crate) date_of_birth: String,
    pub(crate) sex: String,
    pub(crate) expiry_date: String,
    pub(crate) personal_number: String,
    pub(crate) date_of_issue: String,
    pub(crate) place_of_birth: String,
    pub(crate) authority: String,
}

impl MrzRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::DocumentType => &self.document_type,
            Field::IssuingCountry => &self.issuing_country,
            Field::Surname => &self.surname,
            Field::GivenName => &self.given_name,
            Field::DocumentNumber => &self.document_number,
            Field::Nationality => &self.nationality,
            Field::DateOfBirth => &self.date_of_birth,
            Field::Sex => &self.sex,
            Field::ExpiryDate => &self.expiry_date,
            Field::PersonalNumber => &self.personal_number,
            Field::DateOfIssue => &self.date_of_issue,
            Field::PlaceOfBirth => &self.place_of_birth,
            Field::Authority => &self.authority,
        }
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn issuing_country(&self) -> &str {
        &self.issuing_country
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    pub fn document_number(&self) -> &str {
        &self.document_number
    }

    pub fn nationality(&self) -> &str {
        &self.nationality
    }

    pub fn date_of_birth(&self) -> &str {
        &self.date_of_birth
    }

    pub fn sex(&self) -> &str {
        &self.sex
    }

    pub fn expiry_date(&self) -> &str {
        &self.expiry_date
    }

    pub fn personal_number(&self) -> &str {
        &self.personal_number
    }

    pub fn date_of_issue(&self) -> &str {
        &self.date_of_issue
    }

    pub fn place_of_birth(&self) -> &str {
        &self.place_of_birth
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// Outcome of scanning a single input in a batch.
#[derive(Debug)]
pub struct ScanResult {
    pub file_name: String,
    pub outcome: Result<MrzRecord, ScanError>,
}

impl ScanResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn record(&self) -> Option<&MrzRecord> {
        self.outcome.as_ref().ok()
    }
}
