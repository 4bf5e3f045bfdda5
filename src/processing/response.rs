// Normalization of text returned by an upstream OCR/LLM service.
// Structural parsing only: semantic checks happen in record construction.

use std::collections::HashSet;

use lazy_static::lazy_static;
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::models::{CandidateFields, Field};
use crate::utils::ScanError;

/// Accepted key spellings per field, consulted in order after the canonical
/// English key. English alternates come before the Russian and Turkish ones.
pub const KEY_ALTERNATES: [(Field, &[&str]); 13] = [
    (Field::DocumentType, &["document_type", "doc_type", "type", "тип_документа", "тип", "belge_türü", "belge_turu"]),
    (Field::IssuingCountry, &["issuing_country", "issuing_state", "country", "страна_выдачи", "государство_выдачи", "veren_ülke", "düzenleyen_devlet"]),
    (Field::Surname, &["last_name", "family_name", "фамилия", "soyadı", "soyadi", "soyad"]),
    (Field::GivenName, &["given_names", "first_name", "name", "имя", "adı", "adi", "ad"]),
    (Field::DocumentNumber, &["document_number", "passport_number", "document_no", "number", "номер_документа", "номер_паспорта", "номер", "belge_no", "pasaport_no"]),
    (Field::Nationality, &["citizenship", "гражданство", "национальность", "uyruk", "uyruğu", "uyrugu"]),
    (Field::DateOfBirth, &["date_of_birth", "birth_date", "dob", "дата_рождения", "doğum_tarihi", "dogum_tarihi"]),
    (Field::Sex, &["gender", "пол", "cinsiyet", "cinsiyeti"]),
    (Field::ExpiryDate, &["expiry_date", "date_of_expiry", "expiration_date", "valid_until", "срок_действия", "дата_окончания_срока_действия", "son_geçerlilik_tarihi", "geçerlilik_tarihi"]),
    (Field::PersonalNumber, &["personal_number", "personal_no", "national_id", "личный_номер", "персональный_номер", "kişisel_numara", "tc_kimlik_no"]),
    (Field::DateOfIssue, &["date_of_issue", "issue_date", "дата_выдачи", "veriliş_tarihi", "düzenleme_tarihi"]),
    (Field::PlaceOfBirth, &["place_of_birth", "birth_place", "место_рождения", "doğum_yeri", "dogum_yeri"]),
    (Field::Authority, &["issuing_authority", "issued_by", "орган_выдачи", "кем_выдан", "veren_makam", "makam"]),
];

/// Fewest cells a line needs before the response is read as CSV.
const MIN_CSV_COLUMNS: usize = (Field::ALL.len() + 1) / 2;

lazy_static! {
    // Every header spelling: export labels, canonical keys and alternates.
    static ref KNOWN_COLUMN_NAMES: HashSet<String> = KEY_ALTERNATES
        .iter()
        .flat_map(|(field, alternates)| {
            [field.label(), field.key()]
                .into_iter()
                .chain(alternates.iter().copied())
        })
        .map(ResponseNormalizer::normalize_key)
        .collect();
}

pub struct ResponseNormalizer;

impl ResponseNormalizer {
    /// Turns an upstream response into candidate fields.
    ///
    /// JSON (an object, or an array holding one) is looked for first; a
    /// comma-separated line in export column order is the fallback.
    pub fn normalize(response: &str) -> Result<CandidateFields, ScanError> {
        if let Some(json) = Self::extract_json(response) {
            debug!("Parsing {} bytes of JSON from upstream response", json.len());
            let value: Value = serde_json::from_str(json)
                .map_err(|e| ScanError::UnparsableResponseError(format!("Invalid JSON in response: {}", e)))?;
            return Self::fields_from_json(&value);
        }

        if Self::looks_like_csv(response) {
            debug!("No JSON found, reading response as CSV");
            return Self::fields_from_csv(response);
        }

        Err(ScanError::UnparsableResponseError(
            "No JSON object or CSV line found in response".to_string(),
        ))
    }

    /// True when some line splits into enough cells to be a partial row.
    /// Prose that merely contains a comma does not qualify.
    fn looks_like_csv(response: &str) -> bool {
        response
            .lines()
            .any(|line| Self::split_csv_line(line).len() >= MIN_CSV_COLUMNS)
    }

    /// The substring from the first `{` or `[` to the last matching closer.
    pub fn extract_json(response: &str) -> Option<&str> {
        let start = response.find(['{', '['])?;
        let closer = if response[start..].starts_with('{') { '}' } else { ']' };
        let end = response.rfind(closer)?;
        (end > start).then(|| &response[start..=end])
    }

    fn fields_from_json(value: &Value) -> Result<CandidateFields, ScanError> {
        match value {
            Value::Object(object) => Ok(Self::reconcile_keys(object)),
            Value::Array(items) => match items.first() {
                Some(Value::Object(object)) => {
                    if items.len() > 1 {
                        warn!("Response holds {} objects, using the first", items.len());
                    }
                    Ok(Self::reconcile_keys(object))
                }
                Some(_) => Err(ScanError::UnparsableResponseError(
                    "JSON array does not contain an object".to_string(),
                )),
                None => Err(ScanError::IncompleteDataError { expected: 1, found: 0 }),
            },
            _ => Err(ScanError::UnparsableResponseError(
                "JSON value is neither an object nor an array".to_string(),
            )),
        }
    }

    /// Maps response keys onto fields using [`KEY_ALTERNATES`]. The exact
    /// canonical key wins; otherwise keys are compared case- and
    /// separator-insensitively, canonical first, then alternates in order.
    pub fn reconcile_keys(object: &Map<String, Value>) -> CandidateFields {
        let normalized: Vec<(String, &Value)> = object
            .iter()
            .map(|(key, value)| (Self::normalize_key(key), value))
            .collect();

        let mut fields = CandidateFields::new();
        for (field, alternates) in KEY_ALTERNATES.iter() {
            let found = object.get(field.key()).or_else(|| {
                std::iter::once(field.key())
                    .chain(alternates.iter().copied())
                    .map(Self::normalize_key)
                    .find_map(|wanted| {
                        normalized
                            .iter()
                            .find(|(key, _)| *key == wanted)
                            .map(|(_, value)| *value)
                    })
            });

            match found.map(Self::value_to_string) {
                Some(Some(value)) => fields.set(*field, value),
                Some(None) => warn!("Ignoring non-scalar value for {}", field.key()),
                None => debug!("Response has no {}", field.key()),
            }
        }
        fields
    }

    fn normalize_key(key: &str) -> String {
        key.chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect()
    }

    fn value_to_string(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Null => Some(String::new()),
            _ => None,
        }
    }

    /// Reads the first full-width CSV row in export column order. Header
    /// lines, code fences, blank lines and lines of prose are skipped.
    pub fn fields_from_csv(text: &str) -> Result<CandidateFields, ScanError> {
        let rows: Vec<Vec<String>> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("```"))
            .map(Self::split_csv_line)
            .filter(|cells| !Self::is_header(cells))
            .collect();

        let Some(cells) = rows.iter().find(|cells| cells.len() >= Field::ALL.len()) else {
            return Err(ScanError::IncompleteDataError {
                expected: Field::ALL.len(),
                found: rows.iter().map(Vec::len).max().unwrap_or(0),
            });
        };
        if cells.len() > Field::ALL.len() {
            debug!("Ignoring {} trailing CSV column(s)", cells.len() - Field::ALL.len());
        }

        let mut fields = CandidateFields::new();
        for (field, cell) in Field::ALL.iter().zip(cells) {
            fields.set(*field, cell.as_str());
        }
        Ok(fields)
    }

    // A header names its columns in any supported language. A row whose
    // document number cell is a column name is a header too, whatever its
    // first cell says.
    fn is_header(cells: &[String]) -> bool {
        let is_column_name = |cell: &String| {
            KNOWN_COLUMN_NAMES.contains(&Self::normalize_key(cell.trim_start_matches('\u{feff}')))
        };
        let document_number = Field::ALL
            .iter()
            .position(|field| *field == Field::DocumentNumber)
            .and_then(|index| cells.get(index));

        cells.first().map_or(false, is_column_name) || document_number.map_or(false, is_column_name)
    }

    /// Splits on commas. Double-quoted cells may contain commas, and `""`
    /// inside quotes is a literal quote.
    pub fn split_csv_line(line: &str) -> Vec<String> {
        let mut cells = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    cells.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        cells.push(current.trim().to_string());
        cells
    }
}
