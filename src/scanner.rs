use log::{error, info, warn};

use crate::config::ScanConfig;
use crate::models::*;
use crate::processing::*;
use crate::utils::ScanError;

/// How a scanner interprets its input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// MRZ block when one is present, upstream response otherwise.
    Auto,
    Mrz,
    Response,
}

pub struct DocumentScanner {
    decoder: MrzDecoder,
    dates: DateDisambiguator,
    rules: CountryRules,
    mode: ScanMode,
}

impl DocumentScanner {
    pub fn new(config: &ScanConfig) -> Self {
        DocumentScanner {
            decoder: MrzDecoder::new(config),
            dates: DateDisambiguator::from_config(config),
            rules: CountryRules::with_overrides(&config.personal_number_lengths),
            mode: ScanMode::Auto,
        }
    }

    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    // Main entry point: one document's text to one record
    pub fn scan_text(&self, text: &str) -> Result<MrzRecord, ScanError> {
        match self.mode {
            ScanMode::Mrz => self.decode_mrz(text),
            ScanMode::Response => self.normalize_response(text),
            ScanMode::Auto => {
                let mrz_lines = MrzDecoder::locate_mrz_lines(text);
                if mrz_lines.is_empty() {
                    self.normalize_response(text)
                } else {
                    info!("Found {} MRZ lines, decoding", mrz_lines.len());
                    self.decoder.decode(&mrz_lines.join("\n"))
                }
            }
        }
    }

    pub fn decode_mrz(&self, text: &str) -> Result<MrzRecord, ScanError> {
        self.decoder.decode(text)
    }

    pub fn normalize_response(&self, response: &str) -> Result<MrzRecord, ScanError> {
        let candidates = ResponseNormalizer::normalize(response)?;
        MrzRecord::from_candidates(&candidates, &self.dates, &self.rules)
    }

    /// Scans one named document, logging the outcome.
    pub fn scan_document(&self, file_name: impl Into<String>, text: &str) -> ScanResult {
        let file_name = file_name.into();
        let outcome = self.scan_text(text);
        match &outcome {
            Ok(record) => info!("{}: extracted document {}", file_name, record.document_number()),
            Err(err) => error!("{}: [{}] {}", file_name, err.kind(), err),
        }
        ScanResult { file_name, outcome }
    }

    /// Scans inputs one after another. A failing document is recorded in
    /// its result and never stops the rest of the batch.
    pub fn scan_batch<I, N, T>(&self, inputs: I) -> Vec<ScanResult>
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: AsRef<str>,
    {
        let results: Vec<ScanResult> = inputs
            .into_iter()
            .map(|(file_name, text)| self.scan_document(file_name, text.as_ref()))
            .collect();
        log_failures(&results);
        results
    }
}

/// Warns with the failure count when any result in a batch failed.
pub fn log_failures(results: &[ScanResult]) {
    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        warn!("{} of {} documents failed", failed, results.len());
    }
}
