use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The text matches no TD1/TD2/TD3 layout, or the document number is empty.
    #[error("MRZ format error: {0}")]
    MrzFormatError(String),

    #[error("Incomplete data: expected {expected} fields, found {found}")]
    IncompleteDataError { expected: usize, found: usize },

    /// No JSON or CSV structure could be located in the upstream response.
    #[error("Unparsable response: {0}")]
    UnparsableResponseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl ScanError {
    /// Short tag used in logs and batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::MrzFormatError(_) => "MRZ_FORMAT",
            ScanError::IncompleteDataError { .. } => "INCOMPLETE_DATA",
            ScanError::UnparsableResponseError(_) => "UNPARSABLE_RESPONSE",
            ScanError::ConfigError(_) => "CONFIG",
            ScanError::IoError(_) => "IO",
        }
    }
}
