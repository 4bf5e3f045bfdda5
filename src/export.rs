use std::io::Write;

use log::debug;

use crate::models::{Field, MrzRecord, ScanResult};
use crate::utils::ScanError;

/// Header of the trailing column that names the scanned file.
pub const FILE_NAME_LABEL: &str = "File Name";

const UTF8_BOM: &str = "\u{feff}";

/// Renders successful scans as CSV in export column order.
pub struct CsvExporter {
    bom: bool,
}

impl CsvExporter {
    pub fn new(bom: bool) -> Self {
        CsvExporter { bom }
    }

    pub fn header() -> String {
        let mut labels: Vec<&str> = Field::ALL.iter().map(|f| f.label()).collect();
        labels.push(FILE_NAME_LABEL);
        labels.join(",")
    }

    pub fn row(record: &MrzRecord, file_name: &str) -> String {
        Field::ALL
            .iter()
            .map(|field| escape(record.get(*field)))
            .chain(std::iter::once(escape(file_name)))
            .collect::<Vec<String>>()
            .join(",")
    }

    /// Writes the header and one CRLF-terminated row per successful scan.
    /// Returns the number of rows written; failed scans are skipped.
    pub fn write<W: Write>(&self, results: &[ScanResult], writer: &mut W) -> Result<usize, ScanError> {
        let io_err = |e: std::io::Error| ScanError::IoError(format!("Failed to write CSV: {}", e));

        if self.bom {
            writer.write_all(UTF8_BOM.as_bytes()).map_err(io_err)?;
        }
        write!(writer, "{}\r\n", Self::header()).map_err(io_err)?;

        let mut rows = 0;
        for result in results {
            if let Some(record) = result.record() {
                write!(writer, "{}\r\n", Self::row(record, &result.file_name)).map_err(io_err)?;
                rows += 1;
            }
        }
        writer.flush().map_err(io_err)?;
        debug!("Wrote {} CSV rows ({} scans)", rows, results.len());
        Ok(rows)
    }
}

fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
