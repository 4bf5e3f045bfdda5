pub mod client;
pub mod config;
pub mod export;
pub mod models;
pub mod processing;
pub mod scanner;
pub mod utils;
pub mod validation;

pub use config::ScanConfig;
pub use models::{Field, MrzRecord};
pub use scanner::{DocumentScanner, ScanMode};
pub use utils::ScanError;
