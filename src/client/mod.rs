// Pieces meant for the HTTP clients that talk to OCR/LLM vendors.
// The clients themselves live outside this crate.

pub mod token_cache;

pub use token_cache::{CachedToken, TokenCache};
