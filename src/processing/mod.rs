pub mod correction;
pub mod dates;
pub mod mrz;
pub mod response;

pub use correction::FieldType;
pub use dates::DateDisambiguator;
pub use mrz::MrzDecoder;
pub use response::ResponseNormalizer;
