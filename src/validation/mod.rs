pub mod record;

pub use record::normalize_sex;
