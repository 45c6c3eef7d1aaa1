/// Event ingestion and normalization

pub mod normalizer;
pub mod parser;

pub use normalizer::{epoch_to_instant, EventNormalizer};
pub use parser::{load_json, parse_records};
