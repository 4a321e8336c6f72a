//! Content stream parsing and serialization.

pub mod parser;
pub mod serializer;

pub use parser::{Operation, parse_operations};
pub use serializer::serialize_operations;
