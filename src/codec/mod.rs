//! The iTunesDB binary codec: fixed-size headers, tagged data-objects, and
//! the two string encodings, plus the parse/serialize entry points built on
//! top of them.

pub mod atoms;
pub mod parser;
pub mod serializer;

pub use parser::parse;
pub use serializer::serialize;
