pub mod error;
pub mod parsers;
pub mod sequence;

pub use error::ParseError;
