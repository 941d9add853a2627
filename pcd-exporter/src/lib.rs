pub mod error;
pub mod ply;

pub use error::ExportError;
