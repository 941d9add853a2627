use std::path::PathBuf;

use pcd_core::pointcloud::point::PointCloudError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid PLY header: {0}")]
    InvalidHeader(String),

    #[error("unsupported PLY content: {0}")]
    Unsupported(String),

    #[error("vertex element lacks required property '{0}'")]
    MissingProperty(String),

    #[error("invalid value '{value}' in vertex {vertex}")]
    InvalidValue { vertex: usize, value: String },

    #[error("expected {expected} vertices, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to list folder: {0}")]
    Glob(#[from] glob::GlobError),

    #[error(transparent)]
    PointCloud(#[from] PointCloudError),
}
