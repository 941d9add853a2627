use std::path::PathBuf;

use pcd_parser::{parsers::Extension, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no {extension} files found in {}, nothing to merge", folder.display())]
    NoFrames { folder: PathBuf, extension: Extension },

    #[error("failed to index frames: {0}")]
    Index(#[from] ParseError),

    #[error("failed to create destination folder {}: {source}", path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write summary {}: {source}", path.display())]
    Summary {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
