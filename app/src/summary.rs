use std::{fs::File, io::BufWriter, path::{Path, PathBuf}};

use pcd_core::pointcloud::point::BoundingVolume;
use serde::Serialize;

use crate::{error::MergeError, pipeline::PipelineState};

#[derive(Debug, Clone, Serialize)]
pub struct WrittenFrame {
    pub index: usize,
    pub path: PathBuf,
    pub point_count: usize,
    pub bounding_volume: Option<BoundingVolume>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFrame {
    pub index: usize,
    pub reason: String,
}

/// Outcome of a merge run.
#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub state: PipelineState,
    pub bound: usize,
    pub written: Vec<WrittenFrame>,
    pub skipped: Vec<SkippedFrame>,
}

impl MergeSummary {
    pub fn new(bound: usize) -> Self {
        Self {
            state: PipelineState::Idle,
            bound,
            written: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Frame pairs that were read or failed to read.
    pub fn attempted(&self) -> usize {
        self.written.len() + self.skipped.len()
    }

    pub fn write_json(&self, path: &Path) -> Result<(), MergeError> {
        let to_error = |source| MergeError::Summary {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(|e| to_error(serde_json::Error::io(e)))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(to_error)
    }
}
