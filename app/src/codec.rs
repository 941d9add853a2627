use std::path::{Path, PathBuf};

use pcd_core::pointcloud::point::PointCloud;
use pcd_exporter::{
    ply::{write_ply, PlyEncoding},
    ExportError,
};
use pcd_parser::{
    parsers::{ply::PlyParserProvider, Parser as _, ParserProvider as _},
    ParseError,
};

use crate::pipeline::FrameCodec;

/// Frame files stored as PLY.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlyCodec {
    pub encoding: PlyEncoding,
}

impl PlyCodec {
    pub fn new(encoding: PlyEncoding) -> Self {
        Self { encoding }
    }
}

impl FrameCodec for PlyCodec {
    fn read(&self, path: &Path) -> Result<PointCloud, ParseError> {
        let provider = PlyParserProvider {
            filename: PathBuf::from(path),
        };
        provider.get_parser().parse()
    }

    fn write(&self, path: &Path, point_cloud: &PointCloud) -> Result<(), ExportError> {
        write_ply(path, point_cloud, self.encoding)
    }
}
