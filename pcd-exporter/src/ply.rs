use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use byteorder::{LittleEndian, WriteBytesExt as _};
use pcd_core::pointcloud::point::PointCloud;

use crate::error::ExportError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlyEncoding {
    Ascii,
    #[default]
    BinaryLittleEndian,
}

impl PlyEncoding {
    fn format_name(&self) -> &'static str {
        match self {
            PlyEncoding::Ascii => "ascii",
            PlyEncoding::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

/// Writes a point cloud as PLY, replacing any existing file at `path`.
///
/// Coordinates are stored as `double`; colors, when present, as `uchar`
/// `red green blue`. The parent directory must already exist.
pub fn write_ply(path: &Path, point_cloud: &PointCloud, encoding: PlyEncoding) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|e| ExportError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    write_ply_to(&mut writer, point_cloud, encoding)
        .and_then(|()| writer.flush())
        .map_err(|e| ExportError::WriteFile {
            path: path.display().to_string(),
            source: e,
        })
}

pub fn write_ply_to<W: Write>(
    writer: &mut W,
    point_cloud: &PointCloud,
    encoding: PlyEncoding,
) -> io::Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format {} 1.0", encoding.format_name())?;
    writeln!(writer, "comment generated by pcd-merge")?;
    writeln!(writer, "element vertex {}", point_cloud.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    if point_cloud.has_colors() {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    writeln!(writer, "end_header")?;

    match encoding {
        PlyEncoding::Ascii => {
            for (point, color) in point_cloud.iter() {
                // `{}` on f64 prints the shortest representation that parses back exactly
                write!(writer, "{} {} {}", point.x, point.y, point.z)?;
                if let Some(color) = color {
                    write!(writer, " {} {} {}", color.r, color.g, color.b)?;
                }
                writeln!(writer)?;
            }
        }
        PlyEncoding::BinaryLittleEndian => {
            for (point, color) in point_cloud.iter() {
                writer.write_f64::<LittleEndian>(point.x)?;
                writer.write_f64::<LittleEndian>(point.y)?;
                writer.write_f64::<LittleEndian>(point.z)?;
                if let Some(color) = color {
                    writer.write_all(&color.to_rgb8())?;
                }
            }
        }
    }

    Ok(())
}
