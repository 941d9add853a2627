use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read},
    path::PathBuf,
};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt as _};
use pcd_core::pointcloud::point::{Color, Point, PointCloud};

use super::{Parser, ParserProvider};
use crate::error::ParseError;

pub mod header;

use header::{Element, Header, PlyFormat, PropertyKind, ScalarType};

pub struct PlyParserProvider {
    pub filename: PathBuf,
}

impl ParserProvider for PlyParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(PlyParser {
            filename: self.filename.clone(),
        })
    }
}

pub struct PlyParser {
    pub filename: PathBuf,
}

impl Parser for PlyParser {
    fn parse(&self) -> Result<PointCloud, ParseError> {
        let file = File::open(&self.filename)?;
        read_ply(&mut BufReader::new(file))
    }
}

const MAX_PREALLOCATED_ROWS: usize = 1 << 20;

/// Column positions of the vertex properties we keep.
struct VertexLayout {
    xyz: [usize; 3],
    rgb: Option<([usize; 3], ScalarType)>,
}

impl VertexLayout {
    fn new(vertex: &Element) -> Result<Self, ParseError> {
        let find = |name: &str| {
            vertex
                .property_index(name)
                .ok_or_else(|| ParseError::MissingProperty(name.to_string()))
        };
        let xyz = [find("x")?, find("y")?, find("z")?];

        let rgb = match (
            vertex.property_index("red"),
            vertex.property_index("green"),
            vertex.property_index("blue"),
        ) {
            (Some(r), Some(g), Some(b)) => match vertex.properties[r].kind {
                PropertyKind::Scalar(ty) => Some(([r, g, b], ty)),
                PropertyKind::List { .. } => {
                    return Err(ParseError::Unsupported(
                        "list-typed color property".to_string(),
                    ))
                }
            },
            _ => None,
        };

        Ok(Self { xyz, rgb })
    }

    fn point(&self, row: &[f64]) -> Point {
        Point::new(row[self.xyz[0]], row[self.xyz[1]], row[self.xyz[2]])
    }

    fn color(&self, row: &[f64]) -> Option<Color> {
        let ([r, g, b], ty) = self.rgb?;
        let (r, g, b) = (row[r], row[g], row[b]);
        let color = match ty {
            ScalarType::Float | ScalarType::Double => Color::from_unit(r, g, b),
            ScalarType::Short | ScalarType::UShort => Color::from_u16(
                r.clamp(0.0, 65535.0) as u16,
                g.clamp(0.0, 65535.0) as u16,
                b.clamp(0.0, 65535.0) as u16,
            ),
            _ => Color::new(
                r.clamp(0.0, 255.0) as u8,
                g.clamp(0.0, 255.0) as u8,
                b.clamp(0.0, 255.0) as u8,
            ),
        };
        Some(color)
    }
}

/// Reads the vertices of a PLY stream into a point cloud.
///
/// Only the `vertex` element is kept; `x`, `y` and `z` are required and
/// `red`, `green`, `blue` become the color channel when all three exist.
pub fn read_ply<R: BufRead>(reader: &mut R) -> Result<PointCloud, ParseError> {
    let header = Header::read(reader)?;

    let vertex_position = header
        .elements
        .iter()
        .position(|e| e.name == "vertex")
        .ok_or_else(|| ParseError::InvalidHeader("no vertex element".to_string()))?;
    let vertex = &header.elements[vertex_position];
    let layout = VertexLayout::new(vertex)?;

    // the declared count is untrusted; grow past this as rows actually arrive
    let capacity = vertex.count.min(MAX_PREALLOCATED_ROWS);
    let mut points = Vec::with_capacity(capacity);
    let mut colors = Vec::with_capacity(if layout.rgb.is_some() { capacity } else { 0 });
    let mut push_row = |row: &[f64]| {
        points.push(layout.point(row));
        if let Some(color) = layout.color(row) {
            colors.push(color);
        }
    };

    let preceding = &header.elements[..vertex_position];
    match header.format {
        PlyFormat::Ascii => {
            read_ascii_vertices(reader, preceding, vertex, &mut push_row)?;
        }
        PlyFormat::BinaryLittleEndian => {
            read_binary_vertices::<LittleEndian, _>(reader, preceding, vertex, &mut push_row)?;
        }
        PlyFormat::BinaryBigEndian => {
            read_binary_vertices::<BigEndian, _>(reader, preceding, vertex, &mut push_row)?;
        }
    }

    if layout.rgb.is_some() {
        Ok(PointCloud::with_colors(points, colors)?)
    } else {
        Ok(PointCloud::new(points))
    }
}

fn read_ascii_vertices<R: BufRead>(
    reader: &mut R,
    preceding: &[Element],
    vertex: &Element,
    push_row: &mut dyn FnMut(&[f64]),
) -> Result<(), ParseError> {
    let mut lines = reader.lines();

    let skip = preceding
        .iter()
        .try_fold(0usize, |total, e| total.checked_add(e.count))
        .ok_or_else(|| ParseError::InvalidHeader("element counts overflow".to_string()))?;
    for _ in 0..skip {
        if lines.next().transpose()?.is_none() {
            return Err(ParseError::Truncated {
                expected: vertex.count,
                found: 0,
            });
        }
    }

    let mut row = Vec::with_capacity(vertex.properties.len());
    let mut found = 0;
    while found < vertex.count {
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        row.clear();
        let mut tokens = line.split_whitespace();
        for property in &vertex.properties {
            match property.kind {
                PropertyKind::Scalar(_) => row.push(next_ascii_value(&mut tokens, found)?),
                PropertyKind::List { .. } => {
                    let len = next_ascii_value(&mut tokens, found)? as usize;
                    for _ in 0..len {
                        next_ascii_value(&mut tokens, found)?;
                    }
                    row.push(f64::NAN);
                }
            }
        }
        push_row(&row);
        found += 1;
    }

    if found < vertex.count {
        return Err(ParseError::Truncated {
            expected: vertex.count,
            found,
        });
    }
    Ok(())
}

fn next_ascii_value<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    vertex: usize,
) -> Result<f64, ParseError> {
    let token = tokens.next().ok_or_else(|| ParseError::InvalidValue {
        vertex,
        value: String::new(),
    })?;
    token.parse().map_err(|_| ParseError::InvalidValue {
        vertex,
        value: token.to_string(),
    })
}

fn read_binary_vertices<B: ByteOrder, R: Read>(
    reader: &mut R,
    preceding: &[Element],
    vertex: &Element,
    push_row: &mut dyn FnMut(&[f64]),
) -> Result<(), ParseError> {
    for element in preceding {
        let row_size = element.fixed_row_size().ok_or_else(|| {
            ParseError::Unsupported(format!(
                "list properties in element '{}' before vertex data",
                element.name
            ))
        })?;
        let bytes = row_size
            .checked_mul(element.count)
            .ok_or_else(|| {
                ParseError::InvalidHeader(format!("element '{}' is too large", element.name))
            })? as u64;
        let skipped = io::copy(&mut reader.by_ref().take(bytes), &mut io::sink())?;
        if skipped < bytes {
            return Err(ParseError::Truncated {
                expected: vertex.count,
                found: 0,
            });
        }
    }

    let mut row = Vec::with_capacity(vertex.properties.len());
    for found in 0..vertex.count {
        row.clear();
        match read_binary_row::<B, _>(reader, vertex, &mut row) {
            Ok(()) => push_row(&row),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(ParseError::Truncated {
                    expected: vertex.count,
                    found,
                })
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn read_binary_row<B: ByteOrder, R: Read>(
    reader: &mut R,
    vertex: &Element,
    row: &mut Vec<f64>,
) -> io::Result<()> {
    for property in &vertex.properties {
        match property.kind {
            PropertyKind::Scalar(ty) => row.push(read_scalar::<B, _>(reader, ty)?),
            PropertyKind::List { count, item } => {
                let len = read_scalar::<B, _>(reader, count)? as usize;
                for _ in 0..len {
                    read_scalar::<B, _>(reader, item)?;
                }
                row.push(f64::NAN);
            }
        }
    }
    Ok(())
}

fn read_scalar<B: ByteOrder, R: Read + ?Sized>(reader: &mut R, ty: ScalarType) -> io::Result<f64> {
    let value = match ty {
        ScalarType::Char => reader.read_i8()? as f64,
        ScalarType::UChar => reader.read_u8()? as f64,
        ScalarType::Short => reader.read_i16::<B>()? as f64,
        ScalarType::UShort => reader.read_u16::<B>()? as f64,
        ScalarType::Int => reader.read_i32::<B>()? as f64,
        ScalarType::UInt => reader.read_u32::<B>()? as f64,
        ScalarType::Float => reader.read_f32::<B>()? as f64,
        ScalarType::Double => reader.read_f64::<B>()?,
    };
    Ok(value)
}
