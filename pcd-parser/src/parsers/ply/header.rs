use std::io::BufRead;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Double,
}

impl ScalarType {
    fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "char" | "int8" => ScalarType::Char,
            "uchar" | "uint8" => ScalarType::UChar,
            "short" | "int16" => ScalarType::Short,
            "ushort" | "uint16" => ScalarType::UShort,
            "int" | "int32" => ScalarType::Int,
            "uint" | "uint32" => ScalarType::UInt,
            "float" | "float32" => ScalarType::Float,
            "double" | "float64" => ScalarType::Double,
            _ => return None,
        };
        Some(ty)
    }

    pub fn size(&self) -> usize {
        match self {
            ScalarType::Char | ScalarType::UChar => 1,
            ScalarType::Short | ScalarType::UShort => 2,
            ScalarType::Int | ScalarType::UInt | ScalarType::Float => 4,
            ScalarType::Double => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarType::Float | ScalarType::Double)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub count: usize,
    pub properties: Vec<Property>,
}

impl Element {
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    /// Byte size of one record, or `None` if a list property makes it variable.
    pub fn fixed_row_size(&self) -> Option<usize> {
        self.properties
            .iter()
            .map(|p| match p.kind {
                PropertyKind::Scalar(ty) => Some(ty.size()),
                PropertyKind::List { .. } => None,
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub format: PlyFormat,
    pub elements: Vec<Element>,
}

impl Header {
    /// Reads the header up to and including `end_header`, leaving the
    /// reader positioned at the first byte of the body.
    pub fn read<R: BufRead>(reader: &mut R) -> Result<Self, ParseError> {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line.trim() != "ply" {
            return Err(ParseError::InvalidHeader("missing 'ply' magic".to_string()));
        }

        let mut format = None;
        let mut elements: Vec<Element> = Vec::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(ParseError::InvalidHeader("missing end_header".to_string()));
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                [] => continue,
                ["end_header"] => break,
                ["comment", ..] | ["obj_info", ..] => continue,
                ["format", kind, _version] => {
                    format = Some(match *kind {
                        "ascii" => PlyFormat::Ascii,
                        "binary_little_endian" => PlyFormat::BinaryLittleEndian,
                        "binary_big_endian" => PlyFormat::BinaryBigEndian,
                        other => {
                            return Err(ParseError::InvalidHeader(format!(
                                "unknown format '{other}'"
                            )))
                        }
                    });
                }
                ["element", name, count] => {
                    let count = count.parse().map_err(|_| {
                        ParseError::InvalidHeader(format!("invalid element count '{count}'"))
                    })?;
                    elements.push(Element {
                        name: name.to_string(),
                        count,
                        properties: Vec::new(),
                    });
                }
                ["property", "list", count, item, name] => {
                    let kind = PropertyKind::List {
                        count: scalar_type(count)?,
                        item: scalar_type(item)?,
                    };
                    push_property(&mut elements, name, kind)?;
                }
                ["property", ty, name] => {
                    let kind = PropertyKind::Scalar(scalar_type(ty)?);
                    push_property(&mut elements, name, kind)?;
                }
                _ => {
                    return Err(ParseError::InvalidHeader(format!(
                        "unexpected line '{}'",
                        line.trim()
                    )))
                }
            }
        }

        let format =
            format.ok_or_else(|| ParseError::InvalidHeader("missing format line".to_string()))?;

        Ok(Header { format, elements })
    }
}

fn scalar_type(name: &str) -> Result<ScalarType, ParseError> {
    ScalarType::from_name(name)
        .ok_or_else(|| ParseError::InvalidHeader(format!("unknown property type '{name}'")))
}

fn push_property(elements: &mut [Element], name: &str, kind: PropertyKind) -> Result<(), ParseError> {
    let element = elements.last_mut().ok_or_else(|| {
        ParseError::InvalidHeader(format!("property '{name}' declared before any element"))
    })?;
    element.properties.push(Property {
        name: name.to_string(),
        kind,
    });
    Ok(())
}
