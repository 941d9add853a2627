use std::fmt;

use pcd_core::pointcloud::point::PointCloud;

use crate::error::ParseError;

pub mod ply;

pub trait ParserProvider {
    fn get_parser(&self) -> Box<dyn Parser>;
}

pub trait Parser {
    fn parse(&self) -> Result<PointCloud, ParseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Ply,
}

impl Extension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Ply => "ply",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
