use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointCloudError {
    #[error("color count ({colors}) does not match point count ({points})")]
    ColorCountMismatch { points: usize, colors: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn translated(&self, offset: [f64; 3]) -> Self {
        Self {
            x: self.x + offset[0],
            y: self.y + offset[1],
            z: self.z + offset[2],
        }
    }
}

impl From<Point> for [f32; 3] {
    fn from(value: Point) -> Self {
        [value.x as f32, value.y as f32, value.z as f32]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts a normalized [0, 1] channel triple, as stored by float PLY properties.
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let to_u8 = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::new(to_u8(r), to_u8(g), to_u8(b))
    }

    /// Converts a 16-bit channel triple by keeping the high byte.
    pub fn from_u16(r: u16, g: u16, b: u16) -> Self {
        Self::new((r >> 8) as u8, (g >> 8) as u8, (b >> 8) as u8)
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// A set of points with an optional, cloud-wide color channel.
///
/// When colors are present there is exactly one color per point, in the
/// same order. Coordinates can be edited in place; the point count only
/// changes by building a new cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point>,
    colors: Option<Vec<Color>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            colors: None,
        }
    }

    pub fn with_colors(points: Vec<Point>, colors: Vec<Color>) -> Result<Self, PointCloudError> {
        if points.len() != colors.len() {
            return Err(PointCloudError::ColorCountMismatch {
                points: points.len(),
                colors: colors.len(),
            });
        }
        Ok(Self {
            points,
            colors: Some(colors),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [Point] {
        &mut self.points
    }

    pub fn colors(&self) -> Option<&[Color]> {
        self.colors.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Point, Option<&Color>)> {
        let colors = self.colors.as_deref();
        self.points
            .iter()
            .enumerate()
            .map(move |(i, point)| (point, colors.map(|c| &c[i])))
    }

    /// Builds a new cloud from the points (and colors) at `indices`, in the
    /// order the indices are given.
    ///
    /// Panics if an index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        let points = indices.iter().map(|&i| self.points[i]).collect();
        let colors = self
            .colors
            .as_ref()
            .map(|colors| indices.iter().map(|&i| colors[i]).collect());
        Self { points, colors }
    }

    /// Appends `other` after the existing points, consuming it.
    ///
    /// The color channel survives only if both clouds have one.
    pub fn extend(&mut self, other: PointCloud) {
        self.points.extend(other.points);
        self.colors = match (self.colors.take(), other.colors) {
            (Some(mut colors), Some(other_colors)) => {
                colors.extend(other_colors);
                Some(colors)
            }
            _ => None,
        };
    }

    /// Axis-aligned bounds of the cloud, or `None` when it has no points.
    pub fn bounding_volume(&self) -> Option<BoundingVolume> {
        if self.points.is_empty() {
            return None;
        }

        let mut bounding_volume = BoundingVolume {
            min: [f64::MAX, f64::MAX, f64::MAX],
            max: [f64::MIN, f64::MIN, f64::MIN],
        };
        for point in &self.points {
            bounding_volume.max[0] = bounding_volume.max[0].max(point.x);
            bounding_volume.max[1] = bounding_volume.max[1].max(point.y);
            bounding_volume.max[2] = bounding_volume.max[2].max(point.z);
            bounding_volume.min[0] = bounding_volume.min[0].min(point.x);
            bounding_volume.min[1] = bounding_volume.min[1].min(point.y);
            bounding_volume.min[2] = bounding_volume.min[2].min(point.z);
        }
        Some(bounding_volume)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: [f64; 3],
    pub max: [f64; 3],
}
