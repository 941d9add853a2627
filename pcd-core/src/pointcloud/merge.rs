use std::ops::Add;

use crate::pointcloud::point::PointCloud;

/// Concatenates two clouds: every point of `first`, then every point of `second`.
///
/// Colors are kept only when both inputs carry them. If either side is
/// uncolored the merged cloud has no color channel at all.
pub fn merge(first: PointCloud, second: PointCloud) -> PointCloud {
    let mut merged = first;
    merged.extend(second);
    merged
}

impl Add for PointCloud {
    type Output = PointCloud;

    fn add(self, rhs: PointCloud) -> PointCloud {
        merge(self, rhs)
    }
}
