use pcd_core::pointcloud::point::PointCloud;

use crate::{builder::TransformBuilder, transform::Transform};

pub trait Transformer {
    fn execute(&self, point_cloud: PointCloud) -> PointCloud;
}

pub struct PointCloudTransformer {
    transform: Box<dyn Transform>,
}

impl PointCloudTransformer {
    pub fn new(builder: &dyn TransformBuilder) -> Self {
        Self {
            transform: builder.build(),
        }
    }
}

impl Transformer for PointCloudTransformer {
    fn execute(&self, point_cloud: PointCloud) -> PointCloud {
        self.transform.transform(point_cloud)
    }
}
